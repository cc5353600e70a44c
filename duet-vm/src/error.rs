//! Duet VM Error types
//!
//! Re-exports duet-error and provides VM-specific conveniences.

// Re-export the core error types
pub use duet_error::{Error, ErrorKind, ErrorStatus, Result};

use crate::opcode::Instruction;

// =============================================================================
// VM-specific error constructors
// =============================================================================

/// Create a ParseFailed error for the given source line
pub fn parse_error(line: &str, reason: impl Into<String>) -> Error {
    Error::parse_failed(line.trim(), reason)
}

/// Create an ExecutionFailed error pinned to an instruction
pub fn execution_error(pc: i64, instruction: &Instruction, reason: impl Into<String>) -> Error {
    Error::execution_failed(reason)
        .with_context("pc", pc.to_string())
        .with_context("instruction", instruction.to_string())
}

/// Create an Unsupported error for an operation the host cannot interpret
pub fn unsupported_operation(pc: i64, instruction: &Instruction, host: &str) -> Error {
    Error::unsupported(format!("'{}' is not available in the {} host", instruction.op, host))
        .with_context("pc", pc.to_string())
        .with_context("instruction", instruction.to_string())
}

/// Create an UnreachableTermination error
pub fn unreachable_termination(pc: i64) -> Error {
    Error::unreachable_termination(pc)
}

/// Create a NothingToRecover error
pub fn nothing_to_recover() -> Error {
    Error::nothing_to_recover()
}

/// Create an IterationBudgetExceeded error
pub fn budget_exceeded(max_steps: u64) -> Error {
    Error::iteration_budget_exceeded(max_steps)
}

/// Create a ConfigInvalid error
pub fn config_invalid(message: impl Into<String>) -> Error {
    Error::config_invalid(message)
}

/// Create an InvalidArgument error
pub fn invalid_argument(message: impl Into<String>) -> Error {
    Error::invalid_argument(message)
}
