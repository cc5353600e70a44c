//! # Coprocessor Host
//!
//! Runs a program with no I/O until its program counter leaves the
//! instructions, which is the normal way for it to stop.

use crate::config::VmConfig;
use crate::error::{self, Result};
use crate::interpreter::{ExecutionStats, Machine};
use crate::opcode::{Dialect, Operation};
use crate::program::Program;
use crate::registers::RegisterFile;
use serde::Serialize;

/// Final state of a coprocessor run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoprocessorRun {
    pub registers: RegisterFile,
    pub stats: ExecutionStats,
}

impl CoprocessorRun {
    /// How many `mul` instructions were executed
    pub fn multiplications(&self) -> u64 {
        self.stats.count(Operation::Multiply)
    }
}

/// Run `program` to completion starting from `registers`
pub fn run_coprocessor(
    program: &Program,
    registers: RegisterFile,
    config: &VmConfig,
) -> Result<CoprocessorRun> {
    config.validate()?;
    let mut machine = Machine::new(program, Dialect::Coprocessor).with_registers(registers);

    while machine.is_running() {
        if machine.stats().steps() >= config.max_steps {
            return Err(error::budget_exceeded(config.max_steps)
                .with_operation("coprocessor::run")
                .with_context("pc", machine.pc().to_string()));
        }
        machine
            .step()
            .map_err(|e| e.with_operation("coprocessor::run"))?;
    }

    tracing::debug!(steps = machine.stats().steps(), pc = machine.pc(), "coprocessor halted");
    let (registers, stats) = machine.into_parts();
    Ok(CoprocessorRun { registers, stats })
}

#[cfg(test)]
mod tests {
    use super::*;
    use duet_error::ErrorKind;

    #[test]
    fn test_counts_multiplications() {
        let program = Program::parse("set a 1\nset b 3\nmul a 2\nsub b 1\njnz b -2").unwrap();
        let run = run_coprocessor(&program, RegisterFile::new(), &VmConfig::default()).unwrap();

        assert_eq!(run.multiplications(), 3);
        assert_eq!(run.registers.get("a"), 8);
        assert_eq!(run.registers.get("b"), 0);
    }

    #[test]
    fn test_seeded_registers_change_the_path() {
        // with a != 0 the multiplication is skipped
        let text = "jnz a 2\nmul b 1\nset h 1";
        let program = Program::parse(text).unwrap();

        let debug = run_coprocessor(&program, RegisterFile::new(), &VmConfig::default()).unwrap();
        assert_eq!(debug.multiplications(), 1);

        let real =
            run_coprocessor(&program, RegisterFile::seeded("a", 1), &VmConfig::default()).unwrap();
        assert_eq!(real.multiplications(), 0);
        assert_eq!(real.registers.get("h"), 1);
        assert_eq!(real.registers.get("a"), 1);
    }

    #[test]
    fn test_comments_are_ignored() {
        let text = "# b = 5\nset b 5\n\n# square it\nmul b b\n";
        let program = Program::parse(text).unwrap();
        let run = run_coprocessor(&program, RegisterFile::new(), &VmConfig::default()).unwrap();
        assert_eq!(run.registers.get("b"), 25);
    }

    #[test]
    fn test_io_is_unsupported() {
        let program = Program::parse("set a 1\nrcv a").unwrap();
        let err = run_coprocessor(&program, RegisterFile::new(), &VmConfig::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
        assert_eq!(err.operation(), "coprocessor::run");
    }

    #[test]
    fn test_budget() {
        let program = Program::parse("jnz 1 0").unwrap();
        let err = run_coprocessor(&program, RegisterFile::new(), &VmConfig::new().with_max_steps(10))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IterationBudgetExceeded);
    }
}
