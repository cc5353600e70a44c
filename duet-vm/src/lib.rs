//! # Duet VM
//!
//! A small register machine over signed 64-bit integers whose interpreter
//! never performs I/O itself. Each step returns a [`SideEffect`] and the host
//! loop decides what `snd` and `rcv` mean.
//!
//! ## Core Concepts
//! - **Instructions**: a closed set of operations decoded once from text
//! - **Machine**: program counter, register file and execution state; it can
//!   block on input and be resumed later with [`Machine::deliver`]
//! - **Hosts**: the sound/recover run, the two-program [`Duet`] scheduler and
//!   the I/O-free coprocessor run
//! - **Conditional machine**: guarded `inc`/`dec` programs without jumps

pub mod conditional;
pub mod config;
pub mod coprocessor;
pub mod decoder;
pub mod error;
pub mod interpreter;
pub mod mailbox;
pub mod opcode;
pub mod program;
pub mod registers;
pub mod scheduler;
pub mod schema;
pub mod sound;

pub use conditional::{
    parse_conditional_instruction, run_conditional, Command, Comparator, Condition,
    ConditionalInstruction, ConditionalProgram, ConditionalRun,
};
pub use config::{VmConfig, DEFAULT_MAX_STEPS};
pub use coprocessor::{run_coprocessor, CoprocessorRun};
pub use decoder::{parse_instruction, parse_operand};
pub use error::{Error, ErrorKind, ErrorStatus, Result};
pub use interpreter::{ExecutionState, ExecutionStats, Machine, SideEffect};
pub use mailbox::Mailbox;
pub use opcode::{Dialect, Instruction, Operand, Operation, Register};
pub use program::Program;
pub use registers::{RegisterFile, PROGRAM_ID_REGISTER};
pub use scheduler::{run_duet, Duet, DuetOutcome, Termination};
pub use schema::InstructionSchema;
pub use sound::{recover, Recovery};
