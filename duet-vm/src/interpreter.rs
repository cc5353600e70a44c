//! # Register Machine Interpreter
//!
//! Executes one instruction at a time and hands the resulting [`SideEffect`]
//! back to the host.
//!
//! ## Execution Model
//! - Register writes and jumps are applied by the machine itself
//! - Sounds, sends, recover traps and receives are only reported; the host
//!   decides what they mean
//! - A receive parks the machine in [`ExecutionState::Blocked`] without moving
//!   the program counter; [`Machine::deliver`] completes it
//! - The machine halts once its program counter leaves the program
//!
//! The whole resumable state is `(pc, registers, blocked register)`, so a
//! scheduler can interleave any number of machines on one thread.

use crate::error::{self, Result};
use crate::opcode::{Dialect, Instruction, Operation, Register};
use crate::program::Program;
use crate::registers::RegisterFile;
use serde::Serialize;
use std::collections::BTreeMap;

/// Observable outcome of executing one instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum SideEffect {
    /// A register received a new value
    Set { register: Register, value: i64 },
    /// The program counter moves by `by` instead of 1
    Jump { by: i64 },
    /// A value was sent to the other program (duet)
    Send { value: i64 },
    /// A value is requested into `register` (duet)
    Receive { register: Register },
    /// A sound was played (sound)
    Sound { frequency: i64 },
    /// The recover trap fired (sound)
    Recover,
    /// Nothing happened besides advancing
    Noop,
}

/// Where a machine stands between steps
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ExecutionState {
    /// Program counter is inside the program
    Running,
    /// Program counter left the program
    Halted,
    /// Waiting for a value to land in `register`
    Blocked { register: Register },
}

/// Per-operation execution counts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionStats {
    steps: u64,
    per_operation: BTreeMap<Operation, u64>,
}

impl ExecutionStats {
    fn record(&mut self, op: Operation) {
        self.steps += 1;
        *self.per_operation.entry(op).or_insert(0) += 1;
    }

    /// Total instructions executed
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// How many times `op` was executed
    pub fn count(&self, op: Operation) -> u64 {
        self.per_operation.get(&op).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Operation, u64)> + '_ {
        self.per_operation.iter().map(|(op, n)| (*op, *n))
    }
}

/// One executing program instance.
///
/// Owns its register file and program counter exclusively; nothing outside
/// the machine writes to them except through [`Machine::deliver`].
#[derive(Debug, Clone)]
pub struct Machine<'p> {
    program: &'p Program,
    dialect: Dialect,
    pc: i64,
    registers: RegisterFile,
    state: ExecutionState,
    stats: ExecutionStats,
}

impl<'p> Machine<'p> {
    /// Create a machine positioned at the first instruction
    pub fn new(program: &'p Program, dialect: Dialect) -> Self {
        let mut machine = Self {
            program,
            dialect,
            pc: 0,
            registers: RegisterFile::new(),
            state: ExecutionState::Running,
            stats: ExecutionStats::default(),
        };
        machine.refresh_state();
        machine
    }

    /// Start from preset register values
    pub fn with_registers(mut self, registers: RegisterFile) -> Self {
        self.registers = registers;
        self
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn program(&self) -> &'p Program {
        self.program
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn pc(&self) -> i64 {
        self.pc
    }

    pub fn registers(&self) -> &RegisterFile {
        &self.registers
    }

    pub fn state(&self) -> &ExecutionState {
        &self.state
    }

    pub fn stats(&self) -> &ExecutionStats {
        &self.stats
    }

    pub fn is_running(&self) -> bool {
        self.state == ExecutionState::Running
    }

    pub fn is_halted(&self) -> bool {
        self.state == ExecutionState::Halted
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self.state, ExecutionState::Blocked { .. })
    }

    /// The instruction the program counter points at
    pub fn current_instruction(&self) -> Option<&'p Instruction> {
        self.program.get(self.pc)
    }

    /// Consume the machine, keeping its registers and statistics
    pub fn into_parts(self) -> (RegisterFile, ExecutionStats) {
        (self.registers, self.stats)
    }

    // =========================================================================
    // Execution
    // =========================================================================

    /// Interpret `instruction` against the current registers without changing anything
    pub fn evaluate(&self, instruction: &Instruction) -> Result<SideEffect> {
        let x = &instruction.x;
        match instruction.op {
            Operation::Move => Ok(SideEffect::Set {
                register: self.destination(instruction)?.clone(),
                value: self.second(instruction)?,
            }),
            Operation::Add => self.arithmetic(instruction, i64::checked_add),
            Operation::Subtract => self.arithmetic(instruction, i64::checked_sub),
            Operation::Multiply => self.arithmetic(instruction, i64::checked_mul),
            Operation::Modulo => {
                if self.second(instruction)? == 0 {
                    return Err(error::execution_error(self.pc, instruction, "modulo by zero"));
                }
                self.arithmetic(instruction, i64::checked_rem)
            }
            Operation::JumpIfPositive => {
                let by = self.second(instruction)?;
                Ok(if self.registers.resolve(x) > 0 {
                    SideEffect::Jump { by }
                } else {
                    SideEffect::Noop
                })
            }
            Operation::JumpIfNonZero => {
                let by = self.second(instruction)?;
                Ok(if self.registers.resolve(x) != 0 {
                    SideEffect::Jump { by }
                } else {
                    SideEffect::Noop
                })
            }
            Operation::Output => match self.dialect {
                Dialect::Sound => Ok(SideEffect::Sound {
                    frequency: self.registers.resolve(x),
                }),
                Dialect::Duet => Ok(SideEffect::Send {
                    value: self.registers.resolve(x),
                }),
                Dialect::Coprocessor => {
                    Err(error::unsupported_operation(self.pc, instruction, "coprocessor"))
                }
            },
            Operation::Input => match self.dialect {
                Dialect::Sound => Ok(if self.registers.resolve(x) != 0 {
                    SideEffect::Recover
                } else {
                    SideEffect::Noop
                }),
                Dialect::Duet => Ok(SideEffect::Receive {
                    register: self.destination(instruction)?.clone(),
                }),
                Dialect::Coprocessor => {
                    Err(error::unsupported_operation(self.pc, instruction, "coprocessor"))
                }
            },
        }
    }

    /// Execute the current instruction and apply its local effect.
    ///
    /// Fails if the machine is halted or blocked.
    pub fn step(&mut self) -> Result<SideEffect> {
        match &self.state {
            ExecutionState::Running => {}
            ExecutionState::Halted => {
                return Err(error::invalid_argument("machine has halted")
                    .with_operation("machine::step")
                    .with_context("pc", self.pc.to_string()));
            }
            ExecutionState::Blocked { register } => {
                return Err(error::invalid_argument(format!(
                    "machine is blocked receiving into '{}'",
                    register
                ))
                .with_operation("machine::step")
                .with_context("pc", self.pc.to_string()));
            }
        }

        let program = self.program;
        let instruction = program
            .get(self.pc)
            .ok_or_else(|| error::unreachable_termination(self.pc))?;
        let effect = self
            .evaluate(instruction)
            .map_err(|e| e.with_operation("machine::step"))?;

        self.stats.record(instruction.op);
        tracing::trace!(pc = self.pc, %instruction, ?effect, "step");

        self.apply(&effect);
        Ok(effect)
    }

    /// Complete a pending receive with `value` and resume
    pub fn deliver(&mut self, value: i64) -> Result<()> {
        match std::mem::replace(&mut self.state, ExecutionState::Running) {
            ExecutionState::Blocked { register } => {
                tracing::trace!(pc = self.pc, %register, value, "deliver");
                self.registers.set(register, value);
                self.advance(1);
                Ok(())
            }
            other => {
                self.state = other;
                Err(error::invalid_argument("machine is not waiting for input")
                    .with_operation("machine::deliver")
                    .with_context("pc", self.pc.to_string()))
            }
        }
    }

    fn apply(&mut self, effect: &SideEffect) {
        match effect {
            SideEffect::Set { register, value } => {
                self.registers.set(register.clone(), *value);
                self.advance(1);
            }
            SideEffect::Jump { by } => self.advance(*by),
            SideEffect::Receive { register } => {
                self.state = ExecutionState::Blocked {
                    register: register.clone(),
                };
            }
            SideEffect::Send { .. }
            | SideEffect::Sound { .. }
            | SideEffect::Recover
            | SideEffect::Noop => self.advance(1),
        }
    }

    fn advance(&mut self, by: i64) {
        self.pc = self.pc.saturating_add(by);
        self.refresh_state();
    }

    fn refresh_state(&mut self) {
        self.state = if self.program.contains(self.pc) {
            ExecutionState::Running
        } else {
            ExecutionState::Halted
        };
    }

    fn destination<'i>(&self, instruction: &'i Instruction) -> Result<&'i Register> {
        instruction.x.as_register().ok_or_else(|| {
            error::execution_error(
                self.pc,
                instruction,
                format!("{} needs a register as its first operand", instruction.op),
            )
        })
    }

    fn second(&self, instruction: &Instruction) -> Result<i64> {
        instruction
            .y
            .as_ref()
            .map(|y| self.registers.resolve(y))
            .ok_or_else(|| {
                error::execution_error(
                    self.pc,
                    instruction,
                    format!("{} requires a second operand", instruction.op),
                )
            })
    }

    fn arithmetic(
        &self,
        instruction: &Instruction,
        apply: fn(i64, i64) -> Option<i64>,
    ) -> Result<SideEffect> {
        let register = self.destination(instruction)?;
        let lhs = self.registers.read(register);
        let rhs = self.second(instruction)?;
        let value = apply(lhs, rhs).ok_or_else(|| {
            error::execution_error(self.pc, instruction, "arithmetic overflow")
                .with_context("lhs", lhs.to_string())
                .with_context("rhs", rhs.to_string())
        })?;
        Ok(SideEffect::Set {
            register: register.clone(),
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcode::Operand;
    use duet_error::ErrorKind;

    fn program(text: &str) -> Program {
        Program::parse(text).unwrap()
    }

    #[test]
    fn test_arithmetic() {
        let program = program("set a 1\nadd a 2\nmul a a\nmod a 5\nsub a 10");
        let mut machine = Machine::new(&program, Dialect::Sound);

        let mut values = Vec::new();
        while machine.is_running() {
            machine.step().unwrap();
            values.push(machine.registers().get("a"));
        }
        assert_eq!(values, vec![1, 3, 9, 4, -6]);
        assert!(machine.is_halted());
    }

    #[test]
    fn test_modulo_truncates() {
        let program = program("set a -7\nmod a 3");
        let mut machine = Machine::new(&program, Dialect::Duet);
        machine.step().unwrap();
        machine.step().unwrap();
        assert_eq!(machine.registers().get("a"), -1);
    }

    #[test]
    fn test_jump_taken_moves_relative() {
        let program = program("set a 5\njgz a -1");
        let mut machine = Machine::new(&program, Dialect::Sound);
        machine.step().unwrap();
        assert_eq!(machine.pc(), 1);

        let effect = machine.step().unwrap();
        assert_eq!(effect, SideEffect::Jump { by: -1 });
        assert_eq!(machine.pc(), 0);
    }

    #[test]
    fn test_jump_not_taken_advances() {
        let program = program("set a 0\njgz a -1\nset b 1");
        let mut machine = Machine::new(&program, Dialect::Sound);
        machine.step().unwrap();

        let before = machine.registers().clone();
        let effect = machine.step().unwrap();
        assert_eq!(effect, SideEffect::Noop);
        assert_eq!(machine.pc(), 2);
        assert_eq!(machine.registers(), &before);
    }

    #[test]
    fn test_jump_offset_from_register() {
        let program = program("set a 1\nset b 2\njgz a b\nset c 1\nset d 1");
        let mut machine = Machine::new(&program, Dialect::Duet);
        for _ in 0..3 {
            machine.step().unwrap();
        }
        assert_eq!(machine.pc(), 4);
    }

    #[test]
    fn test_jnz_takes_negative_values() {
        let program = program("set a -2\njnz a 2\nset b 1\nset c 1");
        let mut machine = Machine::new(&program, Dialect::Coprocessor);
        machine.step().unwrap();
        machine.step().unwrap();
        assert_eq!(machine.pc(), 3);
    }

    #[test]
    fn test_jump_out_of_program_halts() {
        let program = program("jgz 1 -5");
        let mut machine = Machine::new(&program, Dialect::Sound);
        machine.step().unwrap();
        assert!(machine.is_halted());
        assert_eq!(machine.pc(), -5);

        let err = machine.step().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_empty_program_starts_halted() {
        let program = Program::default();
        let machine = Machine::new(&program, Dialect::Duet);
        assert!(machine.is_halted());
        assert!(machine.current_instruction().is_none());
    }

    #[test]
    fn test_sound_dialect_effects() {
        let program = program("snd 7\nrcv 0\nrcv 1");
        let mut machine = Machine::new(&program, Dialect::Sound);
        assert_eq!(machine.step().unwrap(), SideEffect::Sound { frequency: 7 });
        assert_eq!(machine.step().unwrap(), SideEffect::Noop);
        assert_eq!(machine.step().unwrap(), SideEffect::Recover);
    }

    #[test]
    fn test_duet_receive_blocks_until_delivered() {
        let program = program("rcv a\nsnd a");
        let mut machine = Machine::new(&program, Dialect::Duet);

        let effect = machine.step().unwrap();
        assert_eq!(effect, SideEffect::Receive { register: Register::new("a") });
        assert!(machine.is_blocked());
        assert_eq!(machine.pc(), 0);
        assert!(machine.step().is_err());

        machine.deliver(42).unwrap();
        assert!(machine.is_running());
        assert_eq!(machine.pc(), 1);
        assert_eq!(machine.registers().get("a"), 42);
        assert_eq!(machine.step().unwrap(), SideEffect::Send { value: 42 });
    }

    #[test]
    fn test_deliver_without_receive() {
        let program = program("snd 1");
        let mut machine = Machine::new(&program, Dialect::Duet);
        let err = machine.deliver(1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(machine.is_running());
    }

    #[test]
    fn test_missing_second_operand_is_fatal() {
        let program = Program::new(vec![Instruction::unary(
            Operation::Add,
            Operand::register("a"),
        )]);
        let mut machine = Machine::new(&program, Dialect::Sound);

        let err = machine.step().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExecutionFailed);
        assert_eq!(err.operation(), "machine::step");
        assert_eq!(err.context_value("pc"), Some("0"));
        assert_eq!(err.context_value("instruction"), Some("add a"));
        assert!(machine.registers().is_empty());
    }

    #[test]
    fn test_literal_destination_is_fatal() {
        let program = Program::new(vec![Instruction::binary(
            Operation::Move,
            Operand::Literal(1),
            Operand::Literal(2),
        )]);
        let mut machine = Machine::new(&program, Dialect::Sound);
        assert_eq!(machine.step().unwrap_err().kind(), ErrorKind::ExecutionFailed);

        let program = Program::new(vec![Instruction::unary(Operation::Input, Operand::Literal(3))]);
        let mut machine = Machine::new(&program, Dialect::Duet);
        assert_eq!(machine.step().unwrap_err().kind(), ErrorKind::ExecutionFailed);
    }

    #[test]
    fn test_modulo_by_zero() {
        let program = program("set a 3\nmod a b");
        let mut machine = Machine::new(&program, Dialect::Sound);
        machine.step().unwrap();
        let err = machine.step().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExecutionFailed);
        assert_eq!(err.message(), "modulo by zero");
    }

    #[test]
    fn test_overflow_is_fatal() {
        let program = program("set a 9223372036854775807\nadd a 1");
        let mut machine = Machine::new(&program, Dialect::Sound);
        machine.step().unwrap();
        let err = machine.step().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExecutionFailed);
        assert_eq!(err.context_value("lhs"), Some("9223372036854775807"));
    }

    #[test]
    fn test_coprocessor_rejects_io() {
        let program = program("snd 1");
        let mut machine = Machine::new(&program, Dialect::Coprocessor);
        let err = machine.step().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
    }

    #[test]
    fn test_stats() {
        let program = program("set a 3\nmul b a\nsub a 1\njnz a -2");
        let mut machine = Machine::new(&program, Dialect::Coprocessor);
        while machine.is_running() {
            machine.step().unwrap();
        }
        let stats = machine.stats();
        assert_eq!(stats.count(Operation::Multiply), 3);
        assert_eq!(stats.count(Operation::JumpIfNonZero), 3);
        assert_eq!(stats.count(Operation::Output), 0);
        assert_eq!(stats.steps(), 10);
    }

    #[test]
    fn test_preset_registers() {
        let program = program("add p 10");
        let mut machine =
            Machine::new(&program, Dialect::Duet).with_registers(RegisterFile::seeded("p", 1));
        machine.step().unwrap();
        assert_eq!(machine.registers().get("p"), 11);
    }
}
