//! # Conditional Register Machine
//!
//! Straight-line programs where every instruction carries a guard:
//!
//! ```text
//! b inc 5 if a > 1
//! c dec -10 if a >= 1
//! ```
//!
//! There are no jumps; each line runs once, in order, and only changes its
//! register when the condition holds.

use crate::decoder::parse_literal;
use crate::error::{self, Result};
use crate::opcode::Register;
use crate::registers::RegisterFile;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Change applied to the target register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Increment,
    Decrement,
}

impl Command {
    fn parse(token: &str, line: &str) -> Result<Self> {
        match token {
            "inc" => Ok(Command::Increment),
            "dec" => Ok(Command::Decrement),
            other => Err(error::parse_error(line, format!("unexpected command '{}'", other))),
        }
    }

    fn apply(&self, value: i64, amount: i64) -> Option<i64> {
        match self {
            Command::Increment => value.checked_add(amount),
            Command::Decrement => value.checked_sub(amount),
        }
    }
}

/// Comparison used by a guard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparator {
    #[serde(rename = ">")]
    Greater,
    #[serde(rename = "<")]
    Less,
    #[serde(rename = ">=")]
    GreaterOrEqual,
    #[serde(rename = "<=")]
    LessOrEqual,
    #[serde(rename = "==")]
    Equal,
    #[serde(rename = "!=")]
    NotEqual,
}

impl Comparator {
    fn parse(token: &str, line: &str) -> Result<Self> {
        Ok(match token {
            ">" => Comparator::Greater,
            "<" => Comparator::Less,
            ">=" => Comparator::GreaterOrEqual,
            "<=" => Comparator::LessOrEqual,
            "==" => Comparator::Equal,
            "!=" => Comparator::NotEqual,
            other => {
                return Err(error::parse_error(line, format!("unexpected comparator '{}'", other)))
            }
        })
    }

    pub fn holds(&self, lhs: i64, rhs: i64) -> bool {
        match self {
            Comparator::Greater => lhs > rhs,
            Comparator::Less => lhs < rhs,
            Comparator::GreaterOrEqual => lhs >= rhs,
            Comparator::LessOrEqual => lhs <= rhs,
            Comparator::Equal => lhs == rhs,
            Comparator::NotEqual => lhs != rhs,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Comparator::Greater => ">",
            Comparator::Less => "<",
            Comparator::GreaterOrEqual => ">=",
            Comparator::LessOrEqual => "<=",
            Comparator::Equal => "==",
            Comparator::NotEqual => "!=",
        }
    }
}

/// `if <register> <comparator> <value>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub register: Register,
    pub comparator: Comparator,
    pub value: i64,
}

impl Condition {
    pub fn holds(&self, registers: &RegisterFile) -> bool {
        self.comparator.holds(registers.read(&self.register), self.value)
    }
}

/// One guarded instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionalInstruction {
    pub register: Register,
    pub command: Command,
    pub amount: i64,
    pub condition: Condition,
}

impl fmt::Display for ConditionalInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let command = match self.command {
            Command::Increment => "inc",
            Command::Decrement => "dec",
        };
        write!(
            f,
            "{} {} {} if {} {} {}",
            self.register,
            command,
            self.amount,
            self.condition.register,
            self.condition.comparator.as_str(),
            self.condition.value
        )
    }
}

/// Decode `<reg> inc|dec <amount> if <reg> <cmp> <value>`
pub fn parse_conditional_instruction(line: &str) -> Result<ConditionalInstruction> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() != 7 {
        return Err(error::parse_error(
            line,
            format!("expected 7 tokens, got {}", tokens.len()),
        )
        .with_operation("conditional::parse"));
    }
    if tokens[3] != "if" {
        return Err(error::parse_error(line, format!("expected 'if' at token 4, got '{}'", tokens[3]))
            .with_operation("conditional::parse"));
    }

    let decode = || -> Result<ConditionalInstruction> {
        Ok(ConditionalInstruction {
            register: Register::new(tokens[0]),
            command: Command::parse(tokens[1], line)?,
            amount: parse_literal(tokens[2], line)?,
            condition: Condition {
                register: Register::new(tokens[4]),
                comparator: Comparator::parse(tokens[5], line)?,
                value: parse_literal(tokens[6], line)?,
            },
        })
    };
    decode().map_err(|e| e.with_operation("conditional::parse"))
}

/// A decoded guarded program
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConditionalProgram {
    instructions: Vec<ConditionalInstruction>,
}

impl ConditionalProgram {
    /// Decode one instruction per non-blank line
    pub fn parse(text: &str) -> Result<Self> {
        let instructions = text
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(idx, line)| {
                parse_conditional_instruction(line)
                    .map_err(|e| e.with_context("line_no", (idx + 1).to_string()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { instructions })
    }

    pub fn instructions(&self) -> &[ConditionalInstruction] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

/// Final state of a conditional run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConditionalRun {
    pub registers: RegisterFile,
    /// Highest value written to any register at any point
    pub highest_ever: Option<i64>,
}

impl ConditionalRun {
    /// Largest register value once all instructions have run
    pub fn largest_final(&self) -> Option<i64> {
        self.registers.max_value()
    }
}

/// Execute every instruction once, in order
pub fn run_conditional(program: &ConditionalProgram) -> Result<ConditionalRun> {
    let mut registers = RegisterFile::new();
    let mut highest_ever: Option<i64> = None;

    for instruction in program.instructions() {
        if !instruction.condition.holds(&registers) {
            continue;
        }
        let current = registers.read(&instruction.register);
        let value = instruction
            .command
            .apply(current, instruction.amount)
            .ok_or_else(|| {
                error::Error::execution_failed("arithmetic overflow")
                    .with_operation("conditional::run")
                    .with_context("instruction", instruction.to_string())
            })?;
        registers.set(instruction.register.clone(), value);
        highest_ever = Some(highest_ever.map_or(value, |h| h.max(value)));
    }

    tracing::debug!(registers = registers.len(), ?highest_ever, "conditional run finished");
    Ok(ConditionalRun {
        registers,
        highest_ever,
    })
}
