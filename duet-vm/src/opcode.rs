//! # Duet VM Instructions
//!
//! The closed instruction set of the register machine.
//!
//! ## Design Philosophy
//! - An [`Instruction`] is an operation tag plus one or two operands
//! - Operands are either a literal or a register, resolved at the point of use
//! - Instructions are decoded once and never mutated afterwards
//! - What `snd`/`rcv` mean is decided by the host's [`Dialect`], not here

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// A named register, e.g. `a` or `p`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Register(String);

impl Register {
    pub fn new(name: impl Into<String>) -> Self {
        Register(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Register {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Register {
    fn from(name: &str) -> Self {
        Register::new(name)
    }
}

/// An instruction operand: an immediate value or a register reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Operand {
    /// Immediate signed integer
    Literal(i64),
    /// Value held by a register (0 when never written)
    Register(Register),
}

impl Operand {
    pub fn register(name: impl Into<String>) -> Self {
        Operand::Register(Register::new(name))
    }

    /// The register this operand names, if any
    pub fn as_register(&self) -> Option<&Register> {
        match self {
            Operand::Register(r) => Some(r),
            Operand::Literal(_) => None,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Literal(v) => write!(f, "{}", v),
            Operand::Register(r) => write!(f, "{}", r),
        }
    }
}

/// Operation tag - the closed instruction set
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Operation {
    /// `set X Y` - X = Y
    #[serde(rename = "set")]
    Move,
    /// `add X Y` - X = X + Y
    #[serde(rename = "add")]
    Add,
    /// `sub X Y` - X = X - Y
    #[serde(rename = "sub")]
    Subtract,
    /// `mul X Y` - X = X * Y
    #[serde(rename = "mul")]
    Multiply,
    /// `mod X Y` - X = X % Y (truncating remainder)
    #[serde(rename = "mod")]
    Modulo,
    /// `jgz X Y` - jump by Y if X > 0
    #[serde(rename = "jgz")]
    JumpIfPositive,
    /// `jnz X Y` - jump by Y if X != 0
    #[serde(rename = "jnz")]
    JumpIfNonZero,
    /// `snd X` - play a sound, or send a message
    #[serde(rename = "snd")]
    Output,
    /// `rcv X` - recover a sound, or receive a message
    #[serde(rename = "rcv")]
    Input,
}

impl Operation {
    /// Every operation, in mnemonic table order
    pub const ALL: [Operation; 9] = [
        Operation::Move,
        Operation::Add,
        Operation::Subtract,
        Operation::Multiply,
        Operation::Modulo,
        Operation::JumpIfPositive,
        Operation::JumpIfNonZero,
        Operation::Output,
        Operation::Input,
    ];

    pub fn mnemonic(&self) -> &'static str {
        match self {
            Operation::Move => "set",
            Operation::Add => "add",
            Operation::Subtract => "sub",
            Operation::Multiply => "mul",
            Operation::Modulo => "mod",
            Operation::JumpIfPositive => "jgz",
            Operation::JumpIfNonZero => "jnz",
            Operation::Output => "snd",
            Operation::Input => "rcv",
        }
    }

    pub fn from_mnemonic(mnemonic: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.mnemonic() == mnemonic)
    }

    /// Number of operands the operation takes
    pub fn arity(&self) -> usize {
        match self {
            Operation::Output | Operation::Input => 1,
            _ => 2,
        }
    }

    /// Check if the first operand is written to and must name a register
    pub fn writes_register(&self) -> bool {
        matches!(
            self,
            Operation::Move
                | Operation::Add
                | Operation::Subtract
                | Operation::Multiply
                | Operation::Modulo
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// One decoded instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub op: Operation,
    pub x: Operand,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<Operand>,
}

impl Instruction {
    pub fn unary(op: Operation, x: Operand) -> Self {
        Self { op, x, y: None }
    }

    pub fn binary(op: Operation, x: Operand, y: Operand) -> Self {
        Self { op, x, y: Some(y) }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.op, self.x)?;
        if let Some(y) = &self.y {
            write!(f, " {}", y)?;
        }
        Ok(())
    }
}

/// How the host interprets the I/O-flavored operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    /// `snd` plays a sound, `rcv` recovers the last one when its operand is non-zero
    Sound,
    /// `snd` sends a message, `rcv` blocks until one arrives
    Duet,
    /// No I/O at all; `snd`/`rcv` are rejected
    Coprocessor,
}
