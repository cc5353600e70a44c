//! # Register File
//!
//! Named signed-integer registers owned by a single machine.
//! Reading a register that was never written yields 0.

use crate::opcode::{Operand, Register};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The register holding a duet program's id
pub const PROGRAM_ID_REGISTER: &str = "p";

/// Mapping of register name to value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegisterFile {
    values: BTreeMap<Register, i64>,
}

impl RegisterFile {
    /// Create an empty register file
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a register file with one register preset
    pub fn seeded(register: impl Into<Register>, value: i64) -> Self {
        let mut registers = Self::new();
        registers.set(register.into(), value);
        registers
    }

    /// Number of registers that have been written
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if no register has been written
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Read a register, defaulting to 0
    pub fn get(&self, register: &str) -> i64 {
        self.values.get(register).copied().unwrap_or(0)
    }

    /// Read a register by key, defaulting to 0
    pub fn read(&self, register: &Register) -> i64 {
        self.values.get(register).copied().unwrap_or(0)
    }

    /// Check if a register has ever been written
    pub fn contains(&self, register: &Register) -> bool {
        self.values.contains_key(register)
    }

    /// Write a register
    pub fn set(&mut self, register: Register, value: i64) {
        self.values.insert(register, value);
    }

    /// Resolve an operand against the current register values
    pub fn resolve(&self, operand: &Operand) -> i64 {
        match operand {
            Operand::Literal(v) => *v,
            Operand::Register(r) => self.read(r),
        }
    }

    /// Largest value among written registers
    pub fn max_value(&self) -> Option<i64> {
        self.values.values().copied().max()
    }

    /// Iterate over written registers in name order
    pub fn iter(&self) -> impl Iterator<Item = (&Register, i64)> {
        self.values.iter().map(|(r, v)| (r, *v))
    }
}

impl FromIterator<(Register, i64)> for RegisterFile {
    fn from_iter<I: IntoIterator<Item = (Register, i64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
