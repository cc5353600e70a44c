//! # Programs
//!
//! An immutable sequence of decoded instructions, each remembering the
//! source line it came from.

use crate::decoder::parse_instruction;
use crate::error::{Error, Result};
use crate::opcode::Instruction;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Lines starting with this are ignored by [`Program::parse`]
pub const COMMENT_PREFIX: char = '#';

/// A loaded program
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Program {
    instructions: Vec<Instruction>,
    /// 1-based source line of each instruction
    #[serde(default)]
    lines: Vec<usize>,
}

impl Program {
    /// Build a program from already decoded instructions
    pub fn new(instructions: Vec<Instruction>) -> Self {
        let lines = (1..=instructions.len()).collect();
        Self { instructions, lines }
    }

    /// Decode program text, one instruction per line.
    ///
    /// Blank lines and `#` comments are skipped. A malformed line fails the
    /// whole program.
    pub fn parse(text: &str) -> Result<Self> {
        let mut instructions = Vec::new();
        let mut lines = Vec::new();

        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with(COMMENT_PREFIX) {
                continue;
            }
            let instruction = parse_instruction(line).map_err(|e| {
                e.with_operation("program::parse")
                    .with_context("line_no", (idx + 1).to_string())
            })?;
            instructions.push(instruction);
            lines.push(idx + 1);
        }

        tracing::debug!(instructions = instructions.len(), "program decoded");
        Ok(Self { instructions, lines })
    }

    /// Read and decode a program file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::from(e)
                .with_operation("program::from_file")
                .with_context("path", path.display().to_string())
        })?;
        Self::parse(&text).map_err(|e| e.with_context("path", path.display().to_string()))
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Fetch the instruction at a program counter; `None` when out of bounds
    pub fn get(&self, pc: i64) -> Option<&Instruction> {
        usize::try_from(pc).ok().and_then(|i| self.instructions.get(i))
    }

    /// Check if a program counter points inside the program
    pub fn contains(&self, pc: i64) -> bool {
        self.get(pc).is_some()
    }

    /// Source line of the instruction at `pc`
    pub fn line_of(&self, pc: i64) -> Option<usize> {
        usize::try_from(pc).ok().and_then(|i| self.lines.get(i).copied())
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn iter(&self) -> impl Iterator<Item = &Instruction> {
        self.instructions.iter()
    }
}

impl FromStr for Program {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Program::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcode::{Operand, Operation};
    use duet_error::ErrorKind;

    #[test]
    fn test_parse_skips_blank_and_comments() {
        let program = Program::parse(
            "\n# setup\nset b 79\n\nset c b\n  # loop\njnz a 2\n",
        )
        .unwrap();

        assert_eq!(program.len(), 3);
        assert_eq!(program.line_of(0), Some(3));
        assert_eq!(program.line_of(1), Some(5));
        assert_eq!(program.line_of(2), Some(7));
        assert_eq!(program.line_of(3), None);
    }

    #[test]
    fn test_bounds() {
        let program: Program = "set a 1\nsnd a".parse().unwrap();
        assert!(program.contains(0));
        assert!(program.contains(1));
        assert!(!program.contains(2));
        assert!(!program.contains(-1));
        assert_eq!(program.get(1).map(|i| i.op), Some(Operation::Output));
    }

    #[test]
    fn test_parse_error_reports_line_number() {
        let err = Program::parse("set a 1\n\nfoo a 2\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParseFailed);
        assert_eq!(err.operation(), "program::parse");
        assert_eq!(err.context_value("line_no"), Some("3"));
        assert_eq!(err.context_value("line"), Some("foo a 2"));
    }

    #[test]
    fn test_new_numbers_lines() {
        let program = Program::new(vec![
            Instruction::unary(Operation::Output, Operand::Literal(1)),
            Instruction::unary(Operation::Output, Operand::Literal(2)),
        ]);
        assert_eq!(program.line_of(1), Some(2));
    }

    #[test]
    fn test_from_missing_file() {
        let err = Program::from_file("/definitely/not/here.txt").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileNotFound);
        assert_eq!(err.operation(), "program::from_file");
    }
}
