//! # Instruction-Set Schema
//!
//! A structured description of every operation the decoder accepts, with
//! its operand roles and the meaning of each dialect. Rendered as plain text
//! for humans or as JSON for tooling.

use crate::opcode::{Dialect, Operation};
use serde::Serialize;

/// Complete instruction-set description
#[derive(Debug, Clone, Serialize)]
pub struct InstructionSchema {
    /// Schema version
    pub version: &'static str,
    pub description: &'static str,
    pub operations: Vec<OperationSpec>,
    pub dialects: Vec<DialectSpec>,
    /// How operands are written
    pub operands: OperandSyntax,
}

/// One mnemonic
#[derive(Debug, Clone, Serialize)]
pub struct OperationSpec {
    pub mnemonic: &'static str,
    pub arity: usize,
    pub operands: Vec<&'static str>,
    pub description: &'static str,
    pub example: &'static str,
}

/// How a host reads `snd` and `rcv`
#[derive(Debug, Clone, Serialize)]
pub struct DialectSpec {
    pub dialect: Dialect,
    pub output: &'static str,
    pub input: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct OperandSyntax {
    pub register: &'static str,
    pub literal: &'static str,
}

impl Default for InstructionSchema {
    fn default() -> Self {
        Self::new()
    }
}

impl InstructionSchema {
    pub fn new() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            description: "A register machine over signed 64-bit integers. One instruction \
                          per line; the program counter starts at 0 and the program halts \
                          when it leaves the instruction list.",
            operations: Operation::ALL.into_iter().map(Self::describe).collect(),
            dialects: vec![
                DialectSpec {
                    dialect: Dialect::Sound,
                    output: "play X as a sound",
                    input: "if X is non-zero, recover the last played sound and stop",
                },
                DialectSpec {
                    dialect: Dialect::Duet,
                    output: "send X to the other program's queue",
                    input: "take the next queued value into register X, waiting if none",
                },
                DialectSpec {
                    dialect: Dialect::Coprocessor,
                    output: "not available",
                    input: "not available",
                },
            ],
            operands: OperandSyntax {
                register: "any token that is not a literal; unset registers read as 0",
                literal: "optional '-' followed by decimal digits",
            },
        }
    }

    /// Look up the entry for `mnemonic`
    pub fn operation(&self, mnemonic: &str) -> Option<&OperationSpec> {
        self.operations.iter().find(|op| op.mnemonic == mnemonic)
    }

    fn describe(op: Operation) -> OperationSpec {
        let (operands, description, example) = match op {
            Operation::Move => (vec!["X: register", "Y: value"], "X = Y", "set a 5"),
            Operation::Add => (vec!["X: register", "Y: value"], "X = X + Y", "add a b"),
            Operation::Subtract => (vec!["X: register", "Y: value"], "X = X - Y", "sub a -3"),
            Operation::Multiply => (vec!["X: register", "Y: value"], "X = X * Y", "mul a a"),
            Operation::Modulo => (
                vec!["X: register", "Y: value"],
                "X = X % Y, truncating remainder (sign follows X)",
                "mod a 5",
            ),
            Operation::JumpIfPositive => (
                vec!["X: value", "Y: value"],
                "if X > 0, move the program counter by Y",
                "jgz a -1",
            ),
            Operation::JumpIfNonZero => (
                vec!["X: value", "Y: value"],
                "if X != 0, move the program counter by Y",
                "jnz 1 3",
            ),
            Operation::Output => (vec!["X: value"], "emit X (meaning depends on dialect)", "snd a"),
            Operation::Input => (
                vec!["X: register or value"],
                "consume input (meaning depends on dialect)",
                "rcv a",
            ),
        };
        OperationSpec {
            mnemonic: op.mnemonic(),
            arity: op.arity(),
            operands,
            description,
            example,
        }
    }

    /// Render as readable text
    pub fn to_text(&self) -> String {
        let mut out = String::new();

        out.push_str(&format!("# Duet instruction set (v{})\n\n", self.version));
        out.push_str(self.description);
        out.push_str("\n\n");

        out.push_str("## Operands\n\n");
        out.push_str(&format!("- register: {}\n", self.operands.register));
        out.push_str(&format!("- literal: {}\n\n", self.operands.literal));

        out.push_str("## Operations\n\n");
        for op in &self.operations {
            out.push_str(&format!(
                "- {} ({}): {}\n",
                op.mnemonic,
                op.operands.join(", "),
                op.description
            ));
            out.push_str(&format!("  example: `{}`\n", op.example));
        }

        out.push_str("\n## Dialects\n\n");
        for d in &self.dialects {
            out.push_str(&format!("### {:?}\n", d.dialect));
            out.push_str(&format!("- snd: {}\n", d.output));
            out.push_str(&format!("- rcv: {}\n\n", d.input));
        }

        out
    }

    /// Render as JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_operation_is_listed() {
        let schema = InstructionSchema::new();
        assert_eq!(schema.operations.len(), Operation::ALL.len());
        for op in Operation::ALL {
            let spec = schema.operation(op.mnemonic()).unwrap();
            assert_eq!(spec.arity, op.arity());
            assert_eq!(spec.operands.len(), spec.arity);
        }
        assert!(schema.operation("nop").is_none());
    }

    #[test]
    fn test_schema_text() {
        let text = InstructionSchema::new().to_text();

        assert!(text.contains("jgz (X: value, Y: value)"));
        assert!(text.contains("### Duet"));
        assert!(text.contains("recover the last played sound"));
    }

    #[test]
    fn test_schema_json() {
        let json = InstructionSchema::new().to_json();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["operations"][0]["mnemonic"], "set");
        assert_eq!(value["dialects"][2]["dialect"], "coprocessor");
    }
}
