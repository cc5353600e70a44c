//! # Instruction Decoder
//!
//! Turns one line of `<mnemonic> <operand> [operand]` into an [`Instruction`].
//!
//! A token made of an optional leading `-` followed by digits only is a
//! literal; every other token names a register. The rule is the same for
//! every operand position, so `jgz a -1` jumps back by one rather than
//! reading a register called `-1`.

use crate::error::{self, Result};
use crate::opcode::{Instruction, Operand, Operation};

/// Check if a token has the shape of an integer literal
pub fn is_literal(token: &str) -> bool {
    let digits = token.strip_prefix('-').unwrap_or(token);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Parse an integer literal token, failing on anything else
pub fn parse_literal(token: &str, line: &str) -> Result<i64> {
    if !is_literal(token) {
        return Err(error::parse_error(line, format!("expected an integer, got '{}'", token)));
    }
    token.parse::<i64>().map_err(|e| {
        error::parse_error(line, format!("integer '{}' out of range", token)).set_source(e)
    })
}

/// Parse an operand token: a literal if it looks like one, a register otherwise
pub fn parse_operand(token: &str, line: &str) -> Result<Operand> {
    if is_literal(token) {
        parse_literal(token, line).map(Operand::Literal)
    } else {
        Ok(Operand::register(token))
    }
}

/// Decode a single instruction line
pub fn parse_instruction(line: &str) -> Result<Instruction> {
    decode(line).map_err(|e| e.with_operation("decoder::parse_instruction"))
}

fn decode(line: &str) -> Result<Instruction> {
    let mut tokens = line.split_whitespace();
    let mnemonic = tokens
        .next()
        .ok_or_else(|| error::parse_error(line, "empty instruction"))?;
    let op = Operation::from_mnemonic(mnemonic).ok_or_else(|| {
        error::parse_error(line, format!("unsupported instruction '{}'", mnemonic))
            .with_context("mnemonic", mnemonic)
    })?;

    let operands: Vec<&str> = tokens.collect();
    if operands.len() != op.arity() {
        return Err(error::parse_error(
            line,
            format!(
                "{} takes {} operand(s), got {}",
                op,
                op.arity(),
                operands.len()
            ),
        ));
    }

    let x = parse_operand(operands[0], line)?;
    if op.writes_register() && x.as_register().is_none() {
        return Err(error::parse_error(
            line,
            format!("{} must write to a register, got '{}'", op, x),
        ));
    }

    let y = match operands.get(1) {
        Some(token) => Some(parse_operand(token, line)?),
        None => None,
    };

    Ok(Instruction { op, x, y })
}
