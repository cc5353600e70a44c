//! # Sound Host
//!
//! Runs a single program in the [`Dialect::Sound`] dialect: `snd` plays a
//! frequency and `rcv` with a non-zero operand recovers the most recently
//! played one. The first recovery ends the run and is its answer.

use crate::config::VmConfig;
use crate::error::{self, Result};
use crate::interpreter::{Machine, SideEffect};
use crate::opcode::Dialect;
use crate::program::Program;
use serde::Serialize;

/// Result of a run that ended in a recover trap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Recovery {
    /// The recovered frequency
    pub frequency: i64,
    /// Instructions executed, including the trap itself
    pub steps: u64,
    /// Program counter of the `rcv` that fired
    pub pc: i64,
}

/// Run until the first recover trap fires.
///
/// Falling off the program is an [`UnreachableTermination`] error, and a trap
/// before any sound was played is [`NothingToRecover`].
///
/// [`UnreachableTermination`]: duet_error::ErrorKind::UnreachableTermination
/// [`NothingToRecover`]: duet_error::ErrorKind::NothingToRecover
pub fn recover(program: &Program, config: &VmConfig) -> Result<Recovery> {
    config.validate()?;
    let mut machine = Machine::new(program, Dialect::Sound);
    let mut last_played: Option<i64> = None;

    tracing::debug!(instructions = program.len(), "sound run started");

    while machine.is_running() {
        if machine.stats().steps() >= config.max_steps {
            return Err(error::budget_exceeded(config.max_steps).with_operation("sound::recover"));
        }

        let pc = machine.pc();
        last_played = match machine.step()? {
            SideEffect::Sound { frequency } => Some(frequency),
            SideEffect::Recover => {
                let frequency = last_played.ok_or_else(|| {
                    error::nothing_to_recover()
                        .with_operation("sound::recover")
                        .with_context("pc", pc.to_string())
                })?;
                let steps = machine.stats().steps();
                tracing::info!(frequency, steps, "recovered sound");
                return Ok(Recovery { frequency, steps, pc });
            }
            _ => last_played,
        };
    }

    Err(error::unreachable_termination(machine.pc()).with_operation("sound::recover"))
}
