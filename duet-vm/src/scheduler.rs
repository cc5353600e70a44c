//! # Duet Scheduler
//!
//! Drives two [`Dialect::Duet`] machines as cooperative coroutines on one
//! thread. Each tick advances program 0 by one step, then program 1.
//!
//! - `snd` pushes into the other program's [`Mailbox`]
//! - `rcv` takes from the program's own mailbox, or blocks when it is empty
//! - A blocked program is resumed as soon as a value is waiting for it
//!
//! The run is over once neither program can make progress. Mutual deadlock
//! is the expected way for a duet to end; a program running off its
//! instructions is an [`UnreachableTermination`] error.
//!
//! [`UnreachableTermination`]: duet_error::ErrorKind::UnreachableTermination

use crate::config::VmConfig;
use crate::error::{self, Result};
use crate::interpreter::{ExecutionState, Machine, SideEffect};
use crate::mailbox::Mailbox;
use crate::opcode::Dialect;
use crate::program::Program;
use crate::registers::{RegisterFile, PROGRAM_ID_REGISTER};
use serde::Serialize;

/// Why neither program can progress any more
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// Both programs wait on empty mailboxes
    Deadlock,
    /// At least one program ran off its instructions
    Halted,
}

/// Summary of a duet that ended in deadlock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DuetOutcome {
    /// Values sent by program 0 and program 1
    pub sent: [u64; 2],
    /// Scheduler ticks until both programs were blocked
    pub ticks: u64,
}

impl DuetOutcome {
    /// The puzzle answer: how many values program 1 sent
    pub fn sent_by_program_one(&self) -> u64 {
        self.sent[1]
    }
}

/// Two machines sharing a program, wired through two mailboxes
#[derive(Debug, Clone)]
pub struct Duet<'p> {
    machines: [Machine<'p>; 2],
    /// `inboxes[i]` holds values waiting for program `i`
    inboxes: [Mailbox; 2],
    ticks: u64,
}

impl<'p> Duet<'p> {
    /// Create both programs; each gets its id in register `p`
    pub fn new(program: &'p Program) -> Self {
        let spawn = |id: i64| {
            Machine::new(program, Dialect::Duet)
                .with_registers(RegisterFile::seeded(PROGRAM_ID_REGISTER, id))
        };
        Self {
            machines: [spawn(0), spawn(1)],
            inboxes: [Mailbox::new(), Mailbox::new()],
            ticks: 0,
        }
    }

    /// Program `id` (0 or 1)
    pub fn machine(&self, id: usize) -> Option<&Machine<'p>> {
        self.machines.get(id)
    }

    /// Values waiting for program `id` (0 or 1)
    pub fn inbox(&self, id: usize) -> Option<&Mailbox> {
        self.inboxes.get(id)
    }

    /// Values sent so far by program 0 and program 1
    pub fn sent(&self) -> [u64; 2] {
        // program 0 sends into inbox 1 and vice versa
        [self.inboxes[1].delivered(), self.inboxes[0].delivered()]
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Check if program `id` could do anything on its next turn
    pub fn can_progress(&self, id: usize) -> bool {
        let (Some(machine), Some(inbox)) = (self.machines.get(id), self.inboxes.get(id)) else {
            return false;
        };
        match machine.state() {
            ExecutionState::Running => true,
            ExecutionState::Blocked { .. } => !inbox.is_empty(),
            ExecutionState::Halted => false,
        }
    }

    /// Why the run is over, or `None` while either program can still progress
    pub fn termination(&self) -> Option<Termination> {
        if self.can_progress(0) || self.can_progress(1) {
            return None;
        }
        if self.machines.iter().all(Machine::is_blocked) {
            Some(Termination::Deadlock)
        } else {
            Some(Termination::Halted)
        }
    }

    /// Advance program 0 by one step, then program 1
    pub fn tick(&mut self) -> Result<()> {
        self.advance(0)?;
        self.advance(1)?;
        self.ticks += 1;
        Ok(())
    }

    /// Tick until both programs deadlock.
    ///
    /// Fails if a program halts before that, or the step budget is spent.
    pub fn run(&mut self, config: &VmConfig) -> Result<DuetOutcome> {
        config.validate()?;
        tracing::debug!(instructions = self.machines[0].program().len(), "duet started");

        loop {
            match self.termination() {
                Some(Termination::Deadlock) => {
                    let sent = self.sent();
                    tracing::info!(?sent, ticks = self.ticks, "duet deadlocked");
                    return Ok(DuetOutcome {
                        sent,
                        ticks: self.ticks,
                    });
                }
                Some(Termination::Halted) => return Err(self.halted_error()),
                None => {}
            }
            if self.ticks >= config.max_steps {
                let sent = self.sent();
                return Err(error::budget_exceeded(config.max_steps)
                    .with_operation("duet::run")
                    .with_context("sent_0", sent[0].to_string())
                    .with_context("sent_1", sent[1].to_string()));
            }
            self.tick()?;
        }
    }

    fn halted_error(&self) -> error::Error {
        let id = self
            .machines
            .iter()
            .position(Machine::is_halted)
            .unwrap_or_default();
        let sent = self.sent();
        error::unreachable_termination(self.machines[id].pc())
            .with_operation("duet::run")
            .with_context("program", id.to_string())
            .with_context("sent_0", sent[0].to_string())
            .with_context("sent_1", sent[1].to_string())
    }

    fn advance(&mut self, id: usize) -> Result<()> {
        let peer = 1 - id;
        let Self {
            machines, inboxes, ..
        } = self;
        let machine = &mut machines[id];

        if machine.is_halted() {
            return Ok(());
        }
        if machine.is_blocked() {
            if let Some(value) = inboxes[id].pop() {
                machine.deliver(value)?;
            }
            return Ok(());
        }

        let effect = machine
            .step()
            .map_err(|e| e.with_operation("duet::advance").with_context("program", id.to_string()))?;
        match effect {
            SideEffect::Send { value } => inboxes[peer].push(value),
            SideEffect::Receive { .. } => {
                if let Some(value) = inboxes[id].pop() {
                    machine.deliver(value)?;
                }
            }
            _ => {}
        }
        Ok(())
    }
}

/// Run a duet of `program` against itself
pub fn run_duet(program: &Program, config: &VmConfig) -> Result<DuetOutcome> {
    Duet::new(program).run(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use duet_error::ErrorKind;

    const EXAMPLE: &str = "\
snd 1
snd 2
snd p
rcv a
rcv b
rcv c
rcv d
";

    #[test]
    fn test_example_deadlocks_after_three_sends() {
        let program = Program::parse(EXAMPLE).unwrap();
        let outcome = run_duet(&program, &VmConfig::default()).unwrap();

        assert_eq!(outcome.sent_by_program_one(), 3);
        assert_eq!(outcome.sent, [3, 3]);
    }

    #[test]
    fn test_program_ids_are_exchanged() {
        let program = Program::parse(EXAMPLE).unwrap();
        let mut duet = Duet::new(&program);
        duet.run(&VmConfig::default()).unwrap();

        let (zero, one) = (duet.machine(0).unwrap(), duet.machine(1).unwrap());
        // each program received 1, 2 and the other's id
        assert_eq!(zero.registers().get("c"), 1);
        assert_eq!(one.registers().get("c"), 0);
        assert_eq!(zero.registers().get("a"), 1);
        assert_eq!(one.registers().get("b"), 2);
        assert!(zero.is_blocked());
        assert!(one.is_blocked());
        assert!(duet.inbox(0).unwrap().is_empty());
        assert!(duet.inbox(1).unwrap().is_empty());
        assert_eq!(duet.termination(), Some(Termination::Deadlock));
    }

    #[test]
    fn test_registers_are_independent() {
        let program = Program::parse("add p 10\nrcv x").unwrap();
        let mut duet = Duet::new(&program);
        duet.run(&VmConfig::default()).unwrap();

        assert_eq!(duet.machine(0).unwrap().registers().get("p"), 10);
        assert_eq!(duet.machine(1).unwrap().registers().get("p"), 11);
    }

    #[test]
    fn test_blocked_program_resumes_when_value_arrives() {
        // program 1 skips the first receive and sends; program 0 waits for it
        let program = Program::parse("jgz p 2\nrcv a\nset b 1\nsnd 9\nrcv z\nrcv y").unwrap();
        let mut duet = Duet::new(&program);

        duet.tick().unwrap();
        duet.tick().unwrap();
        assert!(duet.machine(0).unwrap().is_blocked());
        assert!(duet.can_progress(1));
        assert_eq!(duet.termination(), None);

        let outcome = duet.run(&VmConfig::default()).unwrap();
        assert_eq!(duet.machine(0).unwrap().registers().get("a"), 9);
        assert_eq!(duet.machine(1).unwrap().registers().get("z"), 9);
        assert_eq!(outcome.sent, [1, 1]);
    }

    #[test]
    fn test_halt_is_not_a_deadlock() {
        let program = Program::parse("snd p").unwrap();
        let err = run_duet(&program, &VmConfig::default()).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UnreachableTermination);
        assert_eq!(err.operation(), "duet::run");
        assert_eq!(err.context_value("program"), Some("0"));
        assert_eq!(err.context_value("pc"), Some("1"));
    }

    #[test]
    fn test_one_program_halting_while_other_blocks() {
        // program 1 jumps to the sends and falls off the end; program 0 waits for a third value
        let program = Program::parse("jgz p 4\nrcv a\nrcv b\nrcv c\nsnd 1\nsnd 2").unwrap();
        let mut duet = Duet::new(&program);
        let err = duet.run(&VmConfig::default()).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UnreachableTermination);
        assert_eq!(err.context_value("program"), Some("1"));
        assert_eq!(err.context_value("pc"), Some("6"));
        assert_eq!(err.context_value("sent_1"), Some("2"));
        assert_eq!(duet.termination(), Some(Termination::Halted));
        assert!(duet.machine(0).unwrap().is_blocked());
    }

    #[test]
    fn test_out_of_range_program_id() {
        let program = Program::parse(EXAMPLE).unwrap();
        let duet = Duet::new(&program);

        assert!(duet.machine(2).is_none());
        assert!(duet.inbox(2).is_none());
        assert!(!duet.can_progress(2));
    }

    #[test]
    fn test_sent_counts_survive_consumption() {
        let program = Program::parse("snd 5\nrcv a\nrcv b").unwrap();
        let mut duet = Duet::new(&program);
        duet.run(&VmConfig::default()).unwrap();

        // both values were consumed, yet still counted as sent
        assert!(duet.inbox(0).unwrap().is_empty());
        assert_eq!(duet.sent(), [1, 1]);
    }

    #[test]
    fn test_ping_pong_forever_hits_budget() {
        let program = Program::parse("snd 1\nrcv a\njgz a -2").unwrap();
        let err = run_duet(&program, &VmConfig::new().with_max_steps(500)).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::IterationBudgetExceeded);
        assert_eq!(err.operation(), "duet::run");
    }

    #[test]
    fn test_execution_errors_name_the_program() {
        let program = Program::parse("mod p p").unwrap();
        let err = run_duet(&program, &VmConfig::default()).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ExecutionFailed);
        assert_eq!(err.context_value("program"), Some("0"));
    }
}
