//! # Mailboxes
//!
//! Unbounded FIFO queue carrying values from one duet program to the other.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Inbound message queue of one program
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Mailbox {
    queue: VecDeque<i64>,
    /// Total values ever delivered into this mailbox
    delivered: u64,
}

impl Mailbox {
    /// Create a new empty mailbox
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of values waiting
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Check if nothing is waiting
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Enqueue a value at the back
    pub fn push(&mut self, value: i64) {
        self.queue.push_back(value);
        self.delivered += 1;
    }

    /// Dequeue the oldest value
    pub fn pop(&mut self) -> Option<i64> {
        self.queue.pop_front()
    }

    /// Peek at the oldest value without removing it
    pub fn peek(&self) -> Option<i64> {
        self.queue.front().copied()
    }

    /// Total values ever pushed, including ones already consumed
    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    /// Values currently waiting, oldest first
    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        self.queue.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut mailbox = Mailbox::new();
        mailbox.push(1);
        mailbox.push(2);
        mailbox.push(3);

        assert_eq!(mailbox.peek(), Some(1));
        assert_eq!(mailbox.pop(), Some(1));
        assert_eq!(mailbox.pop(), Some(2));
        assert_eq!(mailbox.iter().collect::<Vec<_>>(), vec![3]);
        assert_eq!(mailbox.pop(), Some(3));
        assert_eq!(mailbox.pop(), None);
    }

    #[test]
    fn test_delivered_counts_all_pushes() {
        let mut mailbox = Mailbox::new();
        mailbox.push(10);
        mailbox.pop();
        mailbox.push(20);

        assert_eq!(mailbox.len(), 1);
        assert_eq!(mailbox.delivered(), 2);
    }
}
