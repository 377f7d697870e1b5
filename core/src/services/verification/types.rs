//! Types for verification session results and the code entry buffer

use crate::domain::entities::challenge::Challenge;

/// Result of a confirmed code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verified<O> {
    /// The challenge, now `Confirmed`
    pub challenge: Challenge,
    /// What the channel produced for it
    pub outcome: O,
}

/// Result of a resend request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResendOutcome {
    /// A new code was sent; the previous challenge is gone
    Resent(Challenge),
    /// The cooldown is still running; nothing was sent
    CoolingDown { remaining: u32 },
}

/// Digits typed into the code boxes
///
/// `resets` increases every time a failed submission clears the buffer, so a
/// surface can tell "cleared after a rejection" apart from "never typed".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeInput {
    digits: String,
    length: usize,
    resets: u32,
}

impl CodeInput {
    pub fn new(length: usize) -> Self {
        Self {
            digits: String::with_capacity(length),
            length,
            resets: 0,
        }
    }

    /// Append a digit; returns false when the character is not a digit or the buffer is full
    pub fn push(&mut self, c: char) -> bool {
        if !c.is_ascii_digit() || self.digits.len() >= self.length {
            return false;
        }
        self.digits.push(c);
        true
    }

    pub fn pop(&mut self) -> Option<char> {
        self.digits.pop()
    }

    pub fn value(&self) -> &str {
        &self.digits
    }

    pub fn len(&self) -> usize {
        self.digits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.digits.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.length > 0 && self.digits.len() == self.length
    }

    /// Index of the box that receives the next digit
    pub fn focus(&self) -> usize {
        self.digits.len().min(self.length.saturating_sub(1))
    }

    pub fn resets(&self) -> u32 {
        self.resets
    }

    pub fn clear(&mut self) {
        self.digits.clear();
    }

    /// Clear after a rejected submission
    pub(crate) fn reset(&mut self) {
        self.digits.clear();
        self.resets += 1;
    }
}
