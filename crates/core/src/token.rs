//! Request sequencing.
//!
//! Every asynchronous request is stamped with a [`Token`]; its response is
//! applied only if the token is still the latest one issued for its slot.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(pub u64);

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic token source for one state slot.
#[derive(Debug, Clone, Default)]
pub struct Sequencer {
    latest: u64,
}

impl Sequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self) -> Token {
        self.latest += 1;
        Token(self.latest)
    }

    pub fn latest(&self) -> Option<Token> {
        (self.latest > 0).then_some(Token(self.latest))
    }

    pub fn is_current(&self, token: Token) -> bool {
        self.latest > 0 && token.0 == self.latest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_latest_is_current() {
        let mut seq = Sequencer::new();
        assert_eq!(seq.latest(), None);
        let a = seq.issue();
        assert!(seq.is_current(a));
        let b = seq.issue();
        assert!(!seq.is_current(a));
        assert!(seq.is_current(b));
        assert!(b > a);
    }
}
