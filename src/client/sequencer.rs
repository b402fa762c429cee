//! Save request sequencing
//!
//! Saves are issued in order but may complete in any order. Every save gets a sequence number,
//! once a response is committed anything older is stale.

/// Hands out sequence numbers and remembers the highest committed one
#[derive(Clone, Debug, Default)]
pub struct RequestSequencer {
    /// Last sequence number handed out
    issued: u64,

    /// Highest sequence number whose response was applied
    committed: u64,
}

impl RequestSequencer {
    /// Create a sequencer, the first number handed out is 1
    pub fn new() -> Self {
        Self::default()
    }

    /// The next sequence number
    pub fn next_seq(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    /// Would applying the response for `seq` go back in time?
    pub fn is_stale(&self, seq: u64) -> bool {
        seq <= self.committed
    }

    /// Mark the response for `seq` as applied, `false` if it is stale
    pub fn commit(&mut self, seq: u64) -> bool {
        if self.is_stale(seq) {
            return false;
        }

        self.committed = seq;

        true
    }

    /// Highest sequence number whose response was applied
    pub fn committed(&self) -> u64 {
        self.committed
    }
}
