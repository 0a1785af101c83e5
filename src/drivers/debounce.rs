//! Polled debouncer for digital inputs.
//!
//! A new raw level is accepted only after it has held, unchanged, for the
//! settle interval.  Any bounce back to the stable level during settling
//! cancels the candidate.
//!
//! ```text
//!  raw     ‾‾‾‾\_/‾\____________________
//!  stable  ‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾\__________
//!                   |◀─ settle ─▶|
//! ```

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SettleState {
    Stable,
    Settling { candidate: bool, since_ms: u64 },
}

#[derive(Debug, Clone)]
pub struct Debouncer {
    settle_ms: u32,
    stable: bool,
    state: SettleState,
}

impl Debouncer {
    /// Start with `initial` as the accepted level.
    pub fn new(settle_ms: u32, initial: bool) -> Self {
        Self {
            settle_ms,
            stable: initial,
            state: SettleState::Stable,
        }
    }

    /// Feed one raw sample.  Returns the new stable level when it changes.
    pub fn update(&mut self, raw: bool, now_ms: u64) -> Option<bool> {
        match self.state {
            SettleState::Stable => {
                if raw != self.stable {
                    self.state = SettleState::Settling {
                        candidate: raw,
                        since_ms: now_ms,
                    };
                    return self.settle(now_ms);
                }
                None
            }

            SettleState::Settling { candidate, .. } => {
                if raw != candidate {
                    // Bounced back to the stable level.
                    self.state = SettleState::Stable;
                    return None;
                }
                self.settle(now_ms)
            }
        }
    }

    /// Accepted level.
    pub fn stable(&self) -> bool {
        self.stable
    }

    fn settle(&mut self, now_ms: u64) -> Option<bool> {
        let SettleState::Settling { candidate, since_ms } = self.state else {
            return None;
        };
        if now_ms.saturating_sub(since_ms) >= u64::from(self.settle_ms) {
            self.stable = candidate;
            self.state = SettleState::Stable;
            return Some(candidate);
        }
        None
    }
}
