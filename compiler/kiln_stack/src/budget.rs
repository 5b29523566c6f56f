//! Byte-accounted recursion budget.

/// Default budget for a compile job: 984 KiB, the customary default native
/// stack limit of script engines.
pub const DEFAULT_MAX_STACK_BYTES: usize = 984 * 1024;

/// A frame did not fit into the remaining budget.
#[derive(Copy, Clone, Eq, PartialEq, Debug, thiserror::Error)]
#[error("stack budget of {limit} bytes exhausted ({used} in use, {requested} requested)")]
pub struct StackExhausted {
    pub limit: usize,
    pub used: usize,
    pub requested: usize,
}

/// Running total of the frame bytes charged by one recursive phase.
#[derive(Clone, Debug)]
pub struct StackBudget {
    limit: usize,
    used: usize,
}

impl StackBudget {
    /// A budget of `limit` bytes, nothing charged yet.
    pub fn new(limit: usize) -> Self {
        StackBudget {
            limit,
            used: 0,
        }
    }

    /// Charge a frame of `frame` bytes.
    ///
    /// On failure nothing is charged, so the caller must not call
    /// [`exit`](Self::exit) for this frame.
    pub fn enter(&mut self, frame: usize) -> Result<(), StackExhausted> {
        match self.used.checked_add(frame) {
            Some(total) if total <= self.limit => {
                self.used = total;
                Ok(())
            }
            _ => Err(StackExhausted {
                limit: self.limit,
                used: self.used,
                requested: frame,
            }),
        }
    }

    /// Release a frame charged by a successful [`enter`](Self::enter).
    pub fn exit(&mut self, frame: usize) {
        debug_assert!(frame <= self.used, "releasing more than was charged");
        self.used = self.used.saturating_sub(frame);
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}
