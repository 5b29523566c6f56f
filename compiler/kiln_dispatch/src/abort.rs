use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Requests cooperative cancellation of a job's parse.
///
/// The parser polls the flag at statement boundaries; an aborted parse makes
/// `finalize_parsing_on_main_thread` fail without reporting an error.
#[derive(Clone, Default, Debug)]
pub struct AbortHandle {
    flag: Arc<AtomicBool>,
}

impl AbortHandle {
    pub fn abort(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_aborted(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    pub(crate) fn flag(&self) -> &AtomicBool {
        &self.flag
    }

    pub(crate) fn clear(&self) {
        self.flag.store(false, Ordering::Relaxed);
    }
}
