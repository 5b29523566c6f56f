//! Where compile failures go once a job escalates them.

use std::fmt;
use std::sync::Arc;

use kiln_diagnostic::ErrorClass;

/// A compile failure as the runtime sees it: an error to be thrown.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct PendingError {
    pub class: ErrorClass,
    pub message: String,
    pub script: Arc<str>,
    /// 1-based; zero when the diagnostic had no location.
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for PendingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.class, self.message)?;
        if self.line > 0 {
            write!(f, " ({}:{}:{})", self.script, self.line, self.column)?;
        }
        Ok(())
    }
}

/// Receiver of escalated compile errors.
pub trait ErrorSink {
    fn report(&mut self, error: PendingError);

    fn clear(&mut self);

    fn pending(&self) -> Option<&PendingError>;
}

/// Single pending-error slot. A new report replaces the previous one.
#[derive(Default, Debug)]
pub struct PendingErrorSlot {
    error: Option<PendingError>,
}

impl ErrorSink for PendingErrorSlot {
    fn report(&mut self, error: PendingError) {
        self.error = Some(error);
    }

    fn clear(&mut self) {
        self.error = None;
    }

    fn pending(&self) -> Option<&PendingError> {
        self.error.as_ref()
    }
}
