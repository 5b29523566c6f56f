use kiln_diagnostic::{Diagnostic, ErrorClass};

/// Why a finalize or prepare step failed.
///
/// Every variant except `Aborted` has also been reported to the runtime's
/// error sink.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum JobError {
    #[error("SyntaxError: {}", .0.message)]
    SyntaxError(Diagnostic),

    #[error("RangeError: {}", .0.message)]
    ResourceExhausted(Diagnostic),

    #[error("internal compiler error: {}", .0.message)]
    Internal(Diagnostic),

    #[error("compile job aborted")]
    Aborted,
}

impl JobError {
    pub(crate) fn from_diagnostic(diagnostic: Diagnostic) -> Self {
        match diagnostic.class() {
            ErrorClass::SyntaxError => JobError::SyntaxError(diagnostic),
            ErrorClass::RangeError => JobError::ResourceExhausted(diagnostic),
            ErrorClass::InternalError => JobError::Internal(diagnostic),
        }
    }

    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            JobError::SyntaxError(d) | JobError::ResourceExhausted(d) | JobError::Internal(d) => {
                Some(d)
            }
            JobError::Aborted => None,
        }
    }
}
