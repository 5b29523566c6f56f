//! Tagged result of a parser or code generator run.

use crate::{Diagnostic, ErrorClass};

/// Result of a phase that may run away from the owning thread.
///
/// Failures are captured, not reported: the finalize step that follows the
/// phase pattern-matches on the outcome and decides what reaches the runtime.
#[derive(Clone, Debug)]
pub enum PhaseOutcome<T> {
    Ok(T),
    SyntaxError(Diagnostic),
    ResourceExhausted(Diagnostic),
    /// The code generator hit one of its own limits.
    Internal(Diagnostic),
    /// Cancelled through an abort request before completion.
    Aborted,
}

impl<T> PhaseOutcome<T> {
    /// Wrap a diagnostic in the variant its error class calls for.
    pub fn from_diagnostic(diagnostic: Diagnostic) -> Self {
        match diagnostic.class() {
            ErrorClass::SyntaxError => PhaseOutcome::SyntaxError(diagnostic),
            ErrorClass::RangeError => PhaseOutcome::ResourceExhausted(diagnostic),
            ErrorClass::InternalError => PhaseOutcome::Internal(diagnostic),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, PhaseOutcome::Ok(_))
    }

    /// The recorded diagnostic, if the phase failed with one.
    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            PhaseOutcome::SyntaxError(d)
            | PhaseOutcome::ResourceExhausted(d)
            | PhaseOutcome::Internal(d) => Some(d),
            PhaseOutcome::Ok(_) | PhaseOutcome::Aborted => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> PhaseOutcome<U> {
        match self {
            PhaseOutcome::Ok(value) => PhaseOutcome::Ok(f(value)),
            PhaseOutcome::SyntaxError(d) => PhaseOutcome::SyntaxError(d),
            PhaseOutcome::ResourceExhausted(d) => PhaseOutcome::ResourceExhausted(d),
            PhaseOutcome::Internal(d) => PhaseOutcome::Internal(d),
            PhaseOutcome::Aborted => PhaseOutcome::Aborted,
        }
    }
}

impl<T> From<Result<T, Diagnostic>> for PhaseOutcome<T> {
    fn from(result: Result<T, Diagnostic>) -> Self {
        match result {
            Ok(value) => PhaseOutcome::Ok(value),
            Err(diagnostic) => PhaseOutcome::from_diagnostic(diagnostic),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{stack_overflow, unexpected_token};
    use kiln_ir::Span;

    #[test]
    fn test_from_diagnostic_selects_variant() {
        let syntax: PhaseOutcome<()> =
            PhaseOutcome::from_diagnostic(unexpected_token(Span::new(0, 1), "'^'"));
        assert!(matches!(syntax, PhaseOutcome::SyntaxError(_)));

        let exhausted: PhaseOutcome<()> =
            PhaseOutcome::from_diagnostic(stack_overflow(Span::DUMMY, "compiling", 10));
        assert!(matches!(exhausted, PhaseOutcome::ResourceExhausted(_)));
        assert!(exhausted.diagnostic().is_some());
    }

    #[test]
    fn test_map_and_result_conversion() {
        let outcome: PhaseOutcome<u32> = Ok::<u32, Diagnostic>(2).into();
        assert!(outcome.is_ok());
        let doubled = outcome.map(|v| v * 2);
        assert!(matches!(doubled, PhaseOutcome::Ok(4)));
        assert!(PhaseOutcome::<u32>::Aborted.diagnostic().is_none());
    }
}
