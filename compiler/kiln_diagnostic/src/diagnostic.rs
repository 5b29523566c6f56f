use std::fmt;

use kiln_ir::Span;

use crate::{ErrorClass, ErrorCode};

/// A labeled span with a message.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Label {
    pub span: Span,
    pub message: String,
}

/// A compile diagnostic.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[must_use = "diagnostics should be reported or returned, not silently dropped"]
pub struct Diagnostic {
    /// Error code for searchability.
    pub code: ErrorCode,
    /// Main error message.
    pub message: String,
    /// Labeled spans showing where the error occurred.
    pub labels: Vec<Label>,
    /// Additional notes providing context.
    pub notes: Vec<String>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(code: ErrorCode) -> Self {
        Diagnostic {
            code,
            message: String::new(),
            labels: Vec::new(),
            notes: Vec::new(),
        }
    }

    /// Set the main message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add a label at the error location.
    pub fn with_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label {
            span,
            message: message.into(),
        });
        self
    }

    /// Add a note providing additional context.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Span of the first label, where the error is located.
    pub fn primary_span(&self) -> Option<Span> {
        self.labels.first().map(|l| l.span)
    }

    /// Runtime error class this diagnostic is reported as.
    pub fn class(&self) -> ErrorClass {
        self.code.error_class()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error [{}]: {}", self.code, self.message)?;

        for label in &self.labels {
            write!(f, "\n  --> {:?}: {}", label.span, label.message)?;
        }

        for note in &self.notes {
            write!(f, "\n  = note: {note}")?;
        }

        Ok(())
    }
}

fn unexpected_message(found: impl fmt::Display) -> String {
    let found = found.to_string();
    if found == "end of input" {
        "Unexpected end of input".to_string()
    } else {
        format!("Unexpected {found}")
    }
}

/// `Unexpected token '^'`, `Unexpected end of input`, ...
pub fn unexpected_token(span: Span, found: impl fmt::Display) -> Diagnostic {
    Diagnostic::error(ErrorCode::E1001)
        .with_message(unexpected_message(found))
        .with_label(span, "unexpected here")
}

/// A token that cannot start an expression where one is required.
pub fn expected_expression(span: Span, found: impl fmt::Display) -> Diagnostic {
    Diagnostic::error(ErrorCode::E1002)
        .with_message(unexpected_message(found))
        .with_label(span, "expected an expression")
}

/// `Expected ')' but found '}'`.
pub fn expected_token(span: Span, expected: &str, found: impl fmt::Display) -> Diagnostic {
    Diagnostic::error(ErrorCode::E1003)
        .with_message(format!("Expected {expected} but found {found}"))
        .with_label(span, format!("expected {expected}"))
}

/// The stack budget of a phase ran out.
pub fn stack_overflow(span: Span, phase: &str, limit: usize) -> Diagnostic {
    Diagnostic::error(ErrorCode::E5001)
        .with_message("Maximum call stack size exceeded")
        .with_label(span, format!("nesting too deep while {phase}"))
        .with_note(format!("stack budget is {limit} bytes"))
}

/// Generated code ran past an encoding limit.
pub fn internal_limit(span: Span, what: &str) -> Diagnostic {
    Diagnostic::error(ErrorCode::E9001)
        .with_message(format!("Function too large: {what}"))
        .with_label(span, "in this function")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_builder() {
        let diag = Diagnostic::error(ErrorCode::E1001)
            .with_message("Unexpected token '^'")
            .with_label(Span::new(0, 1), "here")
            .with_label(Span::new(4, 5), "and here")
            .with_note("a note");

        assert_eq!(diag.primary_span(), Some(Span::new(0, 1)));
        assert_eq!(diag.class(), ErrorClass::SyntaxError);
        assert_eq!(diag.labels.len(), 2);
    }

    #[test]
    fn test_unexpected_end_of_input() {
        let diag = unexpected_token(Span::point(3), "end of input");
        assert_eq!(diag.message, "Unexpected end of input");
        let diag = unexpected_token(Span::new(0, 1), "'^'");
        assert_eq!(diag.message, "Unexpected '^'");
    }

    #[test]
    fn test_expected_expression() {
        let diag = expected_expression(Span::new(7, 8), "token ')'");
        assert_eq!(diag.code, ErrorCode::E1002);
        assert_eq!(diag.message, "Unexpected token ')'");
        assert_eq!(diag.class(), ErrorClass::SyntaxError);
    }

    #[test]
    fn test_stack_overflow_is_range_error() {
        let diag = stack_overflow(Span::new(2, 3), "parsing", 100);
        assert_eq!(diag.class(), ErrorClass::RangeError);
        assert_eq!(diag.message, "Maximum call stack size exceeded");
    }

    #[test]
    fn test_display() {
        let diag = expected_token(Span::new(5, 6), "')'", "'}'");
        let text = diag.to_string();
        assert!(text.starts_with("error [E1003]: Expected ')' but found '}'"));
        assert!(text.contains("--> 5..6"));
    }
}
