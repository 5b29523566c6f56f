use std::fmt;

/// Error codes for all compiler diagnostics.
///
/// Format: E#### where first digit indicates phase:
/// - E0xxx: Lexer errors
/// - E1xxx: Parser errors
/// - E5xxx: Resource limits
/// - E9xxx: Internal compiler errors
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    // Lexer Errors (E0xxx)
    /// Unterminated string literal
    E0001,
    /// Invalid or unexpected character in source
    E0002,
    /// Invalid number literal
    E0003,
    /// Unterminated block comment
    E0004,
    /// Invalid escape sequence
    E0005,

    // Parser Errors (E1xxx)
    /// Unexpected token
    E1001,
    /// Expected expression
    E1002,
    /// Expected a specific token
    E1003,
    /// Expected identifier
    E1004,
    /// Invalid left-hand side in assignment
    E1005,
    /// Duplicate parameter name
    E1006,
    /// `break` / `continue` outside of a loop
    E1007,

    // Resource Limits (E5xxx)
    /// Stack budget exhausted
    E5001,

    // Internal Errors (E9xxx)
    /// Generated code exceeds an encoding limit
    E9001,
}

/// Runtime error class a diagnostic is reported as.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorClass {
    SyntaxError,
    RangeError,
    InternalError,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorClass::SyntaxError => write!(f, "SyntaxError"),
            ErrorClass::RangeError => write!(f, "RangeError"),
            ErrorClass::InternalError => write!(f, "InternalError"),
        }
    }
}

impl ErrorCode {
    /// Get the string representation (e.g., "E1001").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E0001 => "E0001",
            ErrorCode::E0002 => "E0002",
            ErrorCode::E0003 => "E0003",
            ErrorCode::E0004 => "E0004",
            ErrorCode::E0005 => "E0005",
            ErrorCode::E1001 => "E1001",
            ErrorCode::E1002 => "E1002",
            ErrorCode::E1003 => "E1003",
            ErrorCode::E1004 => "E1004",
            ErrorCode::E1005 => "E1005",
            ErrorCode::E1006 => "E1006",
            ErrorCode::E1007 => "E1007",
            ErrorCode::E5001 => "E5001",
            ErrorCode::E9001 => "E9001",
        }
    }

    /// Short description of the error family.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E0001 => "unterminated string literal",
            ErrorCode::E0002 => "invalid or unexpected character",
            ErrorCode::E0003 => "invalid number literal",
            ErrorCode::E0004 => "unterminated block comment",
            ErrorCode::E0005 => "invalid escape sequence",
            ErrorCode::E1001 => "unexpected token",
            ErrorCode::E1002 => "expected expression",
            ErrorCode::E1003 => "expected token",
            ErrorCode::E1004 => "expected identifier",
            ErrorCode::E1005 => "invalid assignment target",
            ErrorCode::E1006 => "duplicate parameter name",
            ErrorCode::E1007 => "jump statement outside of a loop",
            ErrorCode::E5001 => "stack budget exhausted",
            ErrorCode::E9001 => "code size limit exceeded",
        }
    }

    pub fn is_lexer_error(&self) -> bool {
        self.as_str().starts_with("E0")
    }

    pub fn is_parser_error(&self) -> bool {
        self.as_str().starts_with("E1")
    }

    /// Class of the error reported to the runtime.
    pub fn error_class(&self) -> ErrorClass {
        if self.is_lexer_error() || self.is_parser_error() {
            ErrorClass::SyntaxError
        } else if matches!(self, ErrorCode::E5001) {
            ErrorClass::RangeError
        } else {
            ErrorClass::InternalError
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::E1001.to_string(), "E1001");
        assert_eq!(ErrorCode::E5001.as_str(), "E5001");
    }

    #[test]
    fn test_error_classes() {
        assert_eq!(ErrorCode::E0001.error_class(), ErrorClass::SyntaxError);
        assert_eq!(ErrorCode::E1006.error_class(), ErrorClass::SyntaxError);
        assert_eq!(ErrorCode::E5001.error_class(), ErrorClass::RangeError);
        assert_eq!(ErrorCode::E9001.error_class(), ErrorClass::InternalError);
    }
}
