//! Error types for the parser

use thiserror::Error;

/// Where in the source an error was detected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ErrorLocation {
    /// Byte offset into the source
    pub offset: usize,
    /// 1-based line
    pub line: u32,
    /// 0-based column in UTF-16 code units
    pub column: u32,
}

impl std::fmt::Display for ErrorLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Coarse classification of a [`ParseError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Lexical,
    Syntax,
    Early,
}

/// The single error a failed parse produces.
///
/// Parsing is all-or-nothing: a caller either gets a complete `Program` or
/// exactly one of these.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// Malformed token: bad escape, unterminated literal, invalid numeral
    #[error("LexicalError: {message} ({location})")]
    Lexical {
        message: String,
        location: ErrorLocation,
    },

    /// The token stream does not match any production
    #[error("SyntaxError: {message} ({location})")]
    Syntax {
        message: String,
        location: ErrorLocation,
    },

    /// A static semantic rule was violated
    #[error("EarlyError: {message} ({location})")]
    Early {
        message: String,
        location: ErrorLocation,
    },
}

impl ParseError {
    pub fn lexical(message: impl Into<String>, location: ErrorLocation) -> Self {
        ParseError::Lexical {
            message: message.into(),
            location,
        }
    }

    pub fn syntax(message: impl Into<String>, location: ErrorLocation) -> Self {
        ParseError::Syntax {
            message: message.into(),
            location,
        }
    }

    pub fn early(message: impl Into<String>, location: ErrorLocation) -> Self {
        ParseError::Early {
            message: message.into(),
            location,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ParseError::Lexical { .. } => ErrorKind::Lexical,
            ParseError::Syntax { .. } => ErrorKind::Syntax,
            ParseError::Early { .. } => ErrorKind::Early,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ParseError::Lexical { message, .. }
            | ParseError::Syntax { message, .. }
            | ParseError::Early { message, .. } => message,
        }
    }

    pub fn location(&self) -> ErrorLocation {
        match self {
            ParseError::Lexical { location, .. }
            | ParseError::Syntax { location, .. }
            | ParseError::Early { location, .. } => *location,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_kind_and_position() {
        let err = ParseError::early(
            "Identifier 'x' has already been declared",
            ErrorLocation {
                offset: 12,
                line: 2,
                column: 4,
            },
        );
        assert_eq!(
            err.to_string(),
            "EarlyError: Identifier 'x' has already been declared (2:4)"
        );
        assert_eq!(err.kind(), ErrorKind::Early);
        assert_eq!(err.location().offset, 12);
    }
}
