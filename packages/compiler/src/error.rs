//! Compiler Errors
//!
//! Every template error is fatal: the first one aborts the compile.

use crate::parse_util::ParseLocation;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CompilerError>;

#[derive(Debug, Error)]
pub enum CompilerError {
    #[error("unexpected end of input in {context} at {location}")]
    UnexpectedEndOfInput {
        context: String,
        location: ParseLocation,
    },

    #[error("closing tag </{found}> does not match {} at {location}", expected_tag(.expected))]
    MismatchedTag {
        expected: Option<String>,
        found: String,
        location: ParseLocation,
    },

    #[error("invalid attribute syntax: {message} at {location}")]
    InvalidAttributeSyntax {
        message: String,
        location: ParseLocation,
    },

    #[error("invalid tag syntax: {message} at {location}")]
    InvalidTagSyntax {
        message: String,
        location: ParseLocation,
    },

    #[error("unsupported construct: {message} at {location}")]
    UnsupportedConstruct {
        message: String,
        location: ParseLocation,
    },

    #[error("expecting {expected} but found {found} at {location}")]
    GrammarViolation {
        expected: String,
        found: String,
        location: ParseLocation,
    },

    #[error("internal compiler error: {message}")]
    InternalConsistencyFault { message: String },

    #[error("failed to read template: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid compiler options: {0}")]
    Config(#[from] serde_json::Error),
}

fn expected_tag(expected: &Option<String>) -> String {
    match expected {
        Some(name) => format!("open tag <{}>", name),
        None => "any open tag".to_string(),
    }
}

/// Discriminant of [`CompilerError`], handy for matching in hosts and tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UnexpectedEndOfInput,
    MismatchedTag,
    InvalidAttributeSyntax,
    InvalidTagSyntax,
    UnsupportedConstruct,
    GrammarViolation,
    InternalConsistencyFault,
    Io,
    Config,
}

/// Who is to blame for an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The template is invalid
    Template,
    /// The compiler broke one of its own invariants
    Internal,
    Io,
    Config,
}

impl CompilerError {
    pub fn internal(message: impl Into<String>) -> Self {
        CompilerError::InternalConsistencyFault {
            message: message.into(),
        }
    }

    pub fn unexpected_end(context: impl Into<String>, location: ParseLocation) -> Self {
        CompilerError::UnexpectedEndOfInput {
            context: context.into(),
            location,
        }
    }

    pub fn invalid_tag(message: impl Into<String>, location: ParseLocation) -> Self {
        CompilerError::InvalidTagSyntax {
            message: message.into(),
            location,
        }
    }

    pub fn invalid_attribute(message: impl Into<String>, location: ParseLocation) -> Self {
        CompilerError::InvalidAttributeSyntax {
            message: message.into(),
            location,
        }
    }

    pub fn unsupported(message: impl Into<String>, location: ParseLocation) -> Self {
        CompilerError::UnsupportedConstruct {
            message: message.into(),
            location,
        }
    }

    pub fn grammar(
        expected: impl Into<String>,
        found: impl Into<String>,
        location: ParseLocation,
    ) -> Self {
        CompilerError::GrammarViolation {
            expected: expected.into(),
            found: found.into(),
            location,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CompilerError::UnexpectedEndOfInput { .. } => ErrorKind::UnexpectedEndOfInput,
            CompilerError::MismatchedTag { .. } => ErrorKind::MismatchedTag,
            CompilerError::InvalidAttributeSyntax { .. } => ErrorKind::InvalidAttributeSyntax,
            CompilerError::InvalidTagSyntax { .. } => ErrorKind::InvalidTagSyntax,
            CompilerError::UnsupportedConstruct { .. } => ErrorKind::UnsupportedConstruct,
            CompilerError::GrammarViolation { .. } => ErrorKind::GrammarViolation,
            CompilerError::InternalConsistencyFault { .. } => ErrorKind::InternalConsistencyFault,
            CompilerError::Io(_) => ErrorKind::Io,
            CompilerError::Config(_) => ErrorKind::Config,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self.kind() {
            ErrorKind::InternalConsistencyFault => ErrorCategory::Internal,
            ErrorKind::Io => ErrorCategory::Io,
            ErrorKind::Config => ErrorCategory::Config,
            _ => ErrorCategory::Template,
        }
    }

    pub fn is_internal(&self) -> bool {
        self.category() == ErrorCategory::Internal
    }

    /// Where in the template the error was detected, when known
    pub fn location(&self) -> Option<ParseLocation> {
        match self {
            CompilerError::UnexpectedEndOfInput { location, .. }
            | CompilerError::MismatchedTag { location, .. }
            | CompilerError::InvalidAttributeSyntax { location, .. }
            | CompilerError::InvalidTagSyntax { location, .. }
            | CompilerError::UnsupportedConstruct { location, .. }
            | CompilerError::GrammarViolation { location, .. } => Some(*location),
            _ => None,
        }
    }
}
