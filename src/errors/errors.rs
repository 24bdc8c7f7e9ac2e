use std::fmt::Display;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    internal_error: ErrorImpl,
    line: u32,
}

impl Error {
    pub fn new(error_impl: ErrorImpl, line: u32) -> Self {
        Error {
            internal_error: error_impl,
            line,
        }
    }

    /// Shorthand for invariant violations found inside a backend.
    pub fn internal(message: impl Into<String>, line: u32) -> Self {
        Error::new(
            ErrorImpl::InternalFault {
                message: message.into(),
            },
            line,
        )
    }

    pub fn get_line(&self) -> u32 {
        self.line
    }

    pub fn get_impl(&self) -> &ErrorImpl {
        &self.internal_error
    }

    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => "UnrecognisedToken",
            ErrorImpl::UnexpectedToken { .. } => "UnexpectedToken",
            ErrorImpl::UnexpectedTokenDetailed { .. } => "UnexpectedTokenDetailed",
            ErrorImpl::NumberParseError { .. } => "NumberParseError",
            ErrorImpl::DuplicateDeclaration { .. } => "DuplicateDeclaration",
            ErrorImpl::UndeclaredIdentifier { .. } => "UndeclaredIdentifier",
            ErrorImpl::TypeMismatch { .. } => "TypeMismatch",
            ErrorImpl::InvalidCaseLabel { .. } => "InvalidCaseLabel",
            ErrorImpl::DuplicateCaseKey { .. } => "DuplicateCaseKey",
            ErrorImpl::ArgumentCountMismatch { .. } => "ArgumentCountMismatch",
            ErrorImpl::NotAVariable { .. } => "NotAVariable",
            ErrorImpl::NotARoutine { .. } => "NotARoutine",
            ErrorImpl::NestedRoutine { .. } => "NestedRoutine",
            ErrorImpl::DivisionByZero => "DivisionByZero",
            ErrorImpl::IndexOutOfRange { .. } => "IndexOutOfRange",
            ErrorImpl::InvalidInput { .. } => "InvalidInput",
            ErrorImpl::ErrorTypedNode => "ErrorTypedNode",
            ErrorImpl::OutputError { .. } => "OutputError",
            ErrorImpl::InternalFault { .. } => "InternalFault",
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => ErrorTip::None,
            ErrorImpl::UnexpectedToken { token } => ErrorTip::Suggestion(format!(
                "Unexpected token: `{}`, did you miss a semicolon?",
                token
            )),
            ErrorImpl::UnexpectedTokenDetailed { token, message } => {
                ErrorTip::Suggestion(format!("Unexpected token: `{}`, {}", token, message))
            }
            ErrorImpl::NumberParseError { token } => ErrorTip::Suggestion(format!(
                "Invalid number: `{}`, is it above the integer limit?",
                token
            )),
            ErrorImpl::DuplicateDeclaration { name } => {
                ErrorTip::Suggestion(format!("`{}` is already declared in this scope", name))
            }
            ErrorImpl::UndeclaredIdentifier { name } => {
                ErrorTip::Suggestion(format!("`{}` is not declared", name))
            }
            ErrorImpl::TypeMismatch { expected, found } => ErrorTip::Suggestion(format!(
                "Expected type `{}`, found `{}`",
                expected, found
            )),
            ErrorImpl::InvalidCaseLabel { label } => ErrorTip::Suggestion(format!(
                "Case label `{}` must be a constant of the selector's type",
                label
            )),
            ErrorImpl::DuplicateCaseKey { label } => {
                ErrorTip::Suggestion(format!("Case label `{}` is used more than once", label))
            }
            ErrorImpl::ArgumentCountMismatch {
                routine,
                expected,
                received,
            } => ErrorTip::Suggestion(format!(
                "`{}` expects {} arguments, received {}",
                routine, expected, received
            )),
            ErrorImpl::NotAVariable { name } => {
                ErrorTip::Suggestion(format!("`{}` cannot be assigned to", name))
            }
            ErrorImpl::NotARoutine { name } => {
                ErrorTip::Suggestion(format!("`{}` is not a procedure or function", name))
            }
            ErrorImpl::NestedRoutine { name } => ErrorTip::Suggestion(format!(
                "Move `{}` to the program level, nested routines are not supported",
                name
            )),
            ErrorImpl::DivisionByZero => ErrorTip::None,
            ErrorImpl::IndexOutOfRange { index, min, max } => ErrorTip::Suggestion(format!(
                "Index {} is outside {}..{}",
                index, min, max
            )),
            ErrorImpl::InvalidInput { token } => {
                ErrorTip::Suggestion(format!("Could not read `{}`", token))
            }
            ErrorImpl::ErrorTypedNode => ErrorTip::None,
            ErrorImpl::OutputError { .. } => ErrorTip::None,
            ErrorImpl::InternalFault { .. } => ErrorTip::None,
        }
    }

    pub fn is_semantic(&self) -> bool {
        matches!(
            self.internal_error,
            ErrorImpl::DuplicateDeclaration { .. }
                | ErrorImpl::UndeclaredIdentifier { .. }
                | ErrorImpl::TypeMismatch { .. }
                | ErrorImpl::InvalidCaseLabel { .. }
                | ErrorImpl::DuplicateCaseKey { .. }
                | ErrorImpl::ArgumentCountMismatch { .. }
                | ErrorImpl::NotAVariable { .. }
                | ErrorImpl::NotARoutine { .. }
                | ErrorImpl::NestedRoutine { .. }
        )
    }

    pub fn is_runtime(&self) -> bool {
        matches!(
            self.internal_error,
            ErrorImpl::DivisionByZero
                | ErrorImpl::IndexOutOfRange { .. }
                | ErrorImpl::InvalidInput { .. }
                | ErrorImpl::ErrorTypedNode
                | ErrorImpl::OutputError { .. }
        )
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.internal_error)
    }
}

impl std::error::Error for Error {}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorImpl {
    // Syntax
    #[error("unrecognised token: {token:?}")]
    UnrecognisedToken { token: String },
    #[error("unexpected token: {token:?}")]
    UnexpectedToken { token: String },
    #[error("unexpected token ({message:?}): {token:?}")]
    UnexpectedTokenDetailed { token: String, message: String },
    #[error("error parsing number: {token:?}")]
    NumberParseError { token: String },

    // Semantic
    #[error("{name:?} already declared")]
    DuplicateDeclaration { name: String },
    #[error("{name:?} not declared")]
    UndeclaredIdentifier { name: String },
    #[error("types do not match: expected {expected:?}, found {found:?}")]
    TypeMismatch { expected: String, found: String },
    #[error("invalid case label {label:?}")]
    InvalidCaseLabel { label: String },
    #[error("duplicate case label {label:?}")]
    DuplicateCaseKey { label: String },
    #[error("{routine:?} expects {expected} arguments, received {received}")]
    ArgumentCountMismatch {
        routine: String,
        expected: usize,
        received: usize,
    },
    #[error("{name:?} is not a variable")]
    NotAVariable { name: String },
    #[error("{name:?} is not a procedure or function")]
    NotARoutine { name: String },
    #[error("routine {name:?} declared inside another routine")]
    NestedRoutine { name: String },

    // Runtime
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Index {index} out of range {min}..{max}")]
    IndexOutOfRange { index: i64, min: i64, max: i64 },
    #[error("Invalid input {token:?}")]
    InvalidInput { token: String },
    #[error("Error-typed expression")]
    ErrorTypedNode,
    #[error("Output failure: {message}")]
    OutputError { message: String },

    // Internal
    #[error("internal fault: {message}")]
    InternalFault { message: String },
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::new(
            ErrorImpl::OutputError {
                message: error.to_string(),
            },
            0,
        )
    }
}
