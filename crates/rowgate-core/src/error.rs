//! Module: error
//! Responsibility: one classified error type at the crate boundary.
//! Does not own: layer-specific error variants (each layer keeps its own).
//! Boundary: layer errors convert into [`Error`] with `?`.

use crate::{access::AccessError, compile::CompileError, config::ConfigError, filter::FilterError};
use std::fmt;
use thiserror::Error as ThisError;

///
/// Error
///
/// Classified error returned by pipeline entry points. The message is the
/// source layer's display string.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("{message}")]
pub struct Error {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl Error {
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }

    /// Broken content-type or config definitions.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self.class, ErrorClass::Configuration)
    }
}

///
/// ErrorClass
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    Configuration,
    InvalidInput,
    NotFound,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Configuration => "configuration",
            Self::InvalidInput => "invalid_input",
            Self::NotFound => "not_found",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Access,
    Compile,
    Config,
    Filter,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Access => "access",
            Self::Compile => "compile",
            Self::Config => "config",
            Self::Filter => "filter",
        };
        write!(f, "{label}")
    }
}

impl From<FilterError> for Error {
    fn from(err: FilterError) -> Self {
        Self::new(ErrorClass::InvalidInput, ErrorOrigin::Filter, err.to_string())
    }
}

impl From<AccessError> for Error {
    fn from(err: AccessError) -> Self {
        Self::new(ErrorClass::Configuration, ErrorOrigin::Access, err.to_string())
    }
}

impl From<CompileError> for Error {
    fn from(err: CompileError) -> Self {
        let class = match err {
            CompileError::UnknownField { .. } | CompileError::UnknownRelationship { .. } => {
                ErrorClass::NotFound
            }
            CompileError::Filter(_) | CompileError::InvalidOperand { .. } => {
                ErrorClass::InvalidInput
            }
        };

        Self::new(class, ErrorOrigin::Compile, err.to_string())
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::new(ErrorClass::Configuration, ErrorOrigin::Config, err.to_string())
    }
}

///
/// TESTS
///
