//! Error types for field declarations.
//!
//! This module defines the errors raised while declaring fields: unknown
//! constraint keywords, rejected check arguments, custom check registration
//! conflicts and unresolvable field names.

use thiserror::Error;

/// Result type for field declaration operations.
pub type Result<T, E = FieldError> = std::result::Result<T, E>;

/// Main error type for building and resolving field descriptors.
#[derive(Error, Debug)]
pub enum FieldError {
    /// Constraint keyword is neither built in nor a registered custom check
    #[error(
        "custom check '{0}' is not available. Make sure you register your custom check \
         on the CheckRegistry before declaring fields that use it."
    )]
    UnknownCheck(String),

    /// A check constructor rejected its arguments
    #[error(transparent)]
    Check(#[from] CheckError),

    /// The resolved name could not be turned into a column selector
    #[error(transparent)]
    Selector(#[from] SelectorError),

    /// Neither a name nor an alias has been assigned
    #[error("field has neither a name nor an alias")]
    Unnamed,
}

/// Errors raised by check constructors.
#[derive(Error, Debug, Clone)]
pub enum CheckError {
    /// Named parameter not accepted by the constructor
    #[error("{check}() got an unexpected argument '{argument}'")]
    UnexpectedArgument {
        /// Constructor name
        check: String,
        /// Offending parameter
        argument: String,
    },

    /// Required parameter not supplied
    #[error("{check}() missing required argument '{argument}'")]
    MissingArgument {
        /// Constructor name
        check: String,
        /// Missing parameter
        argument: String,
    },

    /// Parameter supplied with an unusable value
    #[error("invalid argument '{argument}' for {check}(): {message}")]
    InvalidArgument {
        /// Constructor name
        check: String,
        /// Offending parameter
        argument: String,
        /// What is wrong with it
        message: String,
    },

    /// Pattern argument does not compile
    #[error("invalid pattern for {check}(): {source}")]
    InvalidPattern {
        /// Constructor name
        check: String,
        /// Regex compilation error
        source: regex::Error,
    },
}

impl CheckError {
    /// Creates a new unexpected argument error.
    pub fn unexpected(check: impl Into<String>, argument: impl Into<String>) -> Self {
        Self::UnexpectedArgument {
            check: check.into(),
            argument: argument.into(),
        }
    }

    /// Creates a new missing argument error.
    pub fn missing(check: impl Into<String>, argument: impl Into<String>) -> Self {
        Self::MissingArgument {
            check: check.into(),
            argument: argument.into(),
        }
    }

    /// Creates a new invalid argument error.
    pub fn invalid(
        check: impl Into<String>,
        argument: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidArgument {
            check: check.into(),
            argument: argument.into(),
            message: message.into(),
        }
    }
}

/// Errors raised when building a column selector.
#[derive(Error, Debug, Clone)]
pub enum SelectorError {
    /// Anchored pattern does not compile
    #[error("invalid column pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The anchored pattern
        pattern: String,
        /// Regex compilation error
        source: regex::Error,
    },
}

/// Errors raised when registering custom checks.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Name collides with a built-in constraint keyword
    #[error("'{0}' is a built-in constraint keyword and cannot be registered as a custom check")]
    ReservedName(String),

    /// Name already registered
    #[error("custom check '{0}' is already registered")]
    AlreadyRegistered(String),
}
