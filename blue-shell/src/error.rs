//! Error types for the shell core.

use std::io;
use thiserror::Error;

/// A structural problem found while building a command descriptor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    #[error("no command tokens were set")]
    MissingCommand,

    #[error("command tokens are empty")]
    EmptyCommand,

    #[error("command tokens were set more than once")]
    CommandAlreadySet,

    #[error("alias tokens are empty")]
    EmptyAlias,

    #[error("option declared without long names")]
    MissingLongNames,

    #[error("invalid option long name: '{0}'")]
    InvalidLongName(String),

    #[error("duplicate option: {0}")]
    DuplicateOption(String),

    #[error("required option {0} cannot declare a default value")]
    RequiredWithDefault(String),

    #[error("default value for option {name} is invalid: {reason}")]
    InvalidDefault { name: String, reason: String },

    #[error("no handler was set")]
    MissingHandler,

    #[error("handler was set more than once")]
    HandlerAlreadySet,

    #[error("no handler bound for method '{0}'")]
    UnboundMethod(String),
}

/// Main error type for command registration and invocation.
#[derive(Error, Debug)]
pub enum ShellError {
    /// The descriptor was structurally invalid; every violation found is listed
    #[error("Invalid command descriptor: {}", join_violations(.0))]
    InvalidDescriptor(Vec<Violation>),

    #[error("Duplicate option: {0}")]
    DuplicateOption(String),

    #[error("Command not found: {0}")]
    CommandNotFound(String),

    #[error("Missing required option: {0}")]
    MissingRequiredOption(String),

    #[error("Unknown option: {0}")]
    UnknownOption(String),

    #[error("Invalid value for option {name}: {reason}")]
    InvalidOptionValue { name: String, reason: String },

    /// The handler itself returned an error
    #[error("Handler failed: {0}")]
    HandlerFailed(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),

    #[error("Invalid manifest: {0}")]
    Manifest(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Result type alias for shell operations
pub type Result<T> = std::result::Result<T, ShellError>;

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
