//! Error kinds for duet operations

use std::fmt;

/// The kind of error that occurred.
///
/// This enum categorizes errors to help users write clear error handling logic.
/// Users can match on ErrorKind to decide how to handle specific error cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // =========================================================================
    // General errors
    // =========================================================================
    /// An unexpected error occurred - catch-all for unhandled cases
    Unexpected,

    /// The requested operation is not supported by this host
    Unsupported,

    /// Invalid configuration or parameters
    ConfigInvalid,

    /// Invalid argument passed to function
    InvalidArgument,

    // =========================================================================
    // Program errors
    // =========================================================================
    /// Instruction text could not be decoded
    ParseFailed,

    /// Instruction shape is inconsistent with its operation
    ExecutionFailed,

    /// Program counter left the program without a terminal condition
    UnreachableTermination,

    /// A recover trap fired before any sound was played
    NothingToRecover,

    /// The run did not finish within the configured step budget
    IterationBudgetExceeded,

    // =========================================================================
    // IO errors
    // =========================================================================
    /// File not found
    FileNotFound,

    /// Permission denied
    PermissionDenied,

    /// IO operation failed
    IoFailed,
}

impl ErrorKind {
    /// Returns the error kind as a static string
    pub fn as_str(&self) -> &'static str {
        match self {
            // General
            ErrorKind::Unexpected => "Unexpected",
            ErrorKind::Unsupported => "Unsupported",
            ErrorKind::ConfigInvalid => "ConfigInvalid",
            ErrorKind::InvalidArgument => "InvalidArgument",

            // Program
            ErrorKind::ParseFailed => "ParseFailed",
            ErrorKind::ExecutionFailed => "ExecutionFailed",
            ErrorKind::UnreachableTermination => "UnreachableTermination",
            ErrorKind::NothingToRecover => "NothingToRecover",
            ErrorKind::IterationBudgetExceeded => "IterationBudgetExceeded",

            // IO
            ErrorKind::FileNotFound => "FileNotFound",
            ErrorKind::PermissionDenied => "PermissionDenied",
            ErrorKind::IoFailed => "IoFailed",
        }
    }

    /// Check if this kind comes from a transient condition
    pub fn is_temporary(&self) -> bool {
        matches!(self, ErrorKind::IoFailed)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
