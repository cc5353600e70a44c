//! # duet-error
//!
//! Unified error handling for duet, following OpenDAL's error handling practices.
//!
//! ## Design Philosophy
//!
//! - **ErrorKind**: Know what error occurred (e.g., ParseFailed, NothingToRecover)
//! - **ErrorStatus**: Tell transient failures (Temporary) from program errors (Permanent)
//! - **Error Context**: Assist in locating the cause with rich context
//! - **Error Source**: Wrap underlying errors without leaking raw types
//!
//! ## Usage
//!
//! ```rust
//! use duet_error::{Error, ErrorKind};
//!
//! fn example() -> Result<(), Error> {
//!     Err(Error::new(ErrorKind::ExecutionFailed, "add requires a second operand")
//!         .with_operation("machine::step")
//!         .with_context("pc", "3")
//!         .with_context("instruction", "add a"))
//! }
//! ```
//!
//! ## Principles
//!
//! - All functions return `Result<T, duet_error::Error>`
//! - External errors are wrapped with `set_source(err)`
//! - Same error handled once, subsequent ops only append context
//! - Don't abuse `From<OtherError>` to prevent raw error leakage

mod error;
mod kind;
mod status;

pub use error::Error;
pub use kind::ErrorKind;
pub use status::ErrorStatus;

/// Result type alias using duet Error
pub type Result<T> = std::result::Result<T, Error>;
