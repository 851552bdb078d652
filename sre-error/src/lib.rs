//! # sre-error
//!
//! Unified error handling for the SRE reasoning agent.
//!
//! ## Design Philosophy
//!
//! - **ErrorKind**: Know what went wrong (e.g. MalformedStep, MaxLoopsExceeded)
//! - **ErrorStatus**: Decide how to handle it (Permanent, Temporary)
//! - **Error Context**: Locate the cause with key-value context
//! - **Error Source**: Wrap underlying errors without leaking raw types
//!
//! ## Usage
//!
//! ```rust
//! use sre_error::{Error, ErrorKind};
//!
//! fn example() -> Result<(), Error> {
//!     Err(Error::new(ErrorKind::MalformedStep, "missing field `thought`")
//!         .with_operation("step::parse")
//!         .with_context("iteration", "3"))
//! }
//! ```
//!
//! ## Principles
//!
//! - All functions return `Result<T, sre_error::Error>`
//! - External errors are wrapped with `set_source(err)`
//! - Same error handled once, subsequent ops only append context
//! - Don't abuse `From<OtherError>` to prevent raw error leakage

mod error;
mod kind;
mod status;

pub use error::Error;
pub use kind::ErrorKind;
pub use status::ErrorStatus;

/// Result type alias using the workspace Error
pub type Result<T> = std::result::Result<T, Error>;
