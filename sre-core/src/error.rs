//! Error types
//!
//! Re-exports sre-error so downstream crates only depend on sre-core.

pub use sre_error::{Error, ErrorKind, ErrorStatus, Result};
