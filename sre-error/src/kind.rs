//! Error kinds for agent operations

use std::fmt;

/// The kind of error that occurred.
///
/// Callers match on ErrorKind to decide whether a failure ends the run or
/// can be fed back to the model as an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // =========================================================================
    // General errors
    // =========================================================================
    /// An unexpected error occurred - catch-all for unhandled cases
    Unexpected,

    /// Invalid configuration or parameters
    ConfigInvalid,

    // =========================================================================
    // Step errors
    // =========================================================================
    /// Model output is not a valid step
    MalformedStep,

    /// Failed to parse input
    ParseFailed,

    /// Serialization/deserialization failed
    SerializationFailed,

    /// IO operation failed
    IoFailed,

    // =========================================================================
    // Dispatch errors (recovered as observations by the loop)
    // =========================================================================
    /// The safety gate vetoed a tool call
    SecurityViolation,

    /// The requested tool is not registered
    ToolNotFound,

    /// A tool failed while executing
    ToolExecutionFailed,

    /// Invalid argument passed to a tool or function
    InvalidArgument,

    // =========================================================================
    // Loop errors
    // =========================================================================
    /// The iteration cap was reached without a final answer
    MaxLoopsExceeded,

    // =========================================================================
    // Model adapter errors
    // =========================================================================
    /// The model adapter failed to produce a response
    AdapterFailed,

    /// Network error
    NetworkFailed,

    /// Rate limit exceeded
    RateLimited,

    /// The provider rejected the credentials
    AuthenticationFailed,
}

impl ErrorKind {
    /// Returns the error kind as a static string
    pub fn as_str(&self) -> &'static str {
        match self {
            // General
            ErrorKind::Unexpected => "Unexpected",
            ErrorKind::ConfigInvalid => "ConfigInvalid",

            // Step
            ErrorKind::MalformedStep => "MalformedStep",
            ErrorKind::ParseFailed => "ParseFailed",
            ErrorKind::SerializationFailed => "SerializationFailed",
            ErrorKind::IoFailed => "IoFailed",

            // Dispatch
            ErrorKind::SecurityViolation => "SecurityViolation",
            ErrorKind::ToolNotFound => "ToolNotFound",
            ErrorKind::ToolExecutionFailed => "ToolExecutionFailed",
            ErrorKind::InvalidArgument => "InvalidArgument",

            // Loop
            ErrorKind::MaxLoopsExceeded => "MaxLoopsExceeded",

            // Adapter
            ErrorKind::AdapterFailed => "AdapterFailed",
            ErrorKind::NetworkFailed => "NetworkFailed",
            ErrorKind::RateLimited => "RateLimited",
            ErrorKind::AuthenticationFailed => "AuthenticationFailed",
        }
    }

    /// Check if this error kind is retryable by default
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::AdapterFailed | ErrorKind::NetworkFailed | ErrorKind::RateLimited
        )
    }

}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
