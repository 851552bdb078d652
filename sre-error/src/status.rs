//! Error status - whether retrying could help

use std::fmt;

/// How the caller should treat an error.
///
/// The reasoning loop never retries on its own; adapters and callers use the
/// status to decide whether another attempt is worth making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorStatus {
    /// Retrying will not change the outcome
    Permanent,
    /// The condition may clear up; a retry could succeed
    Temporary,
}

impl ErrorStatus {
    /// Whether a retry could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorStatus::Temporary)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorStatus::Permanent => "permanent",
            ErrorStatus::Temporary => "temporary",
        }
    }
}

impl fmt::Display for ErrorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_temporary_is_retryable() {
        assert!(ErrorStatus::Temporary.is_retryable());
        assert!(!ErrorStatus::Permanent.is_retryable());
        assert_eq!(ErrorStatus::Temporary.to_string(), "temporary");
    }
}
