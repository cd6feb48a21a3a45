//! Error taxonomy for the aggregation paths
//!
//! Partial fan-out failures are deliberately absent: a failed unit is
//! logged and its entity dropped, it never becomes an error value.

use std::time::Duration;

/// Classified failure of a single remote call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Connection, timeout, or body transfer failure
    Transport(String),
    /// Non-2xx response from the remote source
    Status(u16),
    /// Response body did not match the expected envelope
    Decode(String),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Transport(msg) => write!(f, "transport error: {}", msg),
            FetchError::Status(code) => write!(f, "remote source returned status {}", code),
            FetchError::Decode(msg) => write!(f, "malformed payload: {}", msg),
        }
    }
}

impl std::error::Error for FetchError {}

/// Request-level failure surfaced to the caller
#[derive(Debug)]
pub enum ServiceError {
    /// Bad category or post type, rejected before the core runs
    Validation(String),
    /// The single remote call of the averaging path failed
    Remote(FetchError),
    /// The directory fetch of a fan-out request failed
    TotalFailure(FetchError),
    /// The averaging path finished after its budget
    DeadlineExceeded { elapsed: Duration, budget: Duration },
}

impl ServiceError {
    /// HTTP status this error renders as
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::Validation(_) => 400,
            ServiceError::DeadlineExceeded { .. } => 408,
            ServiceError::Remote(_) | ServiceError::TotalFailure(_) => 500,
        }
    }
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceError::Validation(msg) => write!(f, "{}", msg),
            ServiceError::Remote(e) => write!(f, "{}", e),
            ServiceError::TotalFailure(e) => write!(f, "Error fetching users: {}", e),
            ServiceError::DeadlineExceeded { elapsed, budget } => write!(
                f,
                "Request timeout ({}ms elapsed, budget {}ms)",
                elapsed.as_millis(),
                budget.as_millis()
            ),
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServiceError::Remote(e) | ServiceError::TotalFailure(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ServiceError::Validation("bad".into()).status_code(), 400);
        assert_eq!(ServiceError::Remote(FetchError::Status(503)).status_code(), 500);
        assert_eq!(
            ServiceError::TotalFailure(FetchError::Transport("refused".into())).status_code(),
            500
        );
        let late = ServiceError::DeadlineExceeded {
            elapsed: Duration::from_millis(700),
            budget: Duration::from_millis(500),
        };
        assert_eq!(late.status_code(), 408);
    }

    #[test]
    fn test_total_failure_message() {
        let err = ServiceError::TotalFailure(FetchError::Status(401));
        assert_eq!(err.to_string(), "Error fetching users: remote source returned status 401");
    }
}
