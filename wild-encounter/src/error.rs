//! Error taxonomy for the encounter engine.
//!
//! "No encounter" is never an error. These variants only describe caller
//! misuse and malformed authored data.
use thiserror::Error;

use crate::config::EncounterConfigError;

/// Caller passed data the engine refuses to act on.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvalidRequest {
    #[error("forced encounter list is empty")]
    EmptyForcedList,
    #[error("unknown tool identifier `{0}`")]
    UnknownTool(String),
    #[error("roaming appearance divisor must be positive")]
    ZeroChanceDivisor,
    #[error("no migration policy registered under id {0}")]
    UnknownMigrationPolicy(usize),
    #[error("no roaming creature with id {0}")]
    UnknownRoamer(u32),
}

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum EncounterError {
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] InvalidRequest),
    #[error("invalid encounter configuration: {0}")]
    Config(#[from] EncounterConfigError),
    #[error("malformed encounter data: {0}")]
    Data(#[from] serde_json::Error),
    #[error("encounter group `{group}` is invalid: {reason}")]
    Catalog { group: String, reason: &'static str },
}

impl EncounterError {
    /// Returns the misuse reason when this error is an invalid request.
    #[must_use]
    pub const fn invalid_request(&self) -> Option<&InvalidRequest> {
        match self {
            Self::InvalidRequest(reason) => Some(reason),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_request_is_reachable_through_wrapper() {
        let err = EncounterError::from(InvalidRequest::UnknownTool("net".to_string()));
        assert_eq!(
            err.invalid_request(),
            Some(&InvalidRequest::UnknownTool("net".to_string()))
        );
        assert_eq!(
            err.to_string(),
            "invalid request: unknown tool identifier `net`"
        );
    }

    #[test]
    fn data_errors_are_not_requests() {
        let parse = serde_json::from_str::<u32>("nope").unwrap_err();
        let err = EncounterError::from(parse);
        assert!(err.invalid_request().is_none());
    }
}
