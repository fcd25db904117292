//! Run-level error taxonomy.
//!
//! Every failure the sync routine can surface maps onto one [`SyncError`]
//! variant. Only [`SyncError::EventCreation`] and [`SyncError::MarkerAppend`]
//! are local to a single card; everything else aborts the run.

use std::path::PathBuf;

use thiserror::Error;

use crate::api::ApiError;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("missing required configuration value '{key}'")]
    MissingConfig { key: String },

    #[error("client secret file not found at {path:?}")]
    MissingClientSecret { path: PathBuf },

    #[error("client secret file {path:?} is invalid: {message}")]
    InvalidClientSecret { path: PathBuf, message: String },

    #[error("{service} authorization failed: {message}")]
    Authorization { service: String, message: String },

    #[error("credential store {path:?}: {message}")]
    CredentialStore { path: PathBuf, message: String },

    #[error("no list named '{list_name}' on the board")]
    ListNotFound { list_name: String },

    #[error("{count} lists named '{list_name}' on the board, expected exactly one")]
    AmbiguousList { list_name: String, count: usize },

    #[error("board service error: {0}")]
    BoardService(ApiError),

    #[error("failed to create calendar event for card '{card}': {source}")]
    EventCreation {
        card: String,
        #[source]
        source: ApiError,
    },

    /// The event exists but the card is still unmarked; the next run will
    /// create a duplicate event for it.
    #[error("event created for card '{card}' but appending the marker comment failed: {source}")]
    MarkerAppend {
        card: String,
        #[source]
        source: ApiError,
    },
}

impl SyncError {
    /// Whether this error aborts the whole run rather than a single card
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            SyncError::EventCreation { .. } | SyncError::MarkerAppend { .. }
        )
    }

    /// Classify a board-service failure, surfacing rejected credentials as
    /// an authorization error
    pub fn from_board(err: ApiError) -> Self {
        if err.is_auth_error() {
            SyncError::Authorization {
                service: err.provider_name().to_string(),
                message: err.to_string(),
            }
        } else {
            SyncError::BoardService(err)
        }
    }

    pub fn missing_config(key: impl Into<String>) -> Self {
        SyncError::MissingConfig { key: key.into() }
    }

    pub fn authorization(service: impl Into<String>, message: impl Into<String>) -> Self {
        SyncError::Authorization {
            service: service.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_card_errors_are_not_fatal() {
        let creation = SyncError::EventCreation {
            card: "Buy milk".to_string(),
            source: ApiError::http("google-calendar", 500, "boom"),
        };
        let marker = SyncError::MarkerAppend {
            card: "Buy milk".to_string(),
            source: ApiError::network("trello", "reset"),
        };
        assert!(!creation.is_fatal());
        assert!(!marker.is_fatal());
    }

    #[test]
    fn test_run_level_errors_are_fatal() {
        assert!(SyncError::missing_config("trello.app_key").is_fatal());
        assert!(SyncError::ListNotFound {
            list_name: "TODO".to_string()
        }
        .is_fatal());
        assert!(SyncError::AmbiguousList {
            list_name: "TODO".to_string(),
            count: 2
        }
        .is_fatal());
        assert!(SyncError::authorization("google-calendar", "consent required").is_fatal());
    }

    #[test]
    fn test_from_board_maps_auth_failures() {
        let err = SyncError::from_board(ApiError::unauthorized("trello"));
        assert!(matches!(err, SyncError::Authorization { ref service, .. } if service == "trello"));

        let err = SyncError::from_board(ApiError::network("trello", "timeout"));
        assert!(matches!(err, SyncError::BoardService(_)));
    }

    #[test]
    fn test_display() {
        let err = SyncError::AmbiguousList {
            list_name: "TODO".to_string(),
            count: 2,
        };
        assert_eq!(
            err.to_string(),
            "2 lists named 'TODO' on the board, expected exactly one"
        );
        assert_eq!(
            SyncError::missing_config("trello.board_id").to_string(),
            "missing required configuration value 'trello.board_id'"
        );
    }
}
