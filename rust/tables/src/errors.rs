/// Error classification and rejection payloads for tonk_tables
///
/// This module provides:
/// - The `TableError` type returned by table handles and the registry
/// - Machine-readable error codes and severities
/// - The `ErrorResponse` payload delivered to the acting player
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use thiserror::Error;
use tonk_engine::errors::GameError;
use tonk_engine::player::TableId;

/// Serializable error payload sent back to whoever issued a failing request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    /// Machine-readable error code (e.g., "invalid_move")
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details (structured data)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(
        error: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: Some(details),
        }
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

/// Error classification for logging levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Player or caller mistakes - expected, normal operation
    Client,
    /// Unexpected failures that need investigation
    Server,
    /// Table integrity lost; the table has been aborted
    Critical,
}

/// Trait for turning errors into rejection payloads with proper logging
pub trait IntoErrorResponse {
    /// Get the error code string (machine-readable)
    fn error_code(&self) -> &'static str;

    /// Get the error message (human-readable)
    fn error_message(&self) -> String;

    /// Get optional error details
    fn error_details(&self) -> Option<serde_json::Value> {
        None
    }

    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Client
    }

    fn to_error_response(&self) -> ErrorResponse {
        if let Some(details) = self.error_details() {
            ErrorResponse::with_details(self.error_code(), self.error_message(), details)
        } else {
            ErrorResponse::new(self.error_code(), self.error_message())
        }
    }

    /// Logs a refused request at a level matching the severity and returns the payload
    fn log_and_respond(&self, table_id: &str, player_id: &str) -> ErrorResponse {
        let response = self.to_error_response();
        match self.severity() {
            ErrorSeverity::Client => {
                tracing::warn!(table_id, player_id, error = %response, "action rejected")
            }
            ErrorSeverity::Server => {
                tracing::error!(table_id, player_id, error = %response, "action failed")
            }
            ErrorSeverity::Critical => tracing::error!(
                table_id,
                player_id,
                error = %response,
                critical = true,
                "action left the table inconsistent"
            ),
        }
        response
    }
}

impl IntoErrorResponse for GameError {
    fn error_code(&self) -> &'static str {
        match self {
            GameError::InvalidMove(_) => "invalid_move",
            GameError::EmptyDiscard => "empty_discard",
            GameError::Stalemate => "stalemate",
            GameError::InvalidTransition { .. } => "invalid_transition",
            GameError::NotEnoughPlayers { .. } => "not_enough_players",
            GameError::InsufficientCards { .. } => "insufficient_cards",
            GameError::TableFull { .. } => "table_full",
            GameError::DuplicatePlayer(_) => "duplicate_player",
            GameError::UnknownPlayer(_) => "unknown_player",
            GameError::InvalidRules(_) => "invalid_rules",
            GameError::ConsistencyViolation(_) => "consistency_violation",
        }
    }

    fn error_message(&self) -> String {
        self.to_string()
    }

    fn error_details(&self) -> Option<serde_json::Value> {
        match self {
            GameError::InvalidMove(reason) => Some(json!({ "reason": reason.to_string() })),
            GameError::InvalidTransition { status, operation } => {
                Some(json!({ "status": status, "operation": operation }))
            }
            _ => None,
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            GameError::ConsistencyViolation(_) => ErrorSeverity::Critical,
            GameError::InsufficientCards { .. } | GameError::Stalemate => ErrorSeverity::Server,
            _ => ErrorSeverity::Client,
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TableError {
    #[error(transparent)]
    Game(#[from] GameError),
    #[error("Table not found: {0}")]
    NotFound(TableId),
    #[error("Table already exists: {0}")]
    AlreadyExists(TableId),
    #[error("Table is closed: {0}")]
    Closed(TableId),
    #[error("Table registry storage poisoned")]
    StoragePoisoned,
}

impl IntoErrorResponse for TableError {
    fn error_code(&self) -> &'static str {
        match self {
            TableError::Game(e) => e.error_code(),
            TableError::NotFound(_) => "table_not_found",
            TableError::AlreadyExists(_) => "table_exists",
            TableError::Closed(_) => "table_closed",
            TableError::StoragePoisoned => "registry_storage_error",
        }
    }

    fn error_message(&self) -> String {
        self.to_string()
    }

    fn error_details(&self) -> Option<serde_json::Value> {
        match self {
            TableError::Game(e) => e.error_details(),
            _ => None,
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            TableError::Game(e) => e.severity(),
            TableError::StoragePoisoned => ErrorSeverity::Critical,
            _ => ErrorSeverity::Client,
        }
    }
}
