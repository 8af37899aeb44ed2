use thiserror::Error;

use crate::models::IdentifierKind;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Location unresolved: configure a zip code or lat/lon")]
    LocationUnresolved,

    #[error("Geocode error: {0}")]
    Geocode(String),

    #[error("Unknown retailer: {retailer}")]
    UnknownRetailer { retailer: String },

    #[error("{retailer} adapter requires a {expected} identifier, got {found}")]
    IdentifierMismatch {
        retailer: String,
        expected: IdentifierKind,
        found: IdentifierKind,
    },

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Scraping error: {0}")]
    Scraping(String),

    #[error("Alert delivery failed: {0}")]
    Alert(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Errors caused by the configuration rather than by a flaky collaborator.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            AppError::Config(_)
                | AppError::Validation(_)
                | AppError::LocationUnresolved
                | AppError::UnknownRetailer { .. }
                | AppError::IdentifierMismatch { .. }
        )
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(format!("{}", err))
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("blocking task failed: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
