//! Error types for tabwatch operations

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TabwatchError>;

#[derive(Error, Debug)]
pub enum TabwatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid key: {message}")]
    InvalidKey { message: String },

    #[error("Column '{column}' not found in {context}")]
    MissingColumn { column: String, context: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Data processing error: {message}")]
    DataProcessing { message: String },

    #[error("Generic error: {0}")]
    Generic(#[from] anyhow::Error),
}

impl TabwatchError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn invalid_key(msg: impl Into<String>) -> Self {
        Self::InvalidKey {
            message: msg.into(),
        }
    }

    pub fn missing_column(column: impl Into<String>, context: impl Into<String>) -> Self {
        Self::MissingColumn {
            column: column.into(),
            context: context.into(),
        }
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: msg.into(),
        }
    }

    pub fn data_processing(msg: impl Into<String>) -> Self {
        Self::DataProcessing {
            message: msg.into(),
        }
    }
}
