use std::fmt;

use serde::Serialize;

use crate::persist::PersistError;

/// Structured error type for the application. Serialized with a `code` tag so
/// a front end can match on it and show the right message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "code", content = "detail")]
pub enum AppError {
    NotFound { what: String },
    ValidationError { message: String },
    IoError { message: String },
    ApiError { message: String },
    InvalidSyntax { command: String, message: String },
    MissingRequired { command: String, fields: Vec<String> },
    CatalogError { message: String },
    SettingsSaveError { message: String },
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound { what } => write!(f, "{what} not found"),
            AppError::ValidationError { message } => write!(f, "{message}"),
            AppError::IoError { message } => write!(f, "I/O error: {message}"),
            AppError::ApiError { message } => write!(f, "API error: {message}"),
            AppError::InvalidSyntax { command, message } => {
                write!(f, "Invalid syntax for command '{command}': {message}")
            }
            AppError::MissingRequired { command, fields } => {
                write!(f, "Command '{command}' is missing required fields: {}", fields.join(", "))
            }
            AppError::CatalogError { message } => write!(f, "Catalog error: {message}"),
            AppError::SettingsSaveError { message } => {
                write!(f, "Failed to save settings: {message}")
            }
        }
    }
}

impl std::error::Error for AppError {}

impl From<PersistError> for AppError {
    fn from(e: PersistError) -> Self {
        match e {
            PersistError::Io(io_err) => AppError::IoError {
                message: io_err.to_string(),
            },
            PersistError::Json(json_err) => AppError::ValidationError {
                message: json_err.to_string(),
            },
        }
    }
}
