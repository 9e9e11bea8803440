use std::fmt;

use serde::Serialize;

/// Structured error type for the application. Replaces stringly-typed errors
/// so callers can match on error codes and display appropriate messages.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "code", content = "detail")]
pub enum AppError {
    NotFound { what: String },
    AlreadyExists { what: String },
    ValidationError { message: String },
    IoError { message: String },
    XmlError { message: String },
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound { what } => write!(f, "{what} not found"),
            AppError::AlreadyExists { what } => write!(f, "{what} already exists"),
            AppError::ValidationError { message } => write!(f, "{message}"),
            AppError::IoError { message } => write!(f, "I/O error: {message}"),
            AppError::XmlError { message } => write!(f, "XML error: {message}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::IoError {
            message: e.to_string(),
        }
    }
}

impl From<crate::stacks::StackError> for AppError {
    fn from(e: crate::stacks::StackError) -> Self {
        match e {
            crate::stacks::StackError::Io(io_err) => AppError::IoError {
                message: io_err.to_string(),
            },
            crate::stacks::StackError::Xml(xml_err) => AppError::XmlError {
                message: xml_err.to_string(),
            },
            crate::stacks::StackError::Parse(msg) => AppError::ValidationError { message: msg },
            crate::stacks::StackError::NotFound(name) => AppError::NotFound {
                what: format!("Stack '{name}'"),
            },
            crate::stacks::StackError::AlreadyExists(name) => AppError::AlreadyExists {
                what: format!("Stack '{name}'"),
            },
        }
    }
}

impl From<crate::persist::PersistError> for AppError {
    fn from(e: crate::persist::PersistError) -> Self {
        match e {
            crate::persist::PersistError::Io(io_err) => AppError::IoError {
                message: io_err.to_string(),
            },
            crate::persist::PersistError::Json(json_err) => AppError::ValidationError {
                message: json_err.to_string(),
            },
        }
    }
}

impl From<crate::catalog::CatalogError> for AppError {
    fn from(e: crate::catalog::CatalogError) -> Self {
        match e {
            crate::catalog::CatalogError::Io(io_err) => AppError::IoError {
                message: io_err.to_string(),
            },
            crate::catalog::CatalogError::Xml(xml_err) => AppError::XmlError {
                message: xml_err.to_string(),
            },
            crate::catalog::CatalogError::Parse(msg) => {
                AppError::ValidationError { message: msg }
            }
        }
    }
}

/// Allow converting AppError to String for CLI reporting.
impl From<AppError> for String {
    fn from(e: AppError) -> String {
        e.to_string()
    }
}

impl From<String> for AppError {
    fn from(s: String) -> Self {
        AppError::ValidationError { message: s }
    }
}

impl From<&str> for AppError {
    fn from(s: &str) -> Self {
        AppError::ValidationError {
            message: s.to_string(),
        }
    }
}
