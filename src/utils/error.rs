use crate::domain::model::GridDirection;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error("Lookup request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Grid error: {0}")]
    GridError(#[from] GridError),

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Data,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl ConsoleError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ConsoleError::HttpError(_) => ErrorCategory::Network,
            ConsoleError::CsvError(_) | ConsoleError::GridError(_) => ErrorCategory::Data,
            ConsoleError::IoError(_) => ErrorCategory::System,
            ConsoleError::ConfigValidationError { .. }
            | ConsoleError::InvalidConfigValueError { .. }
            | ConsoleError::MissingConfigError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Data | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ConsoleError::HttpError(_) => "Could not reach the inventory service".to_string(),
            ConsoleError::CsvError(e) => format!("The inventory file could not be read: {}", e),
            ConsoleError::IoError(e) => format!("File system error: {}", e),
            ConsoleError::GridError(e) => e.to_string(),
            ConsoleError::ConfigValidationError { field, message } => {
                format!("Setting '{}' is invalid: {}", field, message)
            }
            ConsoleError::InvalidConfigValueError { field, reason, .. } => {
                format!("Setting '{}' is invalid: {}", field, reason)
            }
            ConsoleError::MissingConfigError { field } => {
                format!("Setting '{}' is required", field)
            }
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => "Check the configuration file and try again",
            ErrorCategory::Network => "Check the lookup endpoint and network connection",
            ErrorCategory::Data => "Check the inventory data for malformed rows",
            ErrorCategory::System => "Check file paths and permissions",
        }
    }
}

pub type Result<T> = std::result::Result<T, ConsoleError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("Unsupported direction: {0}")]
    UnsupportedDirection(GridDirection),

    #[error("Invalid address: {0:?}")]
    InvalidAddress(String),

    #[error("Grid of {rows}x{columns} exceeds {max} slots per side")]
    TooLarge { rows: u32, columns: u32, max: u32 },
}

/// Failure reported by a lookup collaborator.
///
/// Backend messages conventionally look like `"<context> : <reason>"`; only
/// the reason is meant for the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct LookupError {
    message: String,
}

impl LookupError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Text after the last `" : "`, or the whole message when there is none.
    pub fn reason(&self) -> &str {
        match self.message.rfind(" : ") {
            Some(index) => &self.message[index + 3..],
            None => &self.message,
        }
    }
}

/// Why a scanned barcode did not make it into the worklist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    Format(Vec<String>),
    Duplicate(String),
    NotFound(LookupError),
    BusinessRule(Vec<String>),
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::Format(messages) | ScanError::BusinessRule(messages) => {
                f.write_str(&messages.join("\n"))
            }
            ScanError::Duplicate(barcode) => write!(f, "\"{}\" has already been scanned", barcode),
            ScanError::NotFound(error) => f.write_str(error.reason()),
        }
    }
}

impl std::error::Error for ScanError {}
