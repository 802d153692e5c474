use thiserror::Error;

#[derive(Error, Debug)]
pub enum EpgError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unexpected payload shape: {message}")]
    ShapeError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Data,
    Storage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EpgError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EpgError::ApiError(_) => ErrorCategory::Network,
            EpgError::IoError(_) => ErrorCategory::Storage,
            EpgError::SerializationError(_) | EpgError::ShapeError { .. } => ErrorCategory::Data,
            EpgError::ConfigError { .. } | EpgError::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // Fetch failures, a garbled body included, are retriable by
            // the external scheduler
            EpgError::ApiError(_) | EpgError::SerializationError(_) => ErrorSeverity::Medium,
            EpgError::IoError(_) | EpgError::ShapeError { .. } => ErrorSeverity::High,
            EpgError::ConfigError { .. } | EpgError::InvalidConfigValueError { .. } => {
                ErrorSeverity::Critical
            }
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EpgError::ApiError(_) => {
                "Verify network connectivity and the source endpoint, then re-run"
            }
            EpgError::IoError(_) => "Check that the output directory exists and is writable",
            EpgError::SerializationError(_) => {
                "The upstream response body could not be decoded as JSON; retry later"
            }
            EpgError::ShapeError { .. } => {
                "The upstream response format may have changed; compare [extract.fields] against a live sample"
            }
            EpgError::ConfigError { .. } | EpgError::InvalidConfigValueError { .. } => {
                "Fix the configuration file and the channel map, then re-run"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EpgError::ApiError(e) => format!("Could not fetch EPG data: {}", e),
            EpgError::IoError(e) => format!("Could not write the output files: {}", e),
            EpgError::SerializationError(e) => format!("Upstream response was not valid JSON: {}", e),
            EpgError::ShapeError { message } => {
                format!("Upstream response had an unexpected shape: {}", message)
            }
            EpgError::ConfigError { message } => format!("Configuration problem: {}", message),
            EpgError::InvalidConfigValueError { field, value, reason } => {
                format!("Configuration field {} has invalid value '{}': {}", field, value, reason)
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, EpgError>;
