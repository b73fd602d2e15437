use thiserror::Error;

#[derive(Error, Debug)]
pub enum DamageLabError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Base64 decode error: {0}")]
    DecodeError(#[from] base64::DecodeError),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Unsupported upload '{file}': {reason}")]
    UnsupportedUploadError { file: String, reason: String },

    #[error("Damage level must be between 1 and 5, got {value}")]
    InvalidDamageLevelError { value: i64 },

    #[error("{service} returned HTTP {status}: {body}")]
    ServiceError {
        service: String,
        status: u16,
        body: String,
    },

    #[error("{service} response is missing '{field}'")]
    MissingOutputError { service: String, field: String },

    #[error("Assessment response could not be decoded: {reason}")]
    AssessmentDecodeError { reason: String, raw: String },

    #[error("Failed to fetch street view for '{location}'. Status code: {status}")]
    MapImageryError { status: u16, location: String },

    #[error("Artifact not found: {key}")]
    ArtifactNotFoundError { key: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Network,
    Service,
    Storage,
    Decode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl DamageLabError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::ConfigValidationError { .. } => ErrorCategory::Configuration,
            Self::UnsupportedUploadError { .. } | Self::InvalidDamageLevelError { .. } => {
                ErrorCategory::Input
            }
            Self::HttpError(_) => ErrorCategory::Network,
            Self::ServiceError { .. }
            | Self::MissingOutputError { .. }
            | Self::MapImageryError { .. } => ErrorCategory::Service,
            Self::IoError(_) | Self::ArtifactNotFoundError { .. } => ErrorCategory::Storage,
            Self::SerializationError(_)
            | Self::DecodeError(_)
            | Self::AssessmentDecodeError { .. } => ErrorCategory::Decode,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 模型輸出不穩定，重跑通常可以解決
            Self::AssessmentDecodeError { .. } | Self::MissingOutputError { .. } => {
                ErrorSeverity::Medium
            }
            Self::HttpError(_) | Self::MapImageryError { .. } => ErrorSeverity::Medium,
            Self::ServiceError { status, .. } if *status == 429 || *status >= 500 => {
                ErrorSeverity::Medium
            }
            Self::ServiceError { .. } => ErrorSeverity::High,
            Self::UnsupportedUploadError { .. } | Self::InvalidDamageLevelError { .. } => {
                ErrorSeverity::High
            }
            Self::ArtifactNotFoundError { .. } => ErrorSeverity::High,
            Self::SerializationError(_) | Self::DecodeError(_) => ErrorSeverity::High,
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::ConfigValidationError { .. } => ErrorSeverity::Critical,
            Self::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            Self::MissingConfigError { field } => format!(
                "Set {} in the config file or export the matching environment variable",
                field
            ),
            Self::InvalidConfigValueError { field, .. }
            | Self::ConfigValidationError { field, .. } => {
                format!("Fix the value of '{}' in your configuration", field)
            }
            Self::ConfigError { .. } => "Check the configuration file syntax".to_string(),
            Self::UnsupportedUploadError { .. } => {
                "Upload a jpg, jpeg or png photo of a building".to_string()
            }
            Self::InvalidDamageLevelError { .. } => {
                "Choose a damage level from 1 (minor wear) to 5 (catastrophic)".to_string()
            }
            Self::HttpError(_) => {
                "Check your network connection and the service base URL".to_string()
            }
            Self::ServiceError { status: 401, .. } | Self::ServiceError { status: 403, .. } => {
                "Check that OPENAI_API_KEY is set and valid".to_string()
            }
            Self::ServiceError { status: 413, .. } => {
                "Use a smaller image; the service rejected the payload size".to_string()
            }
            Self::ServiceError { status: 429, .. } => {
                "The service is rate limiting requests, wait a moment and retry".to_string()
            }
            Self::ServiceError { .. } => {
                "Inspect the service response body above and retry".to_string()
            }
            Self::MissingOutputError { .. } | Self::AssessmentDecodeError { .. } => {
                "The model answered in an unexpected shape, run the flow again".to_string()
            }
            Self::MapImageryError { .. } => {
                "Check GOOGLE_MAPS_API_KEY and try a more specific location".to_string()
            }
            Self::ArtifactNotFoundError { .. } => {
                "Run `damage-lab history` to list stored artifacts".to_string()
            }
            Self::IoError(_) => {
                "Check that the store directory exists and is writable".to_string()
            }
            Self::SerializationError(_) | Self::DecodeError(_) => {
                "The stored index or a service payload is corrupt".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        if let Self::AssessmentDecodeError { raw, .. } = self {
            return format!("Unexpected data: {}\nModel response:\n{}", self, raw);
        }

        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Input => format!("Invalid input: {}", self),
            ErrorCategory::Network => format!("Could not reach the service: {}", self),
            ErrorCategory::Service => format!("The external service failed: {}", self),
            ErrorCategory::Storage => format!("Image store problem: {}", self),
            ErrorCategory::Decode => format!("Unexpected data: {}", self),
        }
    }
}

impl ErrorSeverity {
    /// 任何錯誤都不會以 0 結束
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorSeverity::Low | ErrorSeverity::High => 1,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, DamageLabError>;
