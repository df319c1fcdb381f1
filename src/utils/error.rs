use thiserror::Error;

#[derive(Error, Debug)]
pub enum FraError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("API returned status {status} for {endpoint}")]
    ApiStatusError { status: u16, endpoint: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Authentication failed: {message}")]
    AuthenticationError { message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Data,
    Storage,
    Configuration,
    Authentication,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// Process exit code for a failed run. Low severity still counts as success.
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

impl FraError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            FraError::ApiError(_) | FraError::ApiStatusError { .. } => ErrorCategory::Network,
            FraError::CsvError(_)
            | FraError::SerializationError(_)
            | FraError::ProcessingError { .. } => ErrorCategory::Data,
            FraError::ZipError(_) | FraError::IoError(_) => ErrorCategory::Storage,
            FraError::ConfigError { .. }
            | FraError::ConfigValidationError { .. }
            | FraError::InvalidConfigValueError { .. }
            | FraError::MissingConfigError { .. } => ErrorCategory::Configuration,
            FraError::AuthenticationError { .. } => ErrorCategory::Authentication,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Data | ErrorCategory::Authentication => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            FraError::ApiError(_) => "Check network connectivity and that the record endpoint is reachable",
            FraError::ApiStatusError { .. } => "Verify the endpoint URL and any required credentials, then retry",
            FraError::CsvError(_) => "Check the export column definitions",
            FraError::IoError(_) => "Check that the paths exist and are writable",
            FraError::ZipError(_) => "Check free disk space and output directory permissions",
            FraError::SerializationError(_) => "Make sure the input file contains valid JSON",
            FraError::ConfigError { .. }
            | FraError::ConfigValidationError { .. }
            | FraError::InvalidConfigValueError { .. }
            | FraError::MissingConfigError { .. } => "Review the configuration file or command-line flags",
            FraError::AuthenticationError { .. } => "Check the username and password",
            FraError::ProcessingError { .. } => "Inspect the input records for unexpected shapes",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Could not fetch records: {}", self),
            ErrorCategory::Data => format!("Could not process records: {}", self),
            ErrorCategory::Storage => format!("Could not read or write files: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::Authentication => "Invalid credentials".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FraError>;
