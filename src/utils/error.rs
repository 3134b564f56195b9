use thiserror::Error;

/// Failure classes of the text-understanding service call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceErrorKind {
    Timeout,
    Auth,
    RateLimited,
    Unavailable,
    Transport,
    Rejected,
    InvalidResponse,
}

impl std::fmt::Display for ServiceErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ServiceErrorKind::Timeout => "timeout",
            ServiceErrorKind::Auth => "auth",
            ServiceErrorKind::RateLimited => "rate_limited",
            ServiceErrorKind::Unavailable => "unavailable",
            ServiceErrorKind::Transport => "transport",
            ServiceErrorKind::Rejected => "rejected",
            ServiceErrorKind::InvalidResponse => "invalid_response",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum ConstraintError {
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Service error ({kind}): {message}")]
    ServiceError {
        kind: ServiceErrorKind,
        message: String,
    },

    #[error("Service reply is not a constraint list ({} bytes)", .raw_output.len())]
    ParseError { raw_output: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Service,
    Parse,
    Validation,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ConstraintError {
    pub fn service(kind: ServiceErrorKind, message: impl Into<String>) -> Self {
        ConstraintError::ServiceError {
            kind,
            message: message.into(),
        }
    }

    /// Map a non-success HTTP status to a service error kind.
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let kind = match status.as_u16() {
            401 | 403 => ServiceErrorKind::Auth,
            408 => ServiceErrorKind::Timeout,
            429 => ServiceErrorKind::RateLimited,
            500..=599 => ServiceErrorKind::Unavailable,
            _ => ServiceErrorKind::Rejected,
        };
        Self::service(kind, format!("HTTP {}: {}", status, body.trim()))
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ConstraintError::ConfigError { .. }
            | ConstraintError::MissingConfigError { .. }
            | ConstraintError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            ConstraintError::ServiceError { .. } => ErrorCategory::Service,
            ConstraintError::ParseError { .. } | ConstraintError::SerializationError(_) => {
                ErrorCategory::Parse
            }
            ConstraintError::ValidationError { .. } | ConstraintError::CsvError(_) => {
                ErrorCategory::Validation
            }
            ConstraintError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ConstraintError::ValidationError { .. } => ErrorSeverity::Low,
            ConstraintError::ServiceError { kind, .. } => match kind {
                ServiceErrorKind::Auth => ErrorSeverity::High,
                _ => ErrorSeverity::Medium,
            },
            ConstraintError::ParseError { .. } => ErrorSeverity::Medium,
            ConstraintError::SerializationError(_) | ConstraintError::CsvError(_) => {
                ErrorSeverity::High
            }
            ConstraintError::ConfigError { .. }
            | ConstraintError::MissingConfigError { .. }
            | ConstraintError::InvalidConfigValueError { .. }
            | ConstraintError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    /// Transient service failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ConstraintError::ServiceError {
                kind: ServiceErrorKind::Timeout
                    | ServiceErrorKind::RateLimited
                    | ServiceErrorKind::Unavailable
                    | ServiceErrorKind::Transport,
                ..
            }
        )
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            ConstraintError::MissingConfigError { .. } => {
                "Set OPENAI_API_KEY in the environment or in a .env file"
            }
            ConstraintError::ConfigError { .. } | ConstraintError::InvalidConfigValueError { .. } => {
                "Check the configuration file and environment overrides"
            }
            ConstraintError::ServiceError { kind, .. } => match kind {
                ServiceErrorKind::Auth => "Verify the API key is valid and has access to the model",
                ServiceErrorKind::RateLimited => "Wait a moment and retry, or raise retry_attempts",
                ServiceErrorKind::Timeout => "Retry, or raise service.timeout_seconds",
                ServiceErrorKind::Unavailable | ServiceErrorKind::Transport => {
                    "Check network connectivity and the service base_url, then retry"
                }
                ServiceErrorKind::Rejected | ServiceErrorKind::InvalidResponse => {
                    "Check the model name and request settings"
                }
            },
            ConstraintError::ParseError { .. } => {
                "Retry the request or continue with the default places only"
            }
            ConstraintError::ValidationError { .. } => "Fix the offending entry and retry",
            ConstraintError::IoError(_) => "Check that the file exists and is readable",
            ConstraintError::SerializationError(_) | ConstraintError::CsvError(_) => {
                "Check the defaults file format"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ConstraintError::MissingConfigError { field } => {
                format!("必要な設定 {} が見つかりません", field)
            }
            ConstraintError::ServiceError { kind, .. } => {
                format!("AI サービスの呼び出しに失敗しました ({})", kind)
            }
            ConstraintError::ParseError { .. } => "JSON形式に変換できませんでした".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for ConstraintError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            ServiceErrorKind::Timeout
        } else if err.is_decode() {
            ServiceErrorKind::InvalidResponse
        } else if let Some(status) = err.status() {
            return Self::from_status(status, &err.to_string());
        } else {
            ServiceErrorKind::Transport
        };
        Self::service(kind, err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ConstraintError>;

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_status_classification() {
        let kind_of = |status: StatusCode| match ConstraintError::from_status(status, "") {
            ConstraintError::ServiceError { kind, .. } => kind,
            other => panic!("unexpected {:?}", other),
        };

        assert_eq!(kind_of(StatusCode::UNAUTHORIZED), ServiceErrorKind::Auth);
        assert_eq!(kind_of(StatusCode::TOO_MANY_REQUESTS), ServiceErrorKind::RateLimited);
        assert_eq!(kind_of(StatusCode::BAD_GATEWAY), ServiceErrorKind::Unavailable);
        assert_eq!(kind_of(StatusCode::BAD_REQUEST), ServiceErrorKind::Rejected);
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(ConstraintError::service(ServiceErrorKind::Timeout, "t").is_retryable());
        assert!(ConstraintError::service(ServiceErrorKind::RateLimited, "r").is_retryable());
        assert!(!ConstraintError::service(ServiceErrorKind::Auth, "a").is_retryable());
        assert!(!ConstraintError::ParseError {
            raw_output: "x".to_string()
        }
        .is_retryable());
    }

    #[test]
    fn test_missing_key_is_critical_configuration() {
        let err = ConstraintError::MissingConfigError {
            field: "OPENAI_API_KEY".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }
}
