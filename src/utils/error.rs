use crate::domain::model::Stage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("API returned status {status} for {url}")]
    HttpStatusError { url: String, status: u16 },

    #[error("Unexpected payload: {message}")]
    UnexpectedPayloadError { message: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Record {index}: missing required field '{field}'")]
    MissingFieldError { index: usize, field: String },

    #[error("Record {index}: field '{field}' is not numeric (got {value})")]
    InvalidFieldError {
        index: usize,
        field: String,
        value: String,
    },

    #[error("{stage} stage failed: {source}")]
    StageFailed {
        stage: Stage,
        #[source]
        source: Box<EtlError>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Network or upstream data store could not deliver records.
    SourceUnavailable,
    /// A record was missing a field or held an unusable value.
    MalformedRecord,
    /// Output could not be written.
    SinkWrite,
    Configuration,
    Io,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn stage_failed(stage: Stage, source: EtlError) -> Self {
        EtlError::StageFailed {
            stage,
            source: Box::new(source),
        }
    }

    /// Index and field name of the offending record, if this is a record fault.
    pub fn record_fault(&self) -> Option<(usize, &str)> {
        match self {
            EtlError::MissingFieldError { index, field }
            | EtlError::InvalidFieldError { index, field, .. } => Some((*index, field.as_str())),
            EtlError::StageFailed { source, .. } => source.record_fault(),
            _ => None,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::StageFailed { stage, .. } => match stage {
                Stage::Extract => ErrorCategory::SourceUnavailable,
                Stage::Transform => ErrorCategory::MalformedRecord,
                Stage::Load => ErrorCategory::SinkWrite,
            },
            EtlError::ApiError(_)
            | EtlError::HttpStatusError { .. }
            | EtlError::UnexpectedPayloadError { .. } => ErrorCategory::SourceUnavailable,
            EtlError::MissingFieldError { .. } | EtlError::InvalidFieldError { .. } => {
                ErrorCategory::MalformedRecord
            }
            EtlError::ConfigValidationError { .. } | EtlError::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
            EtlError::CsvError(_) | EtlError::IoError(_) | EtlError::SerializationError(_) => {
                ErrorCategory::Io
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::SourceUnavailable => ErrorSeverity::Medium,
            ErrorCategory::MalformedRecord => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::SinkWrite | ErrorCategory::Io => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::SourceUnavailable => {
                "Check that the source endpoint or tables are reachable, then rerun the pipeline"
            }
            ErrorCategory::MalformedRecord => {
                "Fix the offending record upstream or rerun with --on-invalid-record skip"
            }
            ErrorCategory::SinkWrite => {
                "Check disk space and write permissions for the output path"
            }
            ErrorCategory::Configuration => "Review the command line flags or pipeline TOML file",
            ErrorCategory::Io => "Check that the referenced files exist and are readable",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::StageFailed { stage, source } => {
                format!("{} failed: {}", stage, source.user_friendly_message())
            }
            EtlError::HttpStatusError { status, .. } => {
                format!("The data source answered with HTTP {}", status)
            }
            EtlError::ApiError(e) if e.is_connect() => {
                "Could not connect to the data source".to_string()
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_determines_category() {
        let io = || EtlError::IoError(std::io::Error::other("disk full"));

        assert_eq!(
            EtlError::stage_failed(Stage::Extract, io()).category(),
            ErrorCategory::SourceUnavailable
        );
        assert_eq!(
            EtlError::stage_failed(Stage::Load, io()).category(),
            ErrorCategory::SinkWrite
        );
        assert_eq!(io().category(), ErrorCategory::Io);
    }

    #[test]
    fn test_record_fault_through_stage_wrapper() {
        let err = EtlError::stage_failed(
            Stage::Transform,
            EtlError::MissingFieldError {
                index: 4,
                field: "quantity".to_string(),
            },
        );

        assert_eq!(err.record_fault(), Some((4, "quantity")));
        assert_eq!(err.category(), ErrorCategory::MalformedRecord);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert_eq!(
            err.to_string(),
            "transform stage failed: Record 4: missing required field 'quantity'"
        );
    }

    #[test]
    fn test_user_friendly_http_status() {
        let err = EtlError::stage_failed(
            Stage::Extract,
            EtlError::HttpStatusError {
                url: "http://example.com".to_string(),
                status: 503,
            },
        );
        assert_eq!(
            err.user_friendly_message(),
            "extract failed: The data source answered with HTTP 503"
        );
    }
}
