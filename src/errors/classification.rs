use super::types::PipelineError;

#[derive(Debug, Clone)]
pub struct ErrorClassification {
    pub error_type: &'static str,
    pub retryable: bool,
}

impl PipelineError {
    /// Classify this error to determine its type and whether it can be retried.
    pub fn classify(&self) -> ErrorClassification {
        match self {
            // Transient: the same call may succeed a moment later
            PipelineError::Timeout(_) => ErrorClassification {
                error_type: "TimeoutError",
                retryable: true,
            },
            PipelineError::Network(_) => ErrorClassification {
                error_type: "NetworkError",
                retryable: true,
            },
            PipelineError::RateLimit(_) => ErrorClassification {
                error_type: "RateLimitError",
                retryable: true,
            },
            PipelineError::LLMApi(_) => ErrorClassification {
                error_type: "LLMApiError",
                retryable: true,
            },
            PipelineError::Command(_) => ErrorClassification {
                error_type: "CommandError",
                retryable: true,
            },
            PipelineError::Database(_) => ErrorClassification {
                error_type: "DatabaseError",
                retryable: true,
            },
            PipelineError::Io(_) => ErrorClassification {
                error_type: "IoError",
                retryable: true,
            },

            // Permanent: retrying cannot change the answer
            PipelineError::Config(_) => ErrorClassification {
                error_type: "ConfigError",
                retryable: false,
            },
            PipelineError::Precondition(_) => ErrorClassification {
                error_type: "PreconditionError",
                retryable: false,
            },
            PipelineError::Authentication(_) => ErrorClassification {
                error_type: "AuthenticationError",
                retryable: false,
            },
            PipelineError::Analyzer(_) => ErrorClassification {
                error_type: "AnalyzerError",
                retryable: false,
            },
            PipelineError::Report(_) => ErrorClassification {
                error_type: "ReportError",
                retryable: false,
            },
            PipelineError::Json(_) => ErrorClassification {
                error_type: "JsonError",
                retryable: false,
            },
            PipelineError::Yaml(_) => ErrorClassification {
                error_type: "YamlError",
                retryable: false,
            },
            PipelineError::Internal(_) => ErrorClassification {
                error_type: "InternalError",
                retryable: false,
            },
        }
    }
}
