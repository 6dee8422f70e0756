use thiserror::Error;

/// Message fragment the provider uses when the selected key no longer resolves.
pub const ENTITY_NOT_FOUND_MESSAGE: &str = "Requested entity was not found";

#[derive(Error, Debug)]
pub enum StatementExtractorError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("{message}")]
    Provider {
        /// HTTP status returned by the provider, if the request got that far
        status: Option<u16>,
        /// Provider status code such as `NOT_FOUND` or `INVALID_ARGUMENT`
        code: Option<String>,
        message: String,
    },

    #[error("No response from AI")]
    EmptyResponse,

    #[error("The AI response could not be read as financial statements ({0}). Please try again with a different document.")]
    MalformedResponse(String),

    #[error("Please select a file first.")]
    NoFileSelected,

    #[error("Unsupported document type '{0}': expected a PDF or an image")]
    UnsupportedDocument(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl StatementExtractorError {
    /// True when the provider signals that the selected key is no longer usable
    /// and the user has to pick one again.
    pub fn is_credential_invalidation(&self) -> bool {
        match self {
            Self::Provider { code, message, .. } => {
                code.as_deref() == Some("NOT_FOUND") || message.contains(ENTITY_NOT_FOUND_MESSAGE)
            }
            _ => false,
        }
    }

    /// Errors raised by the transport or the provider service.
    pub fn is_provider_error(&self) -> bool {
        matches!(self, Self::Provider { .. })
    }
}

pub type Result<T> = std::result::Result<T, StatementExtractorError>;
