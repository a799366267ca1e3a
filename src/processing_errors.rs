use actix_web::http::StatusCode;
use derive_more::Display;

/// Failures raised by the generation pipeline: optimizer, external API
/// client and asset storage. The `Display` text is what gets recorded in the
/// history row, so upstream messages are kept verbatim.
#[derive(Debug, Display, Clone, PartialEq)]
pub enum ProcessingError {
    #[display("Source image not found")]
    SourceNotFound,

    #[display("Invalid image: {_0}")]
    InvalidImage(String),

    #[display("Unsupported image format: {_0}")]
    UnsupportedFormat(String),

    #[display("Could not decode image: {_0}")]
    DecodeError(String),

    #[display("Not enough memory to process a {width}x{height} image ({required} bytes required)")]
    InsufficientMemory { width: u32, height: u32, required: u64 },

    #[display("Directory is not writable: {_0}")]
    DirectoryNotWritable(String),

    #[display("Image generation API key is not configured")]
    ApiNotConfigured,

    #[display("Connection error: {_0}")]
    ConnectionError(String),

    #[display("{message}")]
    ApiError { code: u16, message: String },

    #[display("Invalid response from image generation API")]
    InvalidResponse,

    #[display("Generated image payload is not valid base64")]
    InvalidBase64,

    #[display("Failed to store generated image: {_0}")]
    StorageWriteError(String),
}

impl ProcessingError {
    pub fn kind(&self) -> &'static str {
        match self {
            ProcessingError::SourceNotFound => "source_not_found",
            ProcessingError::InvalidImage(_) => "invalid_image",
            ProcessingError::UnsupportedFormat(_) => "unsupported_format",
            ProcessingError::DecodeError(_) => "decode_error",
            ProcessingError::InsufficientMemory { .. } => "insufficient_memory",
            ProcessingError::DirectoryNotWritable(_) => "directory_not_writable",
            ProcessingError::ApiNotConfigured => "api_not_configured",
            ProcessingError::ConnectionError(_) => "connection_error",
            ProcessingError::ApiError { .. } => "api_error",
            ProcessingError::InvalidResponse => "invalid_response",
            ProcessingError::InvalidBase64 => "invalid_base64",
            ProcessingError::StorageWriteError(_) => "storage_write_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ProcessingError::SourceNotFound => StatusCode::NOT_FOUND,
            ProcessingError::InvalidImage(_) => StatusCode::BAD_REQUEST,
            ProcessingError::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ProcessingError::DecodeError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ProcessingError::InsufficientMemory { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ProcessingError::DirectoryNotWritable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ProcessingError::ApiNotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            ProcessingError::ConnectionError(_)
            | ProcessingError::ApiError { .. }
            | ProcessingError::InvalidResponse
            | ProcessingError::InvalidBase64 => StatusCode::BAD_GATEWAY,
            ProcessingError::StorageWriteError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
