//! Error types for dimension domain services.

use thiserror::Error;

/// Result type alias using WmsError.
pub type WmsResult<T> = Result<T, WmsError>;

/// Primary error type for dimension and mapping operations.
#[derive(Debug, Error)]
pub enum WmsError {
    // === Request Errors ===
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    #[error("Layer not found: {0}")]
    LayerNotFound(String),

    // === Domain Errors ===
    #[error("Cannot parse {kind} value '{token}'")]
    Parse { kind: String, token: String },

    #[error("Dimension not found: {0}")]
    DimensionNotFound(String),

    #[error("Cannot sort on {0}")]
    UnsupportedSort(String),

    #[error("Pushback is only allowed once, right after reading an element")]
    PushbackViolation,

    // === Storage Errors ===
    #[error("Backing store error: {0}")]
    Store(String),

    // === Configuration Errors ===
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // === Infrastructure Errors ===
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl WmsError {
    /// Create a Parse error for a raw token of the given kind.
    pub fn parse(kind: impl Into<String>, token: impl Into<String>) -> Self {
        Self::Parse {
            kind: kind.into(),
            token: token.into(),
        }
    }

    /// Create an InvalidParameter error.
    pub fn invalid_parameter(param: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            param: param.into(),
            message: message.into(),
        }
    }

    /// Create a Store error wrapping a backing store failure.
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Get the OGC exception code for this error.
    pub fn wms_exception_code(&self) -> &'static str {
        match self {
            WmsError::MissingParameter(_) => "MissingParameterValue",
            WmsError::InvalidParameter { .. } => "InvalidParameterValue",
            WmsError::LayerNotFound(_) => "LayerNotDefined",
            WmsError::Parse { .. } => "InvalidDimensionValue",
            WmsError::DimensionNotFound(_) => "MissingDimensionValue",
            WmsError::UnsupportedSort(_) => "InvalidParameterValue",
            _ => "NoApplicableCode",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            WmsError::MissingParameter(_)
            | WmsError::InvalidParameter { .. }
            | WmsError::Parse { .. }
            | WmsError::UnsupportedSort(_) => 400,

            WmsError::LayerNotFound(_) | WmsError::DimensionNotFound(_) => 404,

            WmsError::Store(_) => 503,

            _ => 500,
        }
    }
}

// Conversion from common error types
impl From<std::io::Error> for WmsError {
    fn from(err: std::io::Error) -> Self {
        WmsError::Store(err.to_string())
    }
}

impl From<serde_json::Error> for WmsError {
    fn from(err: serde_json::Error) -> Self {
        WmsError::InvalidConfig(format!("JSON error: {}", err))
    }
}
