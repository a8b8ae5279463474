use thiserror::Error;

/// Result type for bodypass operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the bodypass transforms
#[derive(Error, Debug)]
pub enum Error {
    #[error("malformed body: {message}")]
    MalformedBody { message: String },

    #[error("transform error: {message}")]
    Transform { message: String },

    #[error("internal error: {message}")]
    Internal { message: String },
}

impl Error {
    /// Create a malformed-body error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedBody { message: message.into() }
    }

    /// Create a transform error
    pub fn transform(message: impl Into<String>) -> Self {
        Self::Transform { message: message.into() }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }
}
