use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    ConfigValidation(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport failed before a response was received.
    #[error("network error: {0}")]
    Network(String),

    /// The service responded with a non-success status.
    #[error("server returned {status}: {body}")]
    Remote { status: u16, body: String },

    /// A success response carried a body we could not decode.
    #[error("malformed response: {0}")]
    Decode(String),

    /// A local precondition failed; nothing was sent to the service.
    #[error("{0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, Error>;
