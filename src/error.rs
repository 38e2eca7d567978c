//! Error types for UltraSentry

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// UltraSentry error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Radio subsystem failed to initialize (fatal at startup)
    #[error("Radio initialization failed: {0}")]
    RadioInit(String),

    /// Peer registration failed for a reason other than "already known"
    #[error("Peer registration failed: {0}")]
    PeerRegistration(String),

    /// Inbound datagram shorter than the fixed record size
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// Configuration file could not be read or parsed
    #[error("Config error: {0}")]
    Config(String),

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(e: toml::ser::Error) -> Self {
        Error::Config(e.to_string())
    }
}
