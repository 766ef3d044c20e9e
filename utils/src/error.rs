use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Application-wide error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Message(String),

    #[error("{message}: {source}")]
    WithSource {
        message: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Logger(#[from] log::SetLoggerError),

    #[error("Poisoned lock: {0}")]
    Lock(String),
}

impl Error {
    pub fn new(message: impl Into<String>) -> Self {
        Error::Message(message.into())
    }

    /// Wrap a lower level error together with a short description of what failed.
    pub fn with_source(
        message: impl Into<String>, source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Error::WithSource {
            message: message.into(),
            source,
        }
    }
}

impl From<String> for Error {
    fn from(message: String) -> Self {
        Error::Message(message)
    }
}

impl From<&str> for Error {
    fn from(message: &str) -> Self {
        Error::Message(message.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for Error {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Error::Lock(err.to_string())
    }
}
