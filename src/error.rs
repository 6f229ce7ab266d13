use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    /// An external command ran in raising mode and exited nonzero.
    #[error("failed to run command `{command}`, exit code: {exit_code}")]
    CommandFailed { command: String, exit_code: i32 },

    #[error("failed to start command `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Usage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for gadget operations
pub type Result<T> = std::result::Result<T, AppError>;
