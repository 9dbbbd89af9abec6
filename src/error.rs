use thiserror::Error;

#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Unexpected response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("No client record to report on")]
    MissingSubject,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why an image could not be embedded. Never fatal: the slot gets a placeholder.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ImageUnavailable {
    #[error("request failed: {0}")]
    Network(String),

    #[error("server answered {0}")]
    Status(u16),

    #[error("timed out")]
    Timeout,

    #[error("could not decode image: {0}")]
    Decode(String),
}
