use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Scene error: {0}")]
    Scene(String),

    #[error("Widget not found: {0}")]
    UnknownWidget(String),

    #[error("Program error: {0}")]
    Program(String),
}

pub type Result<T> = std::result::Result<T, Error>;
