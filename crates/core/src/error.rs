use thiserror::Error;

#[derive(Error, Debug)]
pub enum NoaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(String),

    #[error("Invalid chunk options: {0}")]
    InvalidOptions(String),

    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for NoaError {
    fn from(e: serde_json::Error) -> Self {
        NoaError::Serialize(e.to_string())
    }
}
