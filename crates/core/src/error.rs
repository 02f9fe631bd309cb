use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(String),

    #[error("Invalid signal bundle: {0}")]
    InvalidBundle(String),

    #[error("{0}")]
    Other(String),
}
