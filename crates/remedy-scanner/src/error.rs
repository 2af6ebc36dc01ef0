use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("State store error: {0}")]
    Store(String),
}

pub type Result<T> = std::result::Result<T, ScanError>;
