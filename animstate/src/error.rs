use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown animation: {name}")]
    UnknownAnimation { name: String },

    #[error("invalid animation index: {index}")]
    InvalidAnimationIndex { index: usize },

    #[error("invalid value: {message}")]
    InvalidValue { message: String },
}
