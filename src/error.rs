use std::io;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PhraseError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Dictionary cannot produce any phrase of positive cost")]
    NoViableWords,

    #[error("Failed to read dictionary: {0}")]
    Dictionary(#[source] io::Error),

    #[error("Entropy source failed: {0}")]
    EntropySource(#[source] io::Error),

    #[error("Entropy source did not deliver within {0:?}")]
    EntropyTimeout(Duration),

    #[error("Cannot sample from an empty range")]
    EmptyRange,

    #[error("Index is outside the selection window")]
    IndexOutOfRange,
}

pub type Result<T> = std::result::Result<T, PhraseError>;
