// Application error type and result alias, built on thiserror.
use thiserror::Error;

use crate::models::Role;

pub mod feed;
pub mod response;

pub use feed::{FeedError, FeedResult};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("This login requires role \"{expected}\", account is \"{actual}\"")]
    WrongRole { expected: Role, actual: Role },

    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("An account with email {0} already exists")]
    DuplicateEmail(String),

    #[error("Slot {0} not found")]
    SlotNotFound(String),

    #[error("Slot {0} is not free")]
    SlotUnavailable(String),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Password hashing error: {0}")]
    Hashing(#[from] bcrypt::BcryptError),

    #[error("Storage error: {0}")]
    Storage(String),
}

pub type AppResult<T> = Result<T, AppError>;
