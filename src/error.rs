//! Crate-wide error taxonomy.

use thiserror::Error;

use crate::db::DbError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("device not found: {0}")]
    DeviceNotFound(String),

    #[error("page {page} out of range (total pages: {total_pages})")]
    PageOutOfRange { page: u32, total_pages: u32 },

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("invalid or missing API key")]
    Unauthorized,
}

impl From<DbError> for Error {
    fn from(e: DbError) -> Self {
        Error::StoreUnavailable(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
