use thiserror::Error;

/// Error taxonomy of the storage engine.
///
/// Routine "no such row" / "zero rows affected" conditions are not errors;
/// they surface as `Ok(false)` or a default-valued entity. Only violated
/// preconditions and genuine database transport failures reach this type.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The caller built a request that can never succeed, e.g. attaching a
    /// note to an unpersisted work item. The payload names the offending
    /// field.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("postgres error: {0}")]
    Postgres(#[from] postgres::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StorageError>;
