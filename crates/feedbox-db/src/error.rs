use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique index rejected the write. Callers translate this into
    /// find-or-create success or an already-subscribed signal; it must
    /// never surface as a raw server error.
    #[error("unique constraint violated on {0}")]
    Conflict(&'static str),

    #[error("database lock poisoned")]
    LockPoisoned,

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

/// True when a race or repeat was caught by one of the schema's unique
/// indexes. SQLite reports a text PRIMARY KEY collision as
/// SQLITE_CONSTRAINT_PRIMARYKEY rather than SQLITE_CONSTRAINT_UNIQUE, so
/// both extended codes count.
pub fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}
