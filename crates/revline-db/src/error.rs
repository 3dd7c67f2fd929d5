use thiserror::Error;

/// Store-level failures. Conflict and not-found classes are separate variants
/// so handlers can map them to specific responses instead of leaking
/// constraint text.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found")]
    NotFound,
    #[error("caller does not own this record")]
    NotOwner,
    #[error("username or email already in use")]
    DuplicateUser,
    #[error("already registered for this event")]
    DuplicateRegistration,
    #[error("you have already reviewed this business")]
    DuplicateReview,
    #[error("already following this user")]
    AlreadyFollowing,
    #[error("not following this user")]
    NotFollowing,
    #[error("cannot follow yourself")]
    SelfFollow,
    #[error("failed to insert {0}")]
    InsertFailed(&'static str),
    #[error("database lock poisoned")]
    LockPoisoned,
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// True when `err` is a UNIQUE/CHECK violation whose message mentions
/// `needle` (a table or column name).
pub(crate) fn is_constraint_violation(err: &rusqlite::Error, needle: &str) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, Some(msg))
            if e.code == rusqlite::ErrorCode::ConstraintViolation && msg.contains(needle)
    )
}

/// True when `err` is a FOREIGN KEY violation, i.e. a referenced row does
/// not exist.
pub(crate) fn is_foreign_key_violation(err: &rusqlite::Error) -> bool {
    is_constraint_violation(err, "FOREIGN KEY")
}
