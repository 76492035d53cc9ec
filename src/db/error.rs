use thiserror::Error;

/// Errors surfaced by the persistence layer.
///
/// The variants follow the three failure classes the storage operations can
/// actually hit: rejected input at the insertion boundary, a delete that
/// touched no rows, and SQLite itself failing. Callers in the UI map each to
/// a footer message; nothing here is fatal.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A required text field was empty after trimming. Raised before any
    /// statement executes, so a rejected insert mutates nothing.
    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },

    /// A delete by id affected zero rows.
    #[error("no blog entry with id {id}")]
    NotFound { id: i64 },

    /// Passthrough for SQLite failures.
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_field() {
        let err = StoreError::EmptyField { field: "name" };
        assert_eq!(err.to_string(), "name must not be empty");
    }

    #[test]
    fn not_found_carries_the_id() {
        let err = StoreError::NotFound { id: 42 };
        assert!(err.to_string().contains("42"));
    }
}
