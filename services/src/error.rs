//! Error type shared by every store operation.

/// Error type for content store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The referenced post, tag, comment or account does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A post title or account name is already taken.
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// The caller lacks the role required for the operation.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Invalid input was provided (empty required field, malformed date).
    #[error("Invalid input: {0}")]
    Validation(String),

    /// A database error occurred; `context` names the step that failed.
    #[error("Storage error while {context}: {source}")]
    Storage {
        context: &'static str,
        #[source]
        source: sqlx::Error,
    },
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists(_))
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }
}

/// Attaches the failing step to a raw `sqlx` error.
pub trait StorageResultExt<T> {
    fn during(self, context: &'static str) -> Result<T, StoreError>;
}

impl<T> StorageResultExt<T> for Result<T, sqlx::Error> {
    fn during(self, context: &'static str) -> Result<T, StoreError> {
        self.map_err(|source| StoreError::Storage { context, source })
    }
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_names_the_step() {
        let result: Result<(), sqlx::Error> = Err(sqlx::Error::RowNotFound);
        let err = result.during("loading post").unwrap_err();

        assert!(err.to_string().contains("loading post"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_error_predicates() {
        assert!(StoreError::NotFound("post 'a'".to_owned()).is_not_found());
        assert!(StoreError::AlreadyExists("post 'a'".to_owned()).is_already_exists());
        assert!(StoreError::Unauthorized("admins only".to_owned()).is_unauthorized());
        assert!(!StoreError::Validation("empty title".to_owned()).is_not_found());
    }

    #[test]
    fn test_row_not_found_is_not_a_constraint_violation() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
        assert!(!is_foreign_key_violation(&sqlx::Error::RowNotFound));
    }
}
