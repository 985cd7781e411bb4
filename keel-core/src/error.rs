use crate::Error;
use std::fmt::{self, Display};

/// Data conditions reported by collection operations.
///
/// They travel inside [`Error`] and can be recovered with
/// `error.downcast_ref::<DbError>()`, or the [`is_not_found`] and
/// [`is_concurrent_transaction`] shortcuts.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbError {
    /// No row matched a `get` or `first`.
    #[error("database: no such entity")]
    NotFound,
    /// An update found the row at a different revision than the instance expected.
    #[error("database: concurrent transaction")]
    ConcurrentTransaction,
}

pub fn is_not_found(error: &Error) -> bool {
    matches!(error.downcast_ref::<DbError>(), Some(DbError::NotFound))
}

pub fn is_concurrent_transaction(error: &Error) -> bool {
    matches!(
        error.downcast_ref::<DbError>(),
        Some(DbError::ConcurrentTransaction)
    )
}

/// Positional errors of a batch lookup, one slot per requested key.
#[derive(Debug, Default)]
pub struct MultiError {
    pub errors: Vec<Option<Error>>,
}

impl MultiError {
    pub fn new(errors: Vec<Option<Error>>) -> Self {
        Self { errors }
    }

    pub fn has_error(&self) -> bool {
        self.errors.iter().any(Option::is_some)
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Error> {
        self.errors.get(index).and_then(Option::as_ref)
    }
}

impl Display for MultiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            match error {
                Some(e) => write!(f, "{e}")?,
                None => f.write_str("<nil>")?,
            }
        }
        Ok(())
    }
}

impl std::error::Error for MultiError {}
