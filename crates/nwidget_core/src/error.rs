//! Error types for nwidget_core

use thiserror::Error;

use crate::object::ObjectId;

/// Errors from fallible object lookups
///
/// Binding and evaluation have no recoverable failures; these only come from
/// checked accessors such as [`crate::Obj::try_with`] and
/// [`crate::Runtime::handle`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The object was destroyed (or never existed in this runtime)
    #[error("object {0:?} has been destroyed")]
    ObjectDestroyed(ObjectId),

    /// The object exists but holds a different state type
    #[error("object {id:?} is not a `{expected}`")]
    TypeMismatch { id: ObjectId, expected: &'static str },

    /// The runtime that owned the object is gone
    #[error("runtime has been dropped")]
    RuntimeDropped,
}

/// Result type for nwidget_core operations
pub type Result<T> = std::result::Result<T, Error>;
