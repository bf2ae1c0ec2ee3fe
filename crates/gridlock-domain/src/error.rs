//! Error handling types

use std::time::Duration;
use thiserror::Error;

/// Result type alias for operations that can fail
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the gridlock coordination subsystem
///
/// The taxonomy distinguishes recoverable coordination failures (a lock
/// acquisition running out of time) from conditions that must never be
/// downgraded (a distributed backend becoming unreachable). Corrupt cache
/// payloads are deliberately absent here: repositories recover them
/// internally as misses and log instead of surfacing an error.
#[derive(Error, Debug)]
pub enum Error {
    /// Lock acquisition exceeded the caller's wait budget.
    /// Recoverable: the caller decides whether to retry or abort.
    #[error("timeout acquiring lock for '{resource}' (waited {waited:?})")]
    LockTimeout {
        /// The resource that could not be locked
        resource: String,
        /// How long the caller waited before giving up
        waited: Duration,
    },

    /// The distributed lock store is unreachable.
    /// Fatal for the call: never treated as "resource is free".
    #[error("lock backend unavailable: {message}")]
    LockBackendUnavailable {
        /// Description of the backend failure
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The distributed status store is unreachable.
    /// Same treatment as [`Error::LockBackendUnavailable`].
    #[error("status backend unavailable: {message}")]
    StatusBackendUnavailable {
        /// Description of the backend failure
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Serialization or durable write of a cache entry failed.
    /// Propagated after any partial artifact has been cleaned up.
    #[error("cache write failure: {message}")]
    CacheWrite {
        /// Description of the write failure
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration-related error
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the configuration error
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// I/O operation error
    #[error("I/O error: {message}")]
    Io {
        /// Description of the I/O error
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl Error {
    /// Build a [`Error::LockBackendUnavailable`] from a backend error.
    pub fn lock_backend<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::LockBackendUnavailable {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Build a [`Error::StatusBackendUnavailable`] from a backend error.
    pub fn status_backend<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::StatusBackendUnavailable {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Build a [`Error::CacheWrite`] from a backend error.
    pub fn cache_write<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::CacheWrite {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Build a [`Error::Configuration`] without a source.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// Build a [`Error::Io`] from an I/O error.
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}
