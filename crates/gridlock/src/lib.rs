//! # Gridlock
//!
//! Lock coordination and atomic cache repository for energy-device
//! collection loops that run as threads in one process or as separate
//! processes across hosts.
//!
//! Three ports cover the coordination surface: [`LockManager`] for mutual
//! exclusion with scoped release, [`SharedCache`] for atomic typed cache
//! access, and [`StatusManager`] for ephemeral operation flags. Backends
//! come in matching local and Redis flavours; the
//! [`infrastructure::BackendFactory`] picks one from configuration at
//! construction time, so call sites never branch on deployment topology.
//!
//! ## Example
//!
//! ```no_run
//! use gridlock::LockManager;
//! use gridlock::infrastructure::{BackendFactory, ConfigLoader};
//! use std::time::Duration;
//!
//! # fn main() -> gridlock::Result<()> {
//! let config = ConfigLoader::new().load()?;
//! let handles = BackendFactory::new().build(&config)?;
//!
//! let lease = handles
//!     .lock_manager
//!     .acquire("inverter_read", Some(Duration::from_secs(5)))?;
//! handles.cache.set("regCache_1", &vec![0u32; 5], None)?;
//! lease.release()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - `domain` - port traits, lock lease, error taxonomy, key helpers
//! - `application` - reading history and last-update use cases
//! - `providers` - thread/file local backends, Redis distributed backends
//! - `infrastructure` - configuration, logging bootstrap, backend factory

/// Domain layer - ports, lease types and error taxonomy
pub mod domain {
    pub use gridlock_domain::*;
}

/// Application layer - cache-backed use cases
pub mod application {
    pub use gridlock_application::*;
}

/// Provider layer - backend implementations
pub mod providers {
    pub use gridlock_providers::*;
}

/// Infrastructure layer - configuration, logging and wiring
pub mod infrastructure {
    pub use gridlock_infrastructure::*;
}

// Re-export the commonly used domain types at the crate root
pub use domain::{
    CacheRepository, Error, LockLease, LockManager, Result, SharedCache, StatusManager,
};

// Re-export the use cases at the crate root
pub use application::{LastUpdateTracker, ReadingHistory};
