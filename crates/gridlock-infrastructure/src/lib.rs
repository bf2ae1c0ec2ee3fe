//! Infrastructure Layer
//!
//! Wires the subsystem together: typed configuration with layered loading
//! (defaults, TOML file, environment), the tracing bootstrap, and the
//! backend factory that turns a validated configuration into working lock,
//! cache and status handles. Backend topology is decided here once, at
//! construction; call sites never branch on it.

pub mod config;
pub mod factory;
pub mod logging;

pub use config::loader::ConfigLoader;
pub use config::types::{
    AppConfig, CoordinationConfig, LocalBackendConfig, LoggingConfig, RedisBackendConfig,
};
pub use factory::{BackendFactory, CoordinationHandles};
