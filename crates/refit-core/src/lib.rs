//! refit-core: configuration tree and structured logging for refit.
//!
//! The configuration tree is loaded once at startup and passed by reference
//! into every component constructor; there is no ambient global. Every leaf
//! has a default, so an absent key always means "feature off" rather than an
//! error.

pub mod config;
pub mod logging;

pub use config::Config;
pub use logging::{LogFormat, LogLevel, Logger, LoggingConfig};
