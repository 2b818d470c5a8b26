//! Infrastructure - configuration
//!
//! - `config` - Application configuration (TOML loading, defaults, validation)

pub mod config;

// Re-export commonly used types
pub use config::{Config, Credentials, SiteConfig};
