// codescan-config - effective configuration of a code scanning run
//
// This is the library crate containing the resolution logic and data structures.
// The binary crate (main.rs) provides the command line entry point.

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod settings;

// Re-export commonly used types for convenience
pub use config::ConfigStore;
pub use error::{ConfigError, ErrorKind};
pub use models::{Config, Language, UserConfig};
pub use services::{ConfigInitializer, InitOptions};
pub use settings::RunSettings;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
