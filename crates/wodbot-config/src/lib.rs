//! Environment-sourced configuration.
//!
//! Settings are read once at process start into an explicit struct and
//! passed by reference into every component; validation is a pure function
//! over that struct.

mod error;
mod settings;

pub use error::ConfigError;
pub use settings::{PushoverKeys, Settings, Timeouts, WODIFY_URL};
