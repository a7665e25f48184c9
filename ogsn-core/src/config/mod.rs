//! Configuration types for the notifier.
//!
//! These are the validated runtime values shared across crates. Loading and
//! parsing the TOML file is handled by the binary.

mod config_store;
mod connection;
mod filter;
mod poll;

pub use config_store::{ConfigStore, ConfigWatcher};
pub use connection::{ConnectionConfig, KeepaliveConfig};
pub use filter::FilterSettings;
pub use poll::PollConfig;
