#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]

pub mod config;
pub mod connection;
pub mod correlator;
pub mod entities;
pub mod events;
pub mod filter;
pub mod keepalive;
pub mod processors;
pub mod store;
pub mod utils;
