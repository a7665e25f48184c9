//! Wire objects, socket framing and REST client for the OGS game notifier.

pub mod codec;
pub mod objects;
pub mod rank;

#[cfg(feature = "client")]
pub mod client;
