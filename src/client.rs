//! Client interface for the daemon's REST API.
//!
//! The public surface is deliberately small: a builder, the client, and the
//! container/operation calls. Implementation details are split into
//! submodules under `src/client/`.

pub mod builder;
pub mod containers;
pub mod core;
pub mod operations;

pub use builder::{ClientConfig, LxdClientBuilder};
pub use core::LxdClient;
pub use operations::{OperationOutcome, SyncPolicy};
