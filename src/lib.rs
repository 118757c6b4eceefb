//! # lxd-client
//!
//! Async client library for the LXD REST API.
//!
//! ## Overview
//!
//! The daemon executes every mutating call as a server-side operation; this
//! crate builds correctly-shaped requests, classifies failures into typed
//! errors, and resolves operations into synchronous results when asked to.
//! It never schedules work itself — it only observes and waits on operations
//! the server runs.
//!
//! ## Key pieces
//!
//! - **Typed errors**: HTTP status codes — and failure codes nested inside
//!   successful responses — map to [`ApiError`] kinds; invalid option
//!   combinations fail locally before any network call.
//! - **Request shaping**: container creation, copy and migration payloads
//!   are built from allow-list option structs around a tagged
//!   [`source::Source`] union, so provenance fields can never leak across
//!   kinds.
//! - **Operation resolution**: a tri-state [`SyncPolicy`] decides per call
//!   (or client-wide) whether to block on the server's wait endpoint or to
//!   hand back the unresolved [`types::Operation`] handle.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use lxd_client::{CreateOptions, LxdClient, SyncPolicy};
//!
//! #[tokio::main]
//! async fn main() -> lxd_client::Result<()> {
//!     let client = LxdClient::builder()
//!         .api_endpoint("https://127.0.0.1:8443")
//!         .accept_invalid_certs(true)
//!         .build()?;
//!
//!     let opts = CreateOptions {
//!         alias: Some("ubuntu/22.04".to_string()),
//!         ..CreateOptions::default()
//!     };
//!     let outcome = client
//!         .create_container("test", &opts, SyncPolicy::Inherit, None)
//!         .await?;
//!     println!("created: {}", outcome.is_completed());
//!     Ok(())
//! }
//! ```
//!
//! ## Module organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Client, builder, container and operation calls |
//! | [`source`] | Request shaping and validation for composite resources |
//! | [`classify`] | HTTP response to typed-error classification |
//! | [`types`] | Wire-level data types (envelope, operation) |
//! | [`transport`] | Transport facade and the reqwest implementation |
//!
//! ## Concurrency
//!
//! The client is stateless per call; share one instance across tasks for
//! calls against distinct operations. The only blocking point is the
//! synchronous wait path, which suspends the calling task until the server
//! reports a terminal state. Cancellation is cooperative: another caller may
//! cancel an operation while a wait is outstanding.

pub mod classify;
pub mod client;
pub mod source;
pub mod transport;
pub mod types;

/// Error types for the library.
pub mod error;

pub use client::{ClientConfig, LxdClient, LxdClientBuilder, OperationOutcome, SyncPolicy};
pub use error::{ApiError, ApiErrorKind, Error, FieldError};
pub use source::{
    AliasOptions, CopyOptions, CreateOptions, MigrateOptions, MigrationSource, Source,
};
pub use types::{Container, Operation, OperationStatus};

/// Result type alias for the library.
pub type Result<T> = std::result::Result<T, Error>;
