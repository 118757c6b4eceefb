//! Wire-level data types for the daemon's REST API.
//!
//! Everything here is deserialized leniently (missing fields default) because
//! the daemon omits fields that do not apply to a given response.

pub mod envelope;
pub mod operation;

pub use envelope::{ResponseEnvelope, ResponseKind};
pub use operation::{Operation, OperationStatus};

use serde::Deserialize;
use std::collections::HashMap;

/// The subset of a container record the client logic consumes: the fields a
/// migration captures from its source.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Container {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub architecture: String,
    #[serde(default)]
    pub config: HashMap<String, String>,
    #[serde(default)]
    pub profiles: Vec<String>,
    #[serde(default)]
    pub ephemeral: bool,
}
