use serde::Deserialize;
use std::collections::HashMap;

/// Lifecycle state of a server-side operation.
///
/// Mirrors the daemon's numeric status codes. `Success`, `Failure` and
/// `Cancelled` are terminal; the daemon permits no transition out of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationStatus {
    Pending,
    Running,
    Success,
    Failure,
    Cancelled,
}

impl OperationStatus {
    /// Map a daemon status code to a state.
    ///
    /// Unrecognized 1xx codes read as `Running` so intermediate states added
    /// server-side stay non-terminal. Codes outside the operation range map
    /// to `None`.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            105 => Some(Self::Pending),
            103 => Some(Self::Running),
            100..=199 => Some(Self::Running),
            200 => Some(Self::Success),
            400 => Some(Self::Failure),
            401 => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            Self::Pending => 105,
            Self::Running => 103,
            Self::Success => 200,
            Self::Failure => 400,
            Self::Cancelled => 401,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failure | Self::Cancelled)
    }
}

/// A server-tracked handle for an asynchronous unit of work.
///
/// The client never constructs one; it only observes operations the daemon
/// created in response to a mutating call.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Operation {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub status_code: i64,
    /// Resource URLs touched by the operation, keyed by resource type.
    #[serde(default)]
    pub resources: Option<HashMap<String, Vec<String>>>,
    /// Operation-specific payload (e.g., migration websocket secrets).
    #[serde(default)]
    pub metadata: serde_json::Value,
    #[serde(default)]
    pub may_cancel: bool,
    /// Failure reason; empty unless the operation failed.
    #[serde(default)]
    pub err: String,
}

impl Operation {
    /// Enumerated state, if the status code is in the operation range.
    pub fn state(&self) -> Option<OperationStatus> {
        OperationStatus::from_code(self.status_code)
    }

    pub fn is_terminal(&self) -> bool {
        self.state().map(OperationStatus::is_terminal).unwrap_or(false)
    }

    pub fn succeeded(&self) -> bool {
        self.state() == Some(OperationStatus::Success)
    }
}
