//! Resolution of server-side operations.
//!
//! Mutating calls return an operation handle; depending on the effective
//! sync policy the client either hands that handle back unresolved or blocks
//! on the server's wait endpoint until the operation reaches a terminal
//! state. Terminal failures surface as classified errors, never as a
//! normally-returned handle the caller would have to inspect.

use crate::client::core::LxdClient;
use crate::transport::Method;
use crate::types::{Operation, ResponseEnvelope};
use crate::Result;

/// Per-call sync policy. `Inherit` (the default) follows the client-wide
/// `auto_sync` setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncPolicy {
    #[default]
    Inherit,
    /// Block until the operation reaches a terminal state.
    Sync,
    /// Return the unresolved handle immediately.
    Async,
}

/// Result of resolving an operation.
#[derive(Debug, Clone)]
pub enum OperationOutcome {
    /// The operation reached terminal success; the payload is in
    /// `Operation::metadata`.
    Completed(Operation),
    /// The request was accepted and the handle returned unresolved; the
    /// caller polls, waits or cancels it.
    Accepted(Operation),
}

impl OperationOutcome {
    pub fn operation(&self) -> &Operation {
        match self {
            OperationOutcome::Completed(op) | OperationOutcome::Accepted(op) => op,
        }
    }

    pub fn into_operation(self) -> Operation {
        match self {
            OperationOutcome::Completed(op) | OperationOutcome::Accepted(op) => op,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, OperationOutcome::Completed(_))
    }
}

impl LxdClient {
    /// Effective sync for a call: the per-call policy unless it inherits.
    pub fn effective_sync(&self, policy: SyncPolicy) -> bool {
        match policy {
            SyncPolicy::Sync => true,
            SyncPolicy::Async => false,
            SyncPolicy::Inherit => self.config.auto_sync,
        }
    }

    /// Fetch the current state of an operation.
    pub async fn get_operation(&self, id: &str) -> Result<Operation> {
        let envelope = self.get(&format!("/1.0/operations/{id}")).await?;
        Ok(envelope.metadata_as()?)
    }

    /// Block until the operation reaches a terminal state.
    ///
    /// `timeout` is in seconds and is forwarded to the server, which owns
    /// enforcement of the bound; non-positive or absent means wait
    /// indefinitely. A failed or cancelled operation comes back as a
    /// classified error.
    pub async fn wait_operation(&self, id: &str, timeout: Option<i64>) -> Result<Operation> {
        let query: Vec<(String, String)> = timeout
            .filter(|t| *t > 0)
            .map(|t| vec![("timeout".to_string(), t.to_string())])
            .unwrap_or_default();

        let envelope = self
            .request(
                Method::Get,
                &format!("/1.0/operations/{id}/wait"),
                None,
                &query,
            )
            .await?;
        Ok(envelope.metadata_as()?)
    }

    /// Request cancellation of an operation. Best-effort: the daemon may
    /// refuse when the operation is not cancellable.
    pub async fn cancel_operation(&self, id: &str) -> Result<()> {
        self.delete(&format!("/1.0/operations/{id}")).await?;
        Ok(())
    }

    /// Resolve the operation named by an async response envelope.
    ///
    /// With effective sync off this never blocks and returns
    /// [`OperationOutcome::Accepted`] with the non-terminal handle. With it
    /// on, it waits and returns [`OperationOutcome::Completed`] on terminal
    /// success; terminal failure propagates as the classified error raised
    /// by the wait response. A bounded wait the server cuts short before a
    /// terminal state comes back as `Accepted`, never as `Completed`.
    pub(crate) async fn resolve(
        &self,
        envelope: ResponseEnvelope,
        policy: SyncPolicy,
        timeout: Option<i64>,
    ) -> Result<OperationOutcome> {
        let operation: Operation = envelope.metadata_as()?;

        if !self.effective_sync(policy) {
            return Ok(OperationOutcome::Accepted(operation));
        }

        let id = if operation.id.is_empty() {
            self.expect_async(&envelope)?
        } else {
            operation.id.clone()
        };

        let finished = self.wait_operation(&id, timeout).await?;
        if !finished.is_terminal() {
            // The server owns the timeout bound and may return before the
            // operation finishes; an unfinished handle is still unresolved.
            return Ok(OperationOutcome::Accepted(finished));
        }
        Ok(OperationOutcome::Completed(finished))
    }
}
