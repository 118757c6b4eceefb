use crate::client::core::LxdClient;
use crate::transport::{HttpTransport, Transport};
use crate::Result;
use std::sync::Arc;
use std::time::Duration;

/// Client configuration, passed explicitly at construction.
///
/// Defaults come from the pure [`ClientConfig::default`]; there is no
/// process-wide mutable default state.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the daemon's API endpoint.
    pub api_endpoint: String,
    /// Client-wide sync default: whether calls block for operation
    /// completion when the per-call policy is `Inherit`.
    pub auto_sync: bool,
    /// Request timeout for the built-in transport.
    pub timeout: Option<Duration>,
    /// Accept self-signed daemon certificates.
    pub accept_invalid_certs: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_endpoint: "https://127.0.0.1:8443".to_string(),
            auto_sync: true,
            timeout: None,
            accept_invalid_certs: false,
        }
    }
}

/// Builder for creating clients with custom configuration.
///
/// Keep this surface area small and predictable.
pub struct LxdClientBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
}

impl LxdClientBuilder {
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
            transport: None,
        }
    }

    /// Set the daemon API endpoint (e.g., `https://lxd.example:8443`).
    pub fn api_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.api_endpoint = endpoint.into();
        self
    }

    /// Set the client-wide sync default. When `true` (the default), calls
    /// that start a server-side operation block until it completes unless
    /// overridden per call.
    pub fn auto_sync(mut self, enable: bool) -> Self {
        self.config.auto_sync = enable;
        self
    }

    /// Request timeout for the built-in HTTP transport.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    /// Accept the daemon's self-signed certificate.
    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.config.accept_invalid_certs = accept;
        self
    }

    /// Inject a custom transport. Primarily for tests; production clients
    /// use the built-in reqwest transport.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<LxdClient> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(
                &self.config.api_endpoint,
                self.config.timeout,
                self.config.accept_invalid_certs,
            )?),
        };

        Ok(LxdClient::from_parts(transport, self.config))
    }
}

impl Default for LxdClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
