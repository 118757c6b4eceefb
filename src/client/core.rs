use crate::classify::classify;
use crate::client::builder::{ClientConfig, LxdClientBuilder};
use crate::transport::{Method, Transport};
use crate::types::{Container, ResponseEnvelope};
use crate::{Error, Result};
use std::sync::Arc;
use tracing::{debug, info};

/// Client for the daemon's REST API.
///
/// Stateless per call: a single instance may be shared across tasks issuing
/// calls against distinct operations. All mutable state lives server-side.
pub struct LxdClient {
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) config: ClientConfig,
}

impl LxdClient {
    /// Create a client against the default local endpoint.
    pub fn new() -> Result<Self> {
        LxdClientBuilder::new().build()
    }

    pub fn builder() -> LxdClientBuilder {
        LxdClientBuilder::new()
    }

    pub(crate) fn from_parts(transport: Arc<dyn Transport>, config: ClientConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Dispatch a request and interpret the response: classification first,
    /// then envelope decoding. Every API call funnels through here, so the
    /// classifier sees initial responses and operation polls alike.
    pub(crate) async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
        query: &[(String, String)],
    ) -> Result<ResponseEnvelope> {
        debug!(method = %method, path, "dispatching request");
        let response = self.transport.send(method, path, body, query).await?;

        if let Some(err) = classify(&response) {
            info!(
                method = %method,
                path,
                status = err.status,
                kind = ?err.kind,
                "request failed"
            );
            return Err(err.into());
        }

        if response.body.is_empty() {
            return Ok(ResponseEnvelope::default());
        }
        Ok(response.json()?)
    }

    pub(crate) async fn get(&self, path: &str) -> Result<ResponseEnvelope> {
        self.request(Method::Get, path, None, &[]).await
    }

    pub(crate) async fn post(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<ResponseEnvelope> {
        self.request(Method::Post, path, Some(body), &[]).await
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<ResponseEnvelope> {
        self.request(Method::Delete, path, None, &[]).await
    }

    /// Fetch a container record.
    pub async fn container(&self, name: &str) -> Result<Container> {
        let envelope = self.get(&format!("/1.0/containers/{name}")).await?;
        Ok(envelope.metadata_as()?)
    }

    /// Names of the profiles defined on this server.
    ///
    /// The API returns profile URLs ("/1.0/profiles/default"); this strips
    /// them down to names.
    pub async fn profile_names(&self) -> Result<Vec<String>> {
        let envelope = self.get("/1.0/profiles").await?;
        let urls: Vec<String> = envelope.metadata_as()?;
        Ok(urls
            .iter()
            .map(|url| url.rsplit('/').next().unwrap_or(url.as_str()).to_string())
            .collect())
    }

    /// The server's public certificate, used as the source certificate when
    /// capturing a migration.
    pub(crate) async fn server_certificate(&self) -> Result<Option<String>> {
        let envelope = self.get("/1.0").await?;
        Ok(envelope
            .metadata
            .pointer("/environment/certificate")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string))
    }

    pub(crate) fn expect_async(&self, envelope: &ResponseEnvelope) -> Result<String> {
        match envelope.operation_id() {
            Some(id) => Ok(id.to_string()),
            None => Err(Error::UnexpectedResponse(
                "expected a background operation but the response named none".to_string(),
            )),
        }
    }
}
