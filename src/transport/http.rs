use super::{HttpResponse, Method, Transport, TransportError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

/// Reqwest-backed [`Transport`].
///
/// LXD daemons commonly present self-signed certificates; the builder exposes
/// `accept_invalid_certs` for that case. Client-certificate authentication is
/// configured on the underlying `reqwest::Client` and is otherwise outside
/// this crate's concern.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(
        api_endpoint: &str,
        timeout: Option<Duration>,
        accept_invalid_certs: bool,
    ) -> Result<Self, TransportError> {
        let base_url = Url::parse(api_endpoint)?;

        let mut builder = reqwest::Client::builder()
            .danger_accept_invalid_certs(accept_invalid_certs)
            .redirect(reqwest::redirect::Policy::limited(5));

        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(TransportError::Http)?;

        Ok(Self { client, base_url })
    }

    fn url_for(&self, path: &str) -> Result<Url, TransportError> {
        // Paths are server-relative ("/1.0/containers"); join against the
        // endpoint host only.
        Ok(self.base_url.join(path)?)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
        query: &[(String, String)],
    ) -> Result<HttpResponse, TransportError> {
        let url = self.url_for(path)?;

        let mut request = match method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
            Method::Put => self.client.put(url),
            Method::Patch => self.client.patch(url),
            Method::Delete => self.client.delete(url),
            Method::Head => self.client.head(url),
        };

        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(TransportError::Http)?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await.map_err(TransportError::Http)?;

        Ok(HttpResponse {
            method,
            url: final_url,
            status,
            body,
            headers,
        })
    }
}
