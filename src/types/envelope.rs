use serde::Deserialize;

/// Background-operation marker in the response envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKind {
    #[default]
    Sync,
    Async,
    Error,
}

/// The envelope every API body is wrapped in.
///
/// For `sync` responses `metadata` holds the result directly; for `async`
/// responses it holds the freshly created [`Operation`](super::Operation) and
/// `operation` holds its URL.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ResponseEnvelope {
    #[serde(rename = "type", default)]
    pub kind: ResponseKind,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub status_code: i64,
    #[serde(default)]
    pub operation: String,
    #[serde(default)]
    pub error_code: i64,
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl ResponseEnvelope {
    /// Decode `metadata` into a concrete type.
    pub fn metadata_as<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.metadata.clone())
    }

    /// Identifier of the operation this envelope refers to, extracted from
    /// the `operation` URL ("/1.0/operations/{id}").
    pub fn operation_id(&self) -> Option<&str> {
        let id = self.operation.rsplit('/').next()?;
        if id.is_empty() {
            None
        } else {
            Some(id)
        }
    }
}
