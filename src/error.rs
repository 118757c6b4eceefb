use crate::transport::TransportError;
use thiserror::Error;

/// One entry of a server-supplied field-error list.
///
/// The daemon attaches these to validation failures so callers can handle
/// individual fields programmatically instead of parsing the message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldError {
    /// Resource the error applies to (e.g., "container").
    pub resource: Option<String>,
    /// Field within the resource (e.g., "source.alias").
    pub field: Option<String>,
    /// Machine-readable code (e.g., "missing", "invalid").
    pub code: Option<String>,
    /// Free-form message for this field.
    pub message: Option<String>,
}

/// Typed classification of a failed API response.
///
/// `ClientError` and `ServerError` are the generic buckets for 4xx/5xx codes
/// that have no dedicated variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    MethodNotAllowed,
    NotAcceptable,
    Conflict,
    UnsupportedMediaType,
    UnprocessableEntity,
    ClientError,
    InternalServerError,
    NotImplemented,
    BadGateway,
    ServiceUnavailable,
    ServerError,
}

impl ApiErrorKind {
    /// Map an HTTP (or operation) status code to an error kind.
    ///
    /// Returns `None` for codes outside the error ranges; unknown 4xx/5xx
    /// codes fall back to the generic `ClientError`/`ServerError` buckets.
    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            400 => Some(Self::BadRequest),
            401 => Some(Self::Unauthorized),
            403 => Some(Self::Forbidden),
            404 => Some(Self::NotFound),
            405 => Some(Self::MethodNotAllowed),
            406 => Some(Self::NotAcceptable),
            409 => Some(Self::Conflict),
            415 => Some(Self::UnsupportedMediaType),
            422 => Some(Self::UnprocessableEntity),
            400..=499 => Some(Self::ClientError),
            500 => Some(Self::InternalServerError),
            501 => Some(Self::NotImplemented),
            502 => Some(Self::BadGateway),
            503 => Some(Self::ServiceUnavailable),
            500..=599 => Some(Self::ServerError),
            _ => None,
        }
    }

    pub fn is_client_error(self) -> bool {
        matches!(
            self,
            Self::BadRequest
                | Self::Unauthorized
                | Self::Forbidden
                | Self::NotFound
                | Self::MethodNotAllowed
                | Self::NotAcceptable
                | Self::Conflict
                | Self::UnsupportedMediaType
                | Self::UnprocessableEntity
                | Self::ClientError
        )
    }

    pub fn is_server_error(self) -> bool {
        !self.is_client_error()
    }
}

/// A classified API failure.
///
/// Immutable after construction; carries the original body alongside the
/// assembled message so callers can inspect the raw response when needed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApiError {
    pub kind: ApiErrorKind,
    /// Effective status: the nested operation status code when present,
    /// otherwise the transport status.
    pub status: u16,
    /// Human-readable message assembled from the response.
    pub message: String,
    /// Raw response body as received.
    pub body: String,
    /// Server-supplied documentation link, when present.
    pub documentation_url: Option<String>,
    /// Structured field-level errors, when present.
    pub errors: Vec<FieldError>,
}

/// Unified error type for the client.
#[derive(Debug, Error)]
pub enum Error {
    /// The server rejected or failed a request (4xx/5xx, or a failed
    /// operation reported inside a 200 body).
    #[error(transparent)]
    Api(#[from] ApiError),

    /// No image alias, fingerprint, or properties were given and the request
    /// was not marked `empty`.
    #[error("container creation requires an image alias, fingerprint, or properties, or `empty: true`")]
    ImageIdentifierRequired,

    /// Image-provenance options were supplied in a context where they are
    /// not valid (empty creation, or remote-only options without a server).
    #[error("invalid image attributes: {0}")]
    InvalidImageAttributes(String),

    /// The image transfer protocol is not one the daemon understands.
    #[error("invalid image transfer protocol {0:?}: expected \"lxd\" or \"simplestreams\"")]
    InvalidProtocol(String),

    /// The migration target is missing profiles the source container uses.
    #[error("target server is missing profiles: {}", .0.join(", "))]
    MissingProfiles(Vec<String>),

    /// An image alias needs both a name and a target fingerprint.
    #[error("image alias requires both a name and a target fingerprint")]
    AliasAttributesRequired,

    /// The server returned a well-formed response that does not fit the
    /// expected shape (e.g., an async envelope without an operation id).
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// The classified API error, if this is one.
    pub fn api(&self) -> Option<&ApiError> {
        match self {
            Error::Api(err) => Some(err),
            _ => None,
        }
    }
}
