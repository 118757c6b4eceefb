//! HTTP response classification.
//!
//! Pure logic: a response envelope goes in, a typed [`ApiError`] (or nothing)
//! comes out. Three passes run in order:
//!
//! 1. direct status mapping for 4xx/5xx codes;
//! 2. body sniffing for status 500, which the daemon uses for distinct
//!    failure causes ("no such file or directory" is really a 404, "is a
//!    directory" a 400);
//! 3. nested async-operation failure detection: a 200 whose body carries
//!    `metadata.status_code` in the error range means the request was
//!    accepted but the operation itself failed.
//!
//! Pass 3 makes the classifier the single interpretation point for both the
//! initial response and later polls of an operation's terminal state.

use crate::error::{ApiError, ApiErrorKind, FieldError};
use crate::transport::HttpResponse;
use serde_json::Value;

/// Classify a response, returning an error for failed requests and failed
/// operations reported inside successful requests. `None` means the response
/// carries no error.
pub fn classify(response: &HttpResponse) -> Option<ApiError> {
    let body: Option<Value> = if declares_json(response) {
        serde_json::from_slice(&response.body).ok()
    } else {
        None
    };

    // 3xx responses never classify, with or without operation metadata.
    if !(200..300).contains(&response.status) && !(400..600).contains(&response.status) {
        return None;
    }

    // The nested operation status code takes precedence over the transport
    // status: an accepted request whose operation failed is still a failure.
    let effective_status = nested_status(body.as_ref())
        .filter(|code| (400..600).contains(code))
        .unwrap_or(response.status);

    let kind = if effective_status == 500 {
        sniff_500(&response.text())
    } else {
        ApiErrorKind::from_status(effective_status)?
    };

    Some(build_error(response, body.as_ref(), kind, effective_status))
}

fn nested_status(body: Option<&Value>) -> Option<u16> {
    let code = body?.pointer("/metadata/status_code")?.as_i64()?;
    u16::try_from(code).ok()
}

/// Whether the declared content type permits reading the body as JSON.
/// A body without a declared type is given the benefit of the doubt; an
/// explicitly non-JSON one (text/html error pages from proxies, plain-text
/// daemon output) is never probed for envelope fields.
fn declares_json(response: &HttpResponse) -> bool {
    match response.content_type() {
        Some(content_type) => content_type.contains("json"),
        None => true,
    }
}

/// Sub-classify a 500 by inspecting the body text.
fn sniff_500(body: &str) -> ApiErrorKind {
    let lower = body.to_ascii_lowercase();
    if lower.contains("no such file or directory") {
        ApiErrorKind::NotFound
    } else if lower.contains("is a directory") {
        ApiErrorKind::BadRequest
    } else {
        ApiErrorKind::InternalServerError
    }
}

fn build_error(
    response: &HttpResponse,
    body: Option<&Value>,
    kind: ApiErrorKind,
    effective_status: u16,
) -> ApiError {
    let documentation_url = body
        .and_then(|b| b.get("documentation_url"))
        .and_then(Value::as_str)
        .map(str::to_string);
    let errors: Vec<FieldError> = body
        .and_then(|b| b.get("errors"))
        .and_then(Value::as_array)
        .map(|entries| entries.iter().map(field_error).collect())
        .unwrap_or_default();

    let message = build_message(
        response,
        body,
        effective_status,
        documentation_url.as_deref(),
        &errors,
    );

    ApiError {
        kind,
        status: effective_status,
        message,
        body: response.text(),
        documentation_url,
        errors,
    }
}

/// Assemble the human-readable message: method and redacted URL, effective
/// status, then whichever of the optional segments the body supplies. Absent
/// segments are skipped outright.
fn build_message(
    response: &HttpResponse,
    body: Option<&Value>,
    effective_status: u16,
    documentation_url: Option<&str>,
    errors: &[FieldError],
) -> String {
    let mut message = format!(
        "{} {}: {}",
        response.method,
        redact_secrets(&response.url),
        effective_status
    );

    if let Some(text) = nonempty_str(body, "message") {
        message.push_str(" - ");
        message.push_str(text);
    }

    // Top-level error wins; a failed operation reports through its own
    // `err` field instead.
    let error_text = nonempty_str(body, "error")
        .or_else(|| body.and_then(|b| b.pointer("/metadata/err")).and_then(Value::as_str).filter(|s| !s.is_empty()));
    if let Some(text) = error_text {
        message.push_str(" - ");
        message.push_str(text);
    }

    if let Some(summary) = error_summary(errors) {
        message.push_str(&summary);
    }

    if let Some(url) = documentation_url {
        message.push_str(" // See: ");
        message.push_str(url);
    }

    message
}

fn nonempty_str<'a>(body: Option<&'a Value>, key: &str) -> Option<&'a str> {
    body?.get(key)?.as_str().filter(|s| !s.is_empty())
}

fn field_error(entry: &Value) -> FieldError {
    match entry {
        Value::String(text) => FieldError {
            message: Some(text.clone()),
            ..FieldError::default()
        },
        Value::Object(map) => {
            let get = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_string);
            FieldError {
                resource: get("resource"),
                field: get("field"),
                code: get("code"),
                message: get("message"),
            }
        }
        other => FieldError {
            message: Some(other.to_string()),
            ..FieldError::default()
        },
    }
}

fn error_summary(errors: &[FieldError]) -> Option<String> {
    if errors.is_empty() {
        return None;
    }
    let lines: Vec<String> = errors
        .iter()
        .map(|err| {
            let mut parts = Vec::new();
            if let Some(resource) = &err.resource {
                parts.push(format!("resource: {resource}"));
            }
            if let Some(field) = &err.field {
                parts.push(format!("field: {field}"));
            }
            if let Some(code) = &err.code {
                parts.push(format!("code: {code}"));
            }
            if let Some(message) = &err.message {
                parts.push(message.clone());
            }
            format!("  {}", parts.join(", "))
        })
        .collect();
    Some(format!("\nError summary:\n{}", lines.join("\n")))
}

/// Redact `secret=` values from a URL's query string. Migration and image
/// export URLs carry one-time secrets that must not leak into logs or error
/// messages.
fn redact_secrets(url: &str) -> String {
    let Some((base, query)) = url.split_once('?') else {
        return url.to_string();
    };
    let redacted: Vec<String> = query
        .split('&')
        .map(|pair| {
            if pair.starts_with("secret=") {
                "secret=[REDACTED]".to_string()
            } else {
                pair.to_string()
            }
        })
        .collect();
    format!("{}?{}", base, redacted.join("&"))
}
