//! Request shaping for container creation, copy and migration.
//!
//! Every request body the client sends for a composite resource is built
//! here, as a [`CreateRequest`] wrapping a tagged [`Source`] union. The
//! builders are pure and fail fast: any invalid option combination is
//! rejected before a single byte goes on the wire.

use crate::error::Error;
use crate::Result;
use serde::Serialize;
use std::collections::HashMap;

/// Configuration keys prefixed with this are host-generated (MAC addresses,
/// instance ids) and must be regenerated on the target when a container is
/// copied rather than moved.
pub const VOLATILE_PREFIX: &str = "volatile";

/// Image transfer protocols the daemon understands.
const VALID_PROTOCOLS: &[&str] = &["lxd", "simplestreams"];

/// Provenance of a new container's filesystem content.
///
/// Exactly one kind is selected per request; serialization cannot leak fields
/// across kinds because each variant owns only the fields valid for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Source {
    /// Content from an image, local or pulled from a remote server.
    Image {
        #[serde(skip_serializing_if = "Option::is_none")]
        fingerprint: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        alias: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        properties: Option<HashMap<String, String>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        mode: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        server: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        protocol: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        certificate: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        secret: Option<String>,
    },
    /// Content copied from an existing local container.
    Copy { source: String },
    /// Content pulled from another server over the migration websocket.
    Migration {
        mode: String,
        operation: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        certificate: Option<String>,
        secrets: HashMap<String, String>,
    },
    /// No content: an empty container.
    None,
}

/// Options for creating a container. One of `alias`, `fingerprint` or
/// `properties` selects the image, or `empty` skips image provenance
/// entirely; everything else passes through to the request.
#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    pub alias: Option<String>,
    pub fingerprint: Option<String>,
    pub properties: Option<HashMap<String, String>>,
    /// Create an empty container; mutually exclusive with every image option.
    pub empty: bool,
    /// Remote image server URL; its presence switches to a pull request.
    pub server: Option<String>,
    /// Transfer protocol for a remote server ("lxd" or "simplestreams").
    pub protocol: Option<String>,
    /// Remote server certificate.
    pub certificate: Option<String>,
    /// One-time secret for the remote image.
    pub secret: Option<String>,
    pub architecture: Option<String>,
    pub profiles: Option<Vec<String>>,
    pub ephemeral: Option<bool>,
    pub config: Option<HashMap<String, String>>,
}

/// Options for copying an existing container.
#[derive(Debug, Clone, Default)]
pub struct CopyOptions {
    pub architecture: Option<String>,
    pub profiles: Option<Vec<String>>,
    pub ephemeral: Option<bool>,
    pub config: Option<HashMap<String, String>>,
}

/// Descriptor of a migration source, captured from the source server before
/// the target is asked to pull.
#[derive(Debug, Clone, Default)]
pub struct MigrationSource {
    pub architecture: Option<String>,
    /// Stringified source configuration.
    pub config: HashMap<String, String>,
    pub profiles: Vec<String>,
    /// URL of the source's migration operation websocket.
    pub websocket_url: String,
    /// Per-channel secrets ("control", "fs", "criu").
    pub websocket_secrets: HashMap<String, String>,
    /// Source server certificate.
    pub certificate: Option<String>,
    pub ephemeral: Option<bool>,
    /// Whether the source is a snapshot rather than a full container.
    pub snapshot: bool,
}

/// Per-migration overrides.
#[derive(Debug, Clone, Default)]
pub struct MigrateOptions {
    pub architecture: Option<String>,
    /// Certificate override for the source server.
    pub certificate: Option<String>,
    /// Explicit target configuration; suppresses volatile-key stripping.
    pub config: Option<HashMap<String, String>>,
    /// Explicit target profiles; skips the destination-profile check.
    pub profiles: Option<Vec<String>>,
    pub ephemeral: Option<bool>,
    /// The container is being moved, not duplicated: volatile keys are
    /// preserved verbatim because it stays the same logical instance.
    pub r#move: bool,
}

/// Options for creating an image alias.
#[derive(Debug, Clone, Default)]
pub struct AliasOptions {
    pub name: Option<String>,
    /// Fingerprint of the image the alias points at.
    pub target: Option<String>,
    pub description: Option<String>,
}

/// The body POSTed to `/1.0/containers`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub architecture: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profiles: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ephemeral: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<HashMap<String, String>>,
    #[serde(rename = "base-image", skip_serializing_if = "Option::is_none")]
    pub base_image: Option<String>,
    pub source: Source,
}

/// The body POSTed to `/1.0/images/aliases`.
#[derive(Debug, Clone, Serialize)]
pub struct AliasRequest {
    pub name: String,
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Select the image source for a creation request.
///
/// Precedence when several selectors are present: `fingerprint` over `alias`
/// over `properties`. Only the winning selector is serialized; the others are
/// dropped. This rule is deliberate, documented behavior, not an ordering
/// accident.
pub fn image_source(opts: &CreateOptions) -> Result<Source> {
    if opts.empty {
        return empty_source(opts);
    }

    let has_remote_only = opts.protocol.is_some() || opts.certificate.is_some() || opts.secret.is_some();

    if opts.server.is_some() {
        if let Some(protocol) = &opts.protocol {
            if !VALID_PROTOCOLS.contains(&protocol.as_str()) {
                return Err(Error::InvalidProtocol(protocol.clone()));
            }
        }
    } else if has_remote_only {
        return Err(Error::InvalidImageAttributes(
            "protocol, certificate and secret are only valid with a remote server".to_string(),
        ));
    }

    let (fingerprint, alias, properties) = select_image(opts)?;

    Ok(Source::Image {
        fingerprint,
        alias,
        properties,
        mode: opts.server.as_ref().map(|_| "pull".to_string()),
        server: opts.server.clone(),
        protocol: opts.server.as_ref().and(opts.protocol.clone()),
        certificate: opts.server.as_ref().and(opts.certificate.clone()),
        secret: opts.server.as_ref().and(opts.secret.clone()),
    })
}

/// First-match-wins image selection: fingerprint, then alias, then
/// properties.
fn select_image(
    opts: &CreateOptions,
) -> Result<(Option<String>, Option<String>, Option<HashMap<String, String>>)> {
    if let Some(fingerprint) = &opts.fingerprint {
        Ok((Some(fingerprint.clone()), None, None))
    } else if let Some(alias) = &opts.alias {
        Ok((None, Some(alias.clone()), None))
    } else if let Some(properties) = &opts.properties {
        Ok((None, None, Some(properties.clone())))
    } else {
        Err(Error::ImageIdentifierRequired)
    }
}

fn empty_source(opts: &CreateOptions) -> Result<Source> {
    let mut conflicting = Vec::new();
    if opts.alias.is_some() {
        conflicting.push("alias");
    }
    if opts.certificate.is_some() {
        conflicting.push("certificate");
    }
    if opts.fingerprint.is_some() {
        conflicting.push("fingerprint");
    }
    if opts.properties.is_some() {
        conflicting.push("properties");
    }
    if opts.protocol.is_some() {
        conflicting.push("protocol");
    }
    if opts.secret.is_some() {
        conflicting.push("secret");
    }
    if opts.server.is_some() {
        conflicting.push("server");
    }

    if conflicting.is_empty() {
        Ok(Source::None)
    } else {
        Err(Error::InvalidImageAttributes(format!(
            "empty creation excludes image options: {}",
            conflicting.join(", ")
        )))
    }
}

/// Build a creation request from an image (or empty) source.
pub fn create_request(name: &str, opts: &CreateOptions) -> Result<CreateRequest> {
    Ok(CreateRequest {
        name: name.to_string(),
        architecture: opts.architecture.clone(),
        profiles: opts.profiles.clone(),
        ephemeral: opts.ephemeral,
        config: opts.config.clone(),
        base_image: None,
        source: image_source(opts)?,
    })
}

/// Build a copy request from an existing local container.
pub fn copy_request(source_name: &str, target_name: &str, opts: &CopyOptions) -> CreateRequest {
    CreateRequest {
        name: target_name.to_string(),
        architecture: opts.architecture.clone(),
        profiles: opts.profiles.clone(),
        ephemeral: opts.ephemeral,
        config: opts.config.clone(),
        base_image: None,
        source: Source::Copy {
            source: source_name.to_string(),
        },
    }
}

/// Build a migration request for `target_name` pulling from `source`.
///
/// `target_profiles` is the profile list of the destination server; it is
/// only consulted when the caller gives no explicit profile override.
pub fn migration_request(
    target_name: &str,
    source: &MigrationSource,
    target_profiles: &[String],
    opts: &MigrateOptions,
) -> Result<CreateRequest> {
    let base_image = if source.snapshot {
        None
    } else {
        source.config.get("volatile.base_image").cloned()
    };

    let config = match &opts.config {
        Some(explicit) => explicit.clone(),
        None if source.snapshot => HashMap::new(),
        None => {
            let mut config = source.config.clone();
            if !opts.r#move {
                // A fresh copy must regenerate host-specific keys on the
                // target; a move keeps them because the instance identity is
                // unchanged.
                config.retain(|key, _| !key.starts_with(VOLATILE_PREFIX));
            }
            config
        }
    };

    let profiles = match &opts.profiles {
        Some(explicit) => explicit.clone(),
        None => {
            let missing: Vec<String> = source
                .profiles
                .iter()
                .filter(|profile| !target_profiles.contains(profile))
                .cloned()
                .collect();
            if !missing.is_empty() {
                return Err(Error::MissingProfiles(missing));
            }
            source.profiles.clone()
        }
    };

    let ephemeral = opts.ephemeral.or(source.ephemeral).unwrap_or(false);

    Ok(CreateRequest {
        name: target_name.to_string(),
        architecture: opts.architecture.clone().or_else(|| source.architecture.clone()),
        profiles: Some(profiles),
        ephemeral: Some(ephemeral),
        config: Some(config),
        base_image,
        source: Source::Migration {
            mode: "pull".to_string(),
            operation: source.websocket_url.clone(),
            certificate: opts.certificate.clone().or_else(|| source.certificate.clone()),
            secrets: source.websocket_secrets.clone(),
        },
    })
}

/// Build an image-alias creation request. Both the alias name and the target
/// fingerprint are required.
pub fn alias_request(opts: &AliasOptions) -> Result<AliasRequest> {
    match (&opts.name, &opts.target) {
        (Some(name), Some(target)) if !name.is_empty() && !target.is_empty() => Ok(AliasRequest {
            name: name.clone(),
            target: target.clone(),
            description: opts.description.clone(),
        }),
        _ => Err(Error::AliasAttributesRequired),
    }
}
