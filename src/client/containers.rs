//! Container creation, copy and migration calls.
//!
//! Each call shapes and validates its payload through [`crate::source`]
//! before anything goes on the wire, then resolves the resulting operation
//! per the sync policy.

use crate::client::core::LxdClient;
use crate::client::operations::{OperationOutcome, SyncPolicy};
use crate::source::{
    self, AliasOptions, CopyOptions, CreateOptions, MigrateOptions, MigrationSource,
};
use crate::types::Operation;
use crate::Result;
use serde_json::json;
use std::collections::HashMap;

const CONTAINERS: &str = "/1.0/containers";

impl LxdClient {
    /// Create a container from an image (selected by fingerprint, alias or
    /// properties), or an empty one when `opts.empty` is set.
    ///
    /// Option validation happens before any network call; see
    /// [`source::image_source`] for the selection and precedence rules.
    pub async fn create_container(
        &self,
        name: &str,
        opts: &CreateOptions,
        sync: SyncPolicy,
        timeout: Option<i64>,
    ) -> Result<OperationOutcome> {
        let request = source::create_request(name, opts)?;
        let envelope = self.post(CONTAINERS, serde_json::to_value(&request)?).await?;
        self.resolve(envelope, sync, timeout).await
    }

    /// Copy a local container to a new name.
    pub async fn copy_container(
        &self,
        source_name: &str,
        target_name: &str,
        opts: &CopyOptions,
        sync: SyncPolicy,
        timeout: Option<i64>,
    ) -> Result<OperationOutcome> {
        let request = source::copy_request(source_name, target_name, opts);
        let envelope = self.post(CONTAINERS, serde_json::to_value(&request)?).await?;
        self.resolve(envelope, sync, timeout).await
    }

    /// Capture a migration source descriptor for a container or snapshot
    /// (`"container"` or `"container/snapshot"`).
    ///
    /// Starts a migration operation on this (source) server and collects
    /// what the target needs to pull: the operation websocket URL, the
    /// per-channel secrets from the operation metadata, the source
    /// configuration/profiles, and this server's certificate. The operation
    /// is left running; the target's pull consumes it.
    pub async fn init_migration(&self, name: &str) -> Result<MigrationSource> {
        let (info_path, snapshot) = match name.split_once('/') {
            Some((container, snap)) => {
                (format!("{CONTAINERS}/{container}/snapshots/{snap}"), true)
            }
            None => (format!("{CONTAINERS}/{name}"), false),
        };

        let info: crate::types::Container = self.get(&info_path).await?.metadata_as()?;

        let envelope = self.post(&info_path, json!({ "migration": true })).await?;
        self.expect_async(&envelope)?;
        let operation: Operation = envelope.metadata_as()?;
        let secrets: HashMap<String, String> =
            serde_json::from_value(operation.metadata.clone()).unwrap_or_default();

        let websocket_url = format!(
            "{}{}",
            self.config.api_endpoint.trim_end_matches('/'),
            envelope.operation
        );

        Ok(MigrationSource {
            architecture: Some(info.architecture).filter(|a| !a.is_empty()),
            config: info.config,
            profiles: info.profiles,
            websocket_url,
            websocket_secrets: secrets,
            certificate: self.server_certificate().await?,
            ephemeral: Some(info.ephemeral),
            snapshot,
        })
    }

    /// Create a container on this (target) server by pulling from a captured
    /// migration source.
    ///
    /// When no explicit profile override is given, the source's profiles
    /// must all exist here; the check queries this server's profile list
    /// before the request is built.
    pub async fn migrate_container(
        &self,
        migration: &MigrationSource,
        target_name: &str,
        opts: &MigrateOptions,
        sync: SyncPolicy,
        timeout: Option<i64>,
    ) -> Result<OperationOutcome> {
        let target_profiles = if opts.profiles.is_some() {
            Vec::new()
        } else {
            self.profile_names().await?
        };

        let request = source::migration_request(target_name, migration, &target_profiles, opts)?;
        let envelope = self.post(CONTAINERS, serde_json::to_value(&request)?).await?;
        self.resolve(envelope, sync, timeout).await
    }

    /// Create an alias for an image. Requires both a name and a target
    /// fingerprint.
    pub async fn create_image_alias(&self, opts: &AliasOptions) -> Result<()> {
        let request = source::alias_request(opts)?;
        self.post("/1.0/images/aliases", serde_json::to_value(&request)?)
            .await?;
        Ok(())
    }
}
