// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Generic manifest application through API discovery.
//!
//! Resolves arbitrary (apiVersion, kind) pairs at runtime, including custom
//! kinds that were registered moments earlier by a previous priority batch,
//! then converges the object with get-then-patch-or-create.

use crate::error::{BootstrapError, Result};
use crate::kubernetes::resources::Upsert;
use crate::retry::RetryPolicy;
use kube::api::{DynamicObject, Patch, PatchParams, PostParams};
use kube::core::GroupVersionKind;
use kube::discovery::{oneshot, ApiCapabilities, ApiResource};
use kube::{Api, Client};
use serde_json::Value;
use tracing::{debug, info};

/// Identity of one manifest object, parsed from its own fields
struct ManifestRef {
    gvk: GroupVersionKind,
    name: String,
    namespace: Option<String>,
}

impl ManifestRef {
    fn parse(manifest: &Value) -> Result<Self> {
        let api_version = manifest
            .get("apiVersion")
            .and_then(Value::as_str)
            .unwrap_or("v1");
        let kind = manifest
            .get("kind")
            .and_then(Value::as_str)
            .ok_or_else(|| BootstrapError::Manifest("document has no kind".to_string()))?;
        let metadata = manifest.get("metadata");
        let name = metadata
            .and_then(|m| m.get("name"))
            .and_then(Value::as_str)
            .ok_or_else(|| {
                BootstrapError::Manifest(format!("{} document has no metadata.name", kind))
            })?;
        let namespace = metadata
            .and_then(|m| m.get("namespace"))
            .and_then(Value::as_str)
            .map(str::to_string);

        let (group, version) = match api_version.split_once('/') {
            Some((group, version)) => (group, version),
            None => ("", api_version),
        };

        Ok(Self {
            gvk: GroupVersionKind::gvk(group, version, kind),
            name: name.to_string(),
            namespace,
        })
    }

    fn display(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{}/{} in {}", self.gvk.kind, self.name, ns),
            None => format!("{}/{}", self.gvk.kind, self.name),
        }
    }
}

/// Apply one manifest object carrying its own apiVersion/kind/metadata.
///
/// `discovery_retry` bounds how long to wait for the kind to appear in
/// discovery; exhausting it fails this manifest only.
pub async fn apply_manifest(
    client: &Client,
    manifest: &Value,
    discovery_retry: &RetryPolicy,
) -> Result<Upsert> {
    let manifest_ref = ManifestRef::parse(manifest)?;
    let (ar, _caps) = resolve_api_resource(client, &manifest_ref.gvk, discovery_retry).await?;

    let api: Api<DynamicObject> = match &manifest_ref.namespace {
        Some(namespace) => Api::namespaced_with(client.clone(), namespace, &ar),
        None => Api::all_with(client.clone(), &ar),
    };

    match api.get(&manifest_ref.name).await {
        Ok(_) => {
            patch_with_fallback(&api, &manifest_ref, manifest).await?;
            info!("Updated {}", manifest_ref.display());
            Ok(Upsert::Updated)
        }
        Err(kube::Error::Api(err)) if err.code == 404 => {
            let object: DynamicObject = serde_json::from_value(manifest.clone())
                .map_err(|e| BootstrapError::Manifest(e.to_string()))?;
            api.create(&PostParams::default(), &object).await?;
            info!("Created {}", manifest_ref.display());
            Ok(Upsert::Created)
        }
        Err(e) => Err(e.into()),
    }
}

/// Patch with the default structural merge; on an unsupported-media-type
/// rejection (custom kinds without merge schema annotations) retry exactly
/// once with a generic JSON merge-patch.
async fn patch_with_fallback(
    api: &Api<DynamicObject>,
    manifest_ref: &ManifestRef,
    manifest: &Value,
) -> Result<()> {
    let pp = PatchParams::default();

    match api.patch(&manifest_ref.name, &pp, &Patch::Strategic(manifest)).await {
        Ok(_) => Ok(()),
        Err(kube::Error::Api(err)) if err.code == 415 => {
            debug!(
                "Strategic merge not supported for {}, retrying with merge-patch",
                manifest_ref.display()
            );
            api.patch(&manifest_ref.name, &pp, &Patch::Merge(manifest))
                .await?;
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Resolve the API resource descriptor for a kind, retrying while its
/// registration propagates. Every attempt runs a fresh one-shot discovery;
/// kind registration is asynchronous on the API server side, so a cached
/// miss would never recover.
pub(crate) async fn resolve_api_resource(
    client: &Client,
    gvk: &GroupVersionKind,
    policy: &RetryPolicy,
) -> Result<(ApiResource, ApiCapabilities)> {
    policy
        .run(|attempt| {
            let client = client.clone();
            async move {
                if attempt > 1 {
                    info!(
                        "Waiting for {} ({}) to appear in discovery... ({}/{})",
                        gvk.kind,
                        gvk.api_version(),
                        attempt,
                        policy.max_attempts
                    );
                }
                oneshot::pinned_kind(&client, gvk).await
            }
        })
        .await
        .map_err(|e| {
            BootstrapError::Discovery(format!(
                "{} ({}) not found after {} attempts: {}",
                gvk.kind,
                gvk.api_version(),
                policy.max_attempts,
                e
            ))
        })
}
