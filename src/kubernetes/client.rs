// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Control plane client construction from resolved cluster coordinates

use crate::aws::ClusterTarget;
use crate::error::{BootstrapError, Result};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

const CONTEXT_NAME: &str = "bootstrap";

/// An authenticated client handle bound to one cluster and one token.
///
/// Owned exclusively by one bootstrap invocation; [`release`](Self::release)
/// must run on every exit path and is observable through the probe so tests
/// can assert exactly-once release.
pub struct ControlPlaneClient {
    client: Client,
    released: Arc<AtomicUsize>,
}

/// Counter handle that outlives the client it was taken from.
#[derive(Clone)]
pub struct ReleaseProbe(Arc<AtomicUsize>);

impl ReleaseProbe {
    pub fn releases(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl ControlPlaneClient {
    /// Build a TLS-verified, token-authenticated client for the target
    /// cluster. A malformed CA or endpoint fails the whole bootstrap.
    pub async fn connect(target: &ClusterTarget, token: &str) -> Result<Self> {
        info!("Connecting to control plane at {}", target.endpoint);

        url::Url::parse(&target.endpoint).map_err(|e| {
            BootstrapError::ClientBuild(format!("invalid endpoint {}: {}", target.endpoint, e))
        })?;

        let kubeconfig = synthesize_kubeconfig(target, token)?;
        let config = Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
            .await
            .map_err(|e| BootstrapError::ClientBuild(e.to_string()))?;
        let client =
            Client::try_from(config).map_err(|e| BootstrapError::ClientBuild(e.to_string()))?;

        Ok(Self::from_client(client))
    }

    /// Wrap an already-built client. Used by tests with a mock service.
    pub fn from_client(client: Client) -> Self {
        Self {
            client,
            released: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn client(&self) -> Client {
        self.client.clone()
    }

    pub fn release_probe(&self) -> ReleaseProbe {
        ReleaseProbe(self.released.clone())
    }

    /// Release the handle, closing the underlying connection pool.
    pub fn release(self) {
        self.released.fetch_add(1, Ordering::SeqCst);
        debug!("Control plane client released");
    }
}

/// Build an in-memory kubeconfig carrying the endpoint, CA bundle, and
/// bearer token. Going through the kubeconfig machinery keeps CA decoding
/// and token handling on the same path as a file-based config.
fn synthesize_kubeconfig(target: &ClusterTarget, token: &str) -> Result<Kubeconfig> {
    serde_json::from_value(serde_json::json!({
        "apiVersion": "v1",
        "kind": "Config",
        "clusters": [{
            "name": target.name,
            "cluster": {
                "server": target.endpoint,
                "certificate-authority-data": target.ca_data,
            }
        }],
        "users": [{
            "name": CONTEXT_NAME,
            "user": { "token": token }
        }],
        "contexts": [{
            "name": CONTEXT_NAME,
            "context": { "cluster": target.name, "user": CONTEXT_NAME }
        }],
        "current-context": CONTEXT_NAME
    }))
    .map_err(|e| BootstrapError::ClientBuild(format!("invalid kubeconfig: {}", e)))
}
