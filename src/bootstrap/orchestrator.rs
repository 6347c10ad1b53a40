// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Bootstrap orchestration: resolve, authenticate, connect, then run the
//! best-effort bootstrap stages against the control plane.

use crate::aws::{EksClusterRegistry, SecretStore, SecretsManagerStore};
use crate::aws::sts;
use crate::bootstrap::batches::apply_batches;
use crate::bootstrap::secrets::import_secrets;
use crate::config::Config;
use crate::constants::{discovery, ARGOCD_NAMESPACE, CLUSTER_CONFIG_MAP};
use crate::error::{BootstrapError, Result};
use crate::kubernetes::{ensure_config_map, ensure_namespace, ControlPlaneClient};
use crate::request::{BootstrapRequest, BootstrapResponse, StepLog};
use crate::retry::RetryPolicy;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::provider::ProvideCredentials;
use kube::Client;
use std::time::{Duration, SystemTime};
use tracing::{error, info, warn};

/// Run one complete bootstrap invocation against AWS and the cluster.
///
/// Cluster lookup, token signing, and client construction are fatal to the
/// invocation: without a client no partial progress is possible, so they
/// short-circuit into a structured failure response. Everything after that
/// is best-effort per step.
pub async fn bootstrap(config: &Config, request: BootstrapRequest) -> BootstrapResponse {
    info!("Bootstrap started for cluster: {}", request.cluster_name);

    let region = request.region(config).to_string();
    let shared = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.clone()))
        .load()
        .await;

    let registry = EksClusterRegistry::new(&shared);
    let target = match registry.describe(&request.cluster_name, &region).await {
        Ok(target) => target,
        Err(e) => return fatal(e),
    };

    info!("Generating EKS token");
    let token = match broker_token(&shared, &request.cluster_name, &region).await {
        Ok(token) => token,
        Err(e) => return fatal(e),
    };

    let client = match ControlPlaneClient::connect(&target, &token).await {
        Ok(client) => client,
        Err(e) => return fatal(e),
    };

    let store = SecretsManagerStore::new(&shared);
    run_with(client, &store, &request).await
}

fn fatal(e: BootstrapError) -> BootstrapResponse {
    error!("Bootstrap failed: {}", e);
    BootstrapResponse::fatal(e.to_string())
}

async fn broker_token(shared: &SdkConfig, cluster_name: &str, region: &str) -> Result<String> {
    let provider = shared.credentials_provider().ok_or_else(|| {
        BootstrapError::TokenSigning("no credentials provider configured".to_string())
    })?;
    let credentials = provider
        .provide_credentials()
        .await
        .map_err(|e| BootstrapError::TokenSigning(e.to_string()))?;

    sts::request_token(&credentials, cluster_name, region, SystemTime::now())
}

/// Run the bootstrap stages with an already-connected client and secret
/// store, releasing the client on every exit path.
///
/// Step failures are recorded and counted but never halt later steps; the
/// invocation succeeds only when every attempted operation succeeded.
pub async fn run_with(
    client: ControlPlaneClient,
    store: &dyn SecretStore,
    request: &BootstrapRequest,
) -> BootstrapResponse {
    let mut steps = StepLog::new();
    let mut failures = 0usize;

    let kube = client.client();
    run_steps(&kube, store, request, &mut steps, &mut failures).await;

    let response = if failures == 0 {
        info!("Bootstrap completed: {} step(s)", steps.steps().len());
        BootstrapResponse {
            success: true,
            steps,
            error: None,
        }
    } else {
        warn!("Bootstrap finished with {} failed operation(s)", failures);
        BootstrapResponse {
            success: false,
            steps,
            error: Some(format!("{} operation(s) failed", failures)),
        }
    };

    client.release();
    response
}

async fn run_steps(
    client: &Client,
    store: &dyn SecretStore,
    request: &BootstrapRequest,
    steps: &mut StepLog,
    failures: &mut usize,
) {
    // Step 1: argocd namespace
    info!("Ensuring {} namespace", ARGOCD_NAMESPACE);
    match ensure_namespace(client, ARGOCD_NAMESPACE).await {
        Ok(outcome) => steps.record("namespace", outcome.as_str()),
        Err(e) => {
            error!("Failed to ensure namespace {}: {}", ARGOCD_NAMESPACE, e);
            steps.record("namespace", "failed");
            *failures += 1;
        }
    }

    // Step 2: ArgoCD manifests in priority order
    if request.has_manifests() {
        info!("Installing ArgoCD from pre-rendered manifests (priority order)");
        let retry = RetryPolicy::new(
            discovery::MAX_ATTEMPTS,
            Duration::from_secs(discovery::RETRY_DELAY_SECS),
        );
        let reports = apply_batches(
            client,
            &request.argocd_manifests_p0,
            &request.argocd_manifests_p1,
            &request.argocd_manifests_p2,
            &retry,
        )
        .await;

        for report in &reports {
            if report.skipped() {
                continue;
            }
            if report.failed == 0 {
                steps.record(report.key, format!("applied ({})", report.applied));
            } else {
                steps.record(
                    report.key,
                    format!("failed ({}/{})", report.failed, report.attempted()),
                );
                *failures += report.failed;
            }
        }
    }

    // Step 3: secrets from the external store
    let prefix = request.secrets_prefix();
    info!("Reading secrets with prefix: {}", prefix);
    let report = import_secrets(client, store, &prefix, ARGOCD_NAMESPACE).await;
    for (name, outcome) in &report.imported {
        steps.record(format!("secret_{}", name), outcome.as_str());
    }
    *failures += report.failed;

    // Step 4: cluster-config ConfigMap
    if !request.cluster_config.is_empty() {
        info!("Creating {} ConfigMap", CLUSTER_CONFIG_MAP);
        match ensure_config_map(
            client,
            CLUSTER_CONFIG_MAP,
            ARGOCD_NAMESPACE,
            &request.cluster_config,
        )
        .await
        {
            Ok(outcome) => steps.record("configmap_cluster_config", outcome.as_str()),
            Err(e) => {
                error!("Failed to create/update {} ConfigMap: {}", CLUSTER_CONFIG_MAP, e);
                steps.record("configmap_cluster_config", "failed");
                *failures += 1;
            }
        }
    }
}
