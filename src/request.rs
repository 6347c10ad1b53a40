// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Invocation request and response contract

use crate::config::Config;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// One cluster-bootstrap invocation request.
///
/// Field names follow the event schema emitted by the pipeline trigger.
#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapRequest {
    pub cluster_name: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub secrets_prefix: Option<String>,
    /// Priority 0 manifests (CRDs, Namespaces), applied first
    #[serde(default)]
    pub argocd_manifests_p0: Vec<String>,
    /// Priority 1 manifests (core resources)
    #[serde(default)]
    pub argocd_manifests_p1: Vec<String>,
    /// Priority 2 manifests (custom resources), applied last
    #[serde(default)]
    pub argocd_manifests_p2: Vec<String>,
    #[serde(default)]
    pub cluster_config: serde_json::Map<String, serde_json::Value>,
}

impl BootstrapRequest {
    /// Region for this invocation, falling back to the ambient default
    pub fn region<'a>(&'a self, config: &'a Config) -> &'a str {
        self.region.as_deref().unwrap_or(&config.default_region)
    }

    /// Secret store prefix, defaulting to `eks/{cluster_name}/argocd/`
    pub fn secrets_prefix(&self) -> String {
        self.secrets_prefix
            .clone()
            .unwrap_or_else(|| format!("eks/{}/argocd/", self.cluster_name))
    }

    pub fn has_manifests(&self) -> bool {
        !self.argocd_manifests_p0.is_empty()
            || !self.argocd_manifests_p1.is_empty()
            || !self.argocd_manifests_p2.is_empty()
    }
}

/// One completed step, serialized as a single-entry `{label: outcome}` object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub label: String,
    pub outcome: String,
}

impl Serialize for Step {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.label, &self.outcome)?;
        map.end()
    }
}

/// Append-only ordered log of step outcomes
#[derive(Debug, Clone, Default, Serialize)]
pub struct StepLog(Vec<Step>);

impl StepLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, label: impl Into<String>, outcome: impl Into<String>) {
        self.0.push(Step {
            label: label.into(),
            outcome: outcome.into(),
        });
    }

    pub fn steps(&self) -> &[Step] {
        &self.0
    }

    /// Outcome of the first step with the given label, if recorded
    pub fn outcome(&self, label: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|s| s.label == label)
            .map(|s| s.outcome.as_str())
    }
}

/// Structured result of one bootstrap invocation
#[derive(Debug, Clone, Serialize)]
pub struct BootstrapResponse {
    pub success: bool,
    pub steps: StepLog,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BootstrapResponse {
    /// Response for an unrecoverable failure before any step could run
    pub fn fatal(error: impl Into<String>) -> Self {
        Self {
            success: false,
            steps: StepLog::new(),
            error: Some(error.into()),
        }
    }
}
