// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Priority-ordered manifest batch application.
//!
//! Three fixed batches: p0 (CRDs, Namespaces) fully precedes p1 (core
//! resources), which precedes p2 (custom resources depending on p0's
//! schemas). Application is best-effort: a failing document never halts
//! its batch or later batches.

use crate::error::{BootstrapError, Result};
use crate::kubernetes::apply_manifest;
use crate::retry::RetryPolicy;
use kube::Client;
use serde::Deserialize;
use tracing::{error, info};

/// Per-batch application counters
#[derive(Debug, Clone)]
pub struct BatchReport {
    /// Step label, e.g. `manifests_p0`
    pub key: &'static str,
    /// Human-readable batch description for logs
    pub label: &'static str,
    /// Number of manifest strings supplied for this batch
    pub supplied: usize,
    pub applied: usize,
    pub failed: usize,
}

impl BatchReport {
    fn new(key: &'static str, label: &'static str, supplied: usize) -> Self {
        Self {
            key,
            label,
            supplied,
            applied: 0,
            failed: 0,
        }
    }

    pub fn attempted(&self) -> usize {
        self.applied + self.failed
    }

    /// True when no manifests were supplied for this batch at all
    pub fn skipped(&self) -> bool {
        self.supplied == 0
    }
}

/// Apply the three batches in fixed order, accumulating per-batch counts.
/// All supplied documents are always processed.
pub async fn apply_batches(
    client: &Client,
    p0: &[String],
    p1: &[String],
    p2: &[String],
    discovery_retry: &RetryPolicy,
) -> Vec<BatchReport> {
    let batches: [(&'static str, &'static str, &[String]); 3] = [
        ("manifests_p0", "p0 (CRDs/Namespaces)", p0),
        ("manifests_p1", "p1 (Core resources)", p1),
        ("manifests_p2", "p2 (Custom Resources)", p2),
    ];

    let mut reports = Vec::with_capacity(batches.len());
    for (key, label, documents) in batches {
        let mut report = BatchReport::new(key, label, documents.len());

        if documents.is_empty() {
            info!("No {} manifests to apply", label);
            reports.push(report);
            continue;
        }

        info!("Applying {} {} manifests", documents.len(), label);
        for text in documents {
            match split_documents(text) {
                Ok(objects) => {
                    for object in &objects {
                        match apply_manifest(client, object, discovery_retry).await {
                            Ok(_) => report.applied += 1,
                            Err(e) => {
                                error!("Failed to apply {} manifest: {}", label, e);
                                report.failed += 1;
                            }
                        }
                    }
                }
                Err(e) => {
                    error!("Failed to parse {} manifest: {}", label, e);
                    report.failed += 1;
                }
            }
        }

        info!(
            "{}: applied {}, failed {}",
            label, report.applied, report.failed
        );
        reports.push(report);
    }

    let applied: usize = reports.iter().map(|r| r.applied).sum();
    let failed: usize = reports.iter().map(|r| r.failed).sum();
    info!("Total manifests: {} applied, {} failures", applied, failed);

    reports
}

/// Split a possibly multi-document YAML block into JSON objects,
/// skipping empty sub-documents.
pub fn split_documents(text: &str) -> Result<Vec<serde_json::Value>> {
    let mut documents = Vec::new();
    for document in serde_yaml::Deserializer::from_str(text) {
        let value = serde_yaml::Value::deserialize(document)
            .map_err(|e| BootstrapError::Manifest(format!("invalid YAML document: {}", e)))?;
        if value.is_null() {
            continue;
        }
        let json = serde_json::to_value(&value)
            .map_err(|e| BootstrapError::Manifest(format!("unrepresentable document: {}", e)))?;
        documents.push(json);
    }
    Ok(documents)
}
