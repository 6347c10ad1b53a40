// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! External secret store access and payload parsing

use crate::constants::LABELS_KEY;
use crate::error::{BootstrapError, Result};
use crate::kubernetes::resources::coerce_string;
use async_trait::async_trait;
use aws_sdk_secretsmanager::error::DisplayErrorContext;
use aws_sdk_secretsmanager::types::{Filter, FilterNameStringType};
use std::collections::BTreeMap;
use tracing::debug;

/// Read access to the external secret store, keyed by name prefix.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Full names of all secrets whose name starts with `prefix`
    async fn list_names(&self, prefix: &str) -> Result<Vec<String>>;

    /// Opaque string payload of one secret
    async fn get_payload(&self, name: &str) -> Result<String>;
}

/// AWS Secrets Manager implementation of [`SecretStore`].
pub struct SecretsManagerStore {
    client: aws_sdk_secretsmanager::Client,
}

impl SecretsManagerStore {
    pub fn new(shared_config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_secretsmanager::Client::new(shared_config),
        }
    }
}

#[async_trait]
impl SecretStore for SecretsManagerStore {
    async fn list_names(&self, prefix: &str) -> Result<Vec<String>> {
        let filter = Filter::builder()
            .key(FilterNameStringType::Name)
            .values(prefix)
            .build();

        let mut pages = self
            .client
            .list_secrets()
            .filters(filter)
            .into_paginator()
            .send();

        let mut names = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page
                .map_err(|e| BootstrapError::SecretStore(format!("{}", DisplayErrorContext(&e))))?;
            for secret in page.secret_list() {
                if let Some(name) = secret.name() {
                    names.push(name.to_string());
                }
            }
        }

        Ok(names)
    }

    async fn get_payload(&self, name: &str) -> Result<String> {
        let output = self
            .client
            .get_secret_value()
            .secret_id(name)
            .send()
            .await
            .map_err(|e| BootstrapError::SecretStore(format!("{}", DisplayErrorContext(&e))))?;

        output
            .secret_string()
            .map(str::to_string)
            .ok_or_else(|| {
                BootstrapError::SecretStore(format!("secret {} has no string payload", name))
            })
    }
}

/// One secret record destined for the control plane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretRecord {
    /// Short name, with the store prefix already stripped
    pub name: String,
    pub data: BTreeMap<String, String>,
    /// Labels extracted from the reserved `_labels` payload key
    pub labels: Option<BTreeMap<String, String>>,
}

impl SecretRecord {
    /// Parse a stored payload into key/value data plus optional labels.
    ///
    /// The payload must be a JSON object; scalar values are coerced to
    /// strings, compound values are kept as compact JSON. A malformed
    /// `_labels` value drops the labels but never the record.
    pub fn parse(name: &str, payload: &str) -> Result<Self> {
        let mut fields: serde_json::Map<String, serde_json::Value> = serde_json::from_str(payload)
            .map_err(|e| {
                BootstrapError::SecretStore(format!(
                    "secret {}: payload is not a JSON object: {}",
                    name, e
                ))
            })?;

        let labels = fields.remove(LABELS_KEY).and_then(|v| parse_labels(name, &v));
        let data = fields
            .into_iter()
            .map(|(k, v)| (k, coerce_string(&v)))
            .collect();

        Ok(Self {
            name: name.to_string(),
            data,
            labels,
        })
    }
}

fn parse_labels(name: &str, value: &serde_json::Value) -> Option<BTreeMap<String, String>> {
    let raw = value.as_str()?;
    match serde_json::from_str(raw) {
        Ok(labels) => Some(labels),
        Err(e) => {
            debug!("Ignoring malformed {} value on secret {}: {}", LABELS_KEY, name, e);
            None
        }
    }
}
