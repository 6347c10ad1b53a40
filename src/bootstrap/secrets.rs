// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Import of externally stored secrets into the cluster

use crate::aws::{SecretRecord, SecretStore};
use crate::kubernetes::{ensure_secret, Upsert};
use kube::Client;
use tracing::{error, info, warn};

/// Outcome of one secret import run
#[derive(Debug, Default)]
pub struct ImportReport {
    /// Short names and upsert outcomes of imported secrets, in order
    pub imported: Vec<(String, Upsert)>,
    /// Secrets skipped because of read, parse, or upsert errors
    pub failed: usize,
}

impl ImportReport {
    pub fn count(&self) -> usize {
        self.imported.len()
    }
}

/// Enumerate secrets under `prefix` in the external store and upsert each
/// as an opaque secret in `namespace`.
///
/// A listing error ends the import (logged, empty report); an error on one
/// secret skips that secret only.
pub async fn import_secrets(
    client: &Client,
    store: &dyn SecretStore,
    prefix: &str,
    namespace: &str,
) -> ImportReport {
    let mut report = ImportReport::default();

    let names = match store.list_names(prefix).await {
        Ok(names) => names,
        Err(e) => {
            error!("Error listing secrets with prefix {}: {}", prefix, e);
            return report;
        }
    };

    info!("Found {} secrets under prefix {}", names.len(), prefix);

    for full_name in names {
        let short_name = full_name
            .strip_prefix(prefix)
            .unwrap_or(&full_name)
            .trim_start_matches('/')
            .to_string();

        let record = match store
            .get_payload(&full_name)
            .await
            .and_then(|payload| SecretRecord::parse(&short_name, &payload))
        {
            Ok(record) => record,
            Err(e) => {
                warn!("Could not read secret {}: {}", full_name, e);
                report.failed += 1;
                continue;
            }
        };

        info!("Creating secret: {}", record.name);
        match ensure_secret(
            client,
            &record.name,
            namespace,
            &record.data,
            record.labels.as_ref(),
        )
        .await
        {
            Ok(outcome) => report.imported.push((record.name, outcome)),
            Err(e) => {
                error!("Failed to create/update secret {}: {}", record.name, e);
                report.failed += 1;
            }
        }
    }

    report
}
