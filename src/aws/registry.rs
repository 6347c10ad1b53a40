// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! EKS cluster registry lookup

use crate::error::{BootstrapError, Result};
use aws_sdk_eks::error::DisplayErrorContext;
use tracing::info;

/// Connection coordinates of one EKS cluster, resolved once per invocation.
#[derive(Debug, Clone)]
pub struct ClusterTarget {
    pub name: String,
    pub region: String,
    /// API server endpoint URL
    pub endpoint: String,
    /// Base64-encoded PEM CA bundle, as returned by DescribeCluster
    pub ca_data: String,
}

/// Resolves cluster connection details via the EKS control API.
pub struct EksClusterRegistry {
    client: aws_sdk_eks::Client,
}

impl EksClusterRegistry {
    pub fn new(shared_config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_eks::Client::new(shared_config),
        }
    }

    /// Look up endpoint and CA data for a cluster. Any failure here is
    /// fatal to the whole invocation.
    pub async fn describe(&self, name: &str, region: &str) -> Result<ClusterTarget> {
        info!("Getting cluster info for {}", name);

        let output = self
            .client
            .describe_cluster()
            .name(name)
            .send()
            .await
            .map_err(|e| BootstrapError::ClusterLookup(format!("{}", DisplayErrorContext(&e))))?;

        let cluster = output.cluster().ok_or_else(|| {
            BootstrapError::ClusterLookup(format!("empty DescribeCluster response for {}", name))
        })?;

        let endpoint = cluster.endpoint().ok_or_else(|| {
            BootstrapError::ClusterLookup(format!("cluster {} has no endpoint yet", name))
        })?;

        let ca_data = cluster
            .certificate_authority()
            .and_then(|ca| ca.data())
            .ok_or_else(|| {
                BootstrapError::ClusterLookup(format!("cluster {} has no CA data yet", name))
            })?;

        Ok(ClusterTarget {
            name: name.to_string(),
            region: region.to_string(),
            endpoint: endpoint.to_string(),
            ca_data: ca_data.to_string(),
        })
    }
}
