// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Cluster lookup failed: {0}")]
    ClusterLookup(String),

    #[error("Token signing failed: {0}")]
    TokenSigning(String),

    #[error("Failed to build control plane client: {0}")]
    ClientBuild(String),

    #[error("API discovery failed: {0}")]
    Discovery(String),

    #[error("Invalid manifest: {0}")]
    Manifest(String),

    #[error("Secret store error: {0}")]
    SecretStore(String),
}

pub type Result<T> = std::result::Result<T, BootstrapError>;
