// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// EKS bearer token configuration
pub mod token {
    /// Prefix the API server expects on presigned STS tokens
    pub const PREFIX: &str = "k8s-aws-v1.";
    /// Presign validity window of the STS request, in seconds
    pub const STS_EXPIRES_SECS: u64 = 60;
    /// Effective token validity the cluster honors, in minutes.
    /// Conservatively below the window EKS allows, to absorb clock skew.
    pub const VALIDITY_MINS: u64 = 14;
}

/// Discovery retry configuration for freshly registered custom kinds
pub mod discovery {
    /// Maximum discovery attempts per manifest
    pub const MAX_ATTEMPTS: u32 = 6;
    /// Fixed delay between discovery attempts, in seconds
    pub const RETRY_DELAY_SECS: u64 = 5;
}

/// Namespace everything is bootstrapped into
pub const ARGOCD_NAMESPACE: &str = "argocd";

/// Name of the ConfigMap holding the cluster configuration
pub const CLUSTER_CONFIG_MAP: &str = "cluster-config";

/// Reserved key inside a secret payload carrying a JSON label map
pub const LABELS_KEY: &str = "_labels";

/// Region used when neither the request nor the environment names one
pub const DEFAULT_REGION: &str = "eu-central-1";
