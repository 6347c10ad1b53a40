// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! AWS collaborators: cluster registry, token service, and secret store.

pub mod registry;
pub mod secrets;
pub mod sts;

pub use registry::{ClusterTarget, EksClusterRegistry};
pub use secrets::{SecretRecord, SecretStore, SecretsManagerStore};
