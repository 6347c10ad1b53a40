// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Control plane client construction, upsert primitives, and the generic
//! manifest applier.

pub mod apply;
pub mod client;
pub mod resources;

pub use apply::apply_manifest;
pub use client::ControlPlaneClient;
pub use resources::{ensure_config_map, ensure_namespace, ensure_secret, Upsert};
