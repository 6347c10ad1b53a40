// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::DEFAULT_REGION;
use std::env;

/// Bootstrap configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Region used when the invocation request does not name one
    pub default_region: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default_region = env::var("AWS_REGION").unwrap_or_else(|_| DEFAULT_REGION.to_string());

        Config { default_region }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
