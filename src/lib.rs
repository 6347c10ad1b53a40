// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
pub mod aws;
pub mod bootstrap;
pub mod config;
pub mod constants;
pub mod error;
pub mod kubernetes;
pub mod request;
pub mod retry;

#[cfg(test)]
pub mod test_utils;
