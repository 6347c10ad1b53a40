// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! One-shot cluster bootstrap: priority batches, secret import, and the
//! orchestrator tying the stages together.

pub mod batches;
pub mod orchestrator;
pub mod secrets;

pub use orchestrator::{bootstrap, run_with};
