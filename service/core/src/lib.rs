// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Entrypoint Service Core
//!
//! User-owned launch configurations ("entrypoints"), the contexts they are
//! tagged with, and the per-context selection the hub launches from.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Domain model, persistence and launch rendering for entrypoints

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
