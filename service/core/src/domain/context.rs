// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Context
//!
//! A context (historically "tag") scopes which entrypoints are candidates for
//! selection, typically one per target cluster. Contexts are created
//! idempotently from configuration and deleting one never deletes entrypoints.

use serde::{Deserialize, Serialize};

/// A named selection scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    pub id: i64,
    pub name: String,
}
