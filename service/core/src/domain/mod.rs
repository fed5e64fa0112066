// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain
//!
//! Value objects, capability traits and repository contracts.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Pure model of entrypoints, contexts and selections

pub mod context;
pub mod entrypoint;
pub mod entrypoint_type;
pub mod launch;
pub mod repository;
pub mod schema;
pub mod service_config;
