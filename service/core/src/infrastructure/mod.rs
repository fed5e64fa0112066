// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Infrastructure layer: SQLite persistence, the entrypoint type registry and
//! the external image inventory.

pub mod db;
pub mod entrypoint_types;
pub mod image_inventory;
pub mod store;

pub use db::Database;
pub use entrypoint_types::EntrypointTypeRegistry;
pub use image_inventory::{ImageInventoryClient, InventoryError};
pub use store::{SqliteStore, StoreTransaction};
