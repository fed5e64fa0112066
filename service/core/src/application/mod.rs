// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod entrypoint_manager;
pub mod launch;
pub mod service_factory;
pub mod validation;

pub use entrypoint_manager::{EntrypointManager, ManagerError};
pub use launch::{LaunchError, LaunchResolver};
pub use service_factory::{build_services, Services};
pub use validation::ValidationPipeline;
