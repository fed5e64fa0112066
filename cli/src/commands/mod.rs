// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the entrypoint service CLI

pub mod config;
pub mod contexts;
pub mod serve;

pub use self::config::ConfigCommand;
pub use self::contexts::ContextsCommand;
pub use self::serve::ServeArgs;
