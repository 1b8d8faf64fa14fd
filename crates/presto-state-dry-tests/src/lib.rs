// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared test doubles and fixtures for presto-state crates.
#![forbid(unsafe_code)]
//!
//! # Modules
//!
//! - [`config`] - In-memory config store fake for testing without filesystem
//! - [`fixtures`] - Coordinator-state JSON payload builders

pub mod config;
pub mod fixtures;

pub use config::InMemoryConfigStore;
pub use fixtures::{QueryInfoBuilder, StageInfoBuilder, TaskInfoBuilder};
