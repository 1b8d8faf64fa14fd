// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared application services for presto-state tools (config, prefs).
//! Keeps CLI adapters thin and storage-agnostic.

pub mod config;
pub mod prefs;
