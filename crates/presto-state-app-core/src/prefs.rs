// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Stored preferences for the presto-state CLI.

use serde::{Deserialize, Serialize};

/// Config key the CLI stores its preferences under.
pub const PREFS_KEY: &str = "prefs";

/// Saved preferences for the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CliPrefs {
    /// Decoding behavior.
    pub decode: DecodePrefs,
    /// Plan rendering.
    pub plan: PlanPrefs,
}

/// How payloads are decoded and reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DecodePrefs {
    /// Keep the raw payload and report failures instead of aborting.
    pub best_effort: bool,
    /// Pretty-print JSON output.
    pub pretty: bool,
}

/// How plans are printed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanPrefs {
    /// Print each fragment's output layout.
    pub show_layout: bool,
    /// Spaces per nesting level.
    pub indent: usize,
}

impl Default for PlanPrefs {
    fn default() -> Self {
        Self {
            show_layout: false,
            indent: 4,
        }
    }
}

/// Command-line overrides; `None` keeps the stored value.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrefsOverride {
    /// Override for [`DecodePrefs::best_effort`].
    pub best_effort: Option<bool>,
    /// Override for [`DecodePrefs::pretty`].
    pub pretty: Option<bool>,
    /// Override for [`PlanPrefs::show_layout`].
    pub show_layout: Option<bool>,
    /// Override for [`PlanPrefs::indent`].
    pub indent: Option<usize>,
}

impl CliPrefs {
    /// Apply command-line overrides on top of stored preferences.
    pub fn with_overrides(mut self, overrides: PrefsOverride) -> Self {
        if let Some(v) = overrides.best_effort {
            self.decode.best_effort = v;
        }
        if let Some(v) = overrides.pretty {
            self.decode.pretty = v;
        }
        if let Some(v) = overrides.show_layout {
            self.plan.show_layout = v;
        }
        if let Some(v) = overrides.indent {
            self.plan.indent = v;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_documents_fill_defaults() {
        let prefs: CliPrefs = serde_json::from_str(r#"{"decode":{"pretty":true}}"#).unwrap();
        assert!(prefs.decode.pretty);
        assert!(!prefs.decode.best_effort);
        assert_eq!(prefs.plan, PlanPrefs::default());
    }

    #[test]
    fn overrides_only_touch_given_fields() {
        let stored = CliPrefs {
            decode: DecodePrefs {
                best_effort: true,
                pretty: true,
            },
            plan: PlanPrefs::default(),
        };
        let merged = stored.clone().with_overrides(PrefsOverride {
            pretty: Some(false),
            ..PrefsOverride::default()
        });
        assert!(merged.decode.best_effort);
        assert!(!merged.decode.pretty);
        assert_eq!(merged.plan, stored.plan);
    }
}
