//! Provider enablement preferences.
//!
//! The preference store itself is external; the pipeline only reads a
//! snapshot of the enabled-provider map, once per consumer session start.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Mapping from provider name to enabled flag.
///
/// Default-allow: a provider with no entry is enabled, and an entirely
/// empty map means "all enabled" (deliberately distinct from "all
/// disabled", which would need an explicit `false` per provider).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderPreferences(HashMap<String, bool>);

impl ProviderPreferences {
    /// Wraps an explicit enabled-flag map.
    pub fn new(flags: HashMap<String, bool>) -> Self {
        Self(flags)
    }

    /// Whether sources from `provider` should be accepted.
    pub fn allows(&self, provider: &str) -> bool {
        self.0.get(provider).copied().unwrap_or(true)
    }

    /// Marks a provider as disabled.
    pub fn disable(&mut self, provider: &str) {
        self.0.insert(provider.to_string(), false);
    }

    /// Marks a provider as enabled.
    pub fn enable(&mut self, provider: &str) {
        self.0.insert(provider.to_string(), true);
    }
}

/// Read-only view of the external preference store.
pub trait PreferenceStore: Send + Sync {
    /// Snapshot of the enabled-provider map, read once per session start.
    fn enabled_providers(&self) -> ProviderPreferences;
}

/// Preference store backed by a JSON file on disk.
///
/// The file carries the persisted user preferences; only the
/// `enabledProviders` map is read here. A missing or unreadable file
/// yields the empty map, which means all providers enabled.
#[derive(Debug)]
pub struct FilePreferenceStore {
    path: PathBuf,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PreferencesFile {
    #[serde(default)]
    enabled_providers: HashMap<String, bool>,
}

impl FilePreferenceStore {
    /// Creates a store reading from `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn enabled_providers(&self) -> ProviderPreferences {
        let parsed = std::fs::read_to_string(&self.path)
            .ok()
            .and_then(|raw| serde_json::from_str::<PreferencesFile>(&raw).ok())
            .unwrap_or_default();
        ProviderPreferences::new(parsed.enabled_providers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_map_allows_everything() {
        let prefs = ProviderPreferences::default();
        assert!(prefs.allows("A"));
        assert!(prefs.allows("anything"));
    }

    #[test]
    fn missing_entry_is_default_allow() {
        let mut prefs = ProviderPreferences::default();
        prefs.disable("X");
        assert!(!prefs.allows("X"));
        assert!(prefs.allows("Y"));
    }

    #[test]
    fn explicit_true_is_allowed() {
        let mut prefs = ProviderPreferences::default();
        prefs.enable("A");
        prefs.disable("B");
        assert!(prefs.allows("A"));
        assert!(!prefs.allows("B"));
    }

    #[test]
    fn file_store_reads_the_persisted_map() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("marquee-prefs-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"{"theme":"dark","enabledProviders":{"X":false,"A":true}}"#,
        )
        .unwrap();

        let prefs = FilePreferenceStore::new(&path).enabled_providers();
        assert!(!prefs.allows("X"));
        assert!(prefs.allows("A"));
        assert!(prefs.allows("unlisted"));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_file_means_all_enabled() {
        let store = FilePreferenceStore::new("/nonexistent/marquee-prefs.json");
        assert_eq!(store.enabled_providers(), ProviderPreferences::default());
    }
}
