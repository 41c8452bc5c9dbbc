//! Agent profile catalog.

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantEntry {
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentProfile {
    pub label: String,
    /// Ordered; the first entry is the preferred default.
    #[serde(default)]
    pub variants: Vec<VariantEntry>,
}

impl AgentProfile {
    pub fn get_variant(&self, label: &str) -> Option<&VariantEntry> {
        self.variants.iter().find(|v| v.label == label)
    }
}

/// Profiles known to the backend, keyed by label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileCatalog {
    #[serde(default)]
    pub profiles: Vec<AgentProfile>,
}

impl ProfileCatalog {
    pub fn new(profiles: Vec<AgentProfile>) -> Self {
        Self { profiles }
    }

    pub fn get_profile(&self, label: &str) -> Option<&AgentProfile> {
        self.profiles.iter().find(|p| p.label == label)
    }

    /// First variant label of `profile`, if the profile exists and has any.
    pub fn first_variant(&self, profile: &str) -> Option<&str> {
        self.get_profile(profile)
            .and_then(|p| p.variants.first())
            .map(|v| v.label.as_str())
    }

    /// Load a `profiles.json` file. Falls back to an empty catalog when the
    /// file is missing or invalid.
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("Failed to read {}: {}, using empty catalog", path.display(), e);
                return Self::default();
            }
        };

        match serde_json::from_str::<Self>(&content) {
            Ok(catalog) => {
                tracing::info!(
                    "Loaded {} profiles from {}",
                    catalog.profiles.len(),
                    path.display()
                );
                catalog
            }
            Err(e) => {
                tracing::warn!("Failed to parse {}: {}, using empty catalog", path.display(), e);
                Self::default()
            }
        }
    }
}
