//! Plugin type definitions
//!
//! Specs declared in promptkit.toml, plugins resolved against their source,
//! and the Claude Code marketplace.json documents registries publish.

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::platform::Platform;

/// Source prefix for plugins living in the project's prompts directory
pub const LOCAL_SOURCE_PREFIX: &str = "local/";

/// Declared intent to include a plugin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginSpec {
    /// `<registry>/<name>` or `local/<relative-path>`
    pub source: String,
    /// Display and lock name
    pub name: String,
    /// Target platforms (empty = all)
    pub platforms: BTreeSet<Platform>,
}

impl PluginSpec {
    /// Spec with the name derived from the source and no platform filter
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let name = default_name(&source);
        Self {
            source,
            name,
            platforms: BTreeSet::new(),
        }
    }

    /// Override the derived name. Empty names keep the default.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !name.is_empty() {
            self.name = name;
        }
        self
    }

    pub fn with_platforms(mut self, platforms: impl IntoIterator<Item = Platform>) -> Self {
        self.platforms = platforms.into_iter().collect();
        self
    }

    /// Registry part of the source (before the first '/')
    pub fn registry_name(&self) -> &str {
        self.source
            .split_once('/')
            .map(|(registry, _)| registry)
            .unwrap_or(&self.source)
    }

    /// Plugin part of the source (after the first '/')
    pub fn plugin_name(&self) -> &str {
        self.source
            .split_once('/')
            .map(|(_, name)| name)
            .unwrap_or(&self.source)
    }

    pub fn is_local(&self) -> bool {
        self.source.starts_with(LOCAL_SOURCE_PREFIX)
    }

    /// Whether this plugin should be built for `platform`
    pub fn targets_platform(&self, platform: Platform) -> bool {
        self.platforms.is_empty() || self.platforms.contains(&platform)
    }
}

fn default_name(source: &str) -> String {
    source
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(source)
        .to_string()
}

/// A plugin resolved against its source: which files, and where they live
#[derive(Debug, Clone)]
pub struct ResolvedPlugin {
    pub spec: PluginSpec,
    /// Sorted, unique, `/`-separated paths relative to `source_dir`
    pub files: Vec<String>,
    pub source_dir: PathBuf,
    /// Set for registry plugins only
    pub commit_sha: Option<String>,
}

impl ResolvedPlugin {
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn source(&self) -> &str {
        &self.spec.source
    }

    pub fn is_registry(&self) -> bool {
        self.commit_sha.is_some()
    }
}

// ========== marketplace.json ==========

/// Claude Code Plugin Marketplace (parsed from marketplace.json)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Marketplace {
    /// Marketplace name
    #[serde(default)]
    pub name: Option<String>,
    /// Available plugins
    #[serde(default)]
    pub plugins: Vec<PluginEntry>,
    /// Optional metadata
    #[serde(default)]
    pub metadata: Option<MarketplaceMetadata>,
}

impl Marketplace {
    /// Base directory for relative plugin paths, without a leading `./`
    pub fn plugin_root(&self) -> &str {
        self.metadata
            .as_ref()
            .and_then(|m| m.plugin_root.as_deref())
            .map(strip_dot_slash)
            .unwrap_or("")
    }

    /// Find a plugin entry by name
    pub fn find_plugin(&self, name: &str) -> Option<&PluginEntry> {
        self.plugins.iter().find(|p| p.name == name)
    }
}

/// Optional marketplace metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketplaceMetadata {
    /// Base directory for relative plugin paths
    #[serde(default, rename = "pluginRoot")]
    pub plugin_root: Option<String>,
}

/// Plugin entry in marketplace.json
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginEntry {
    /// Plugin name (unique identifier within marketplace)
    pub name: String,
    /// Source location
    #[serde(default)]
    pub source: Option<PluginSource>,
    /// Explicit skill directories, copied with their registry-relative paths
    #[serde(default)]
    pub skills: Option<Vec<String>>,
}

/// Where a plugin entry's files come from
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PluginSource {
    /// Relative path (e.g., "./plugins/my-plugin")
    Relative(String),
    /// External source (github/url); not supported for fetching
    Structured(serde_json::Value),
}

/// Strip leading `./` segments from a registry-relative path
pub fn strip_dot_slash(path: &str) -> &str {
    let mut path = path;
    while let Some(rest) = path.strip_prefix("./") {
        path = rest;
    }
    path
}
