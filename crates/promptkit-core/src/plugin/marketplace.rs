//! Marketplace Parser
//!
//! Parses Claude Code Plugin marketplace.json files

use std::fs;
use std::path::Path;

use crate::error::{PromptkitError, Result};
use crate::plugin::types::{strip_dot_slash, Marketplace, PluginEntry, PluginSource};

pub const MARKETPLACE_FILE: &str = ".claude-plugin/marketplace.json";

/// Parse marketplace.json from a registry checkout
pub fn parse_marketplace(registry: &str, marketplace_dir: &Path) -> Result<Marketplace> {
    let path = marketplace_dir.join(MARKETPLACE_FILE);

    if !path.is_file() {
        return Err(PromptkitError::MarketplaceNotFound {
            registry: registry.to_string(),
            path,
        });
    }

    let content = fs::read_to_string(&path)?;
    serde_json::from_str(&content).map_err(|e| PromptkitError::MarketplaceParse {
        path: path.clone(),
        message: e.to_string(),
    })
}

/// Look up a plugin entry, failing with a sync error when it is absent
pub fn find_plugin<'a>(
    marketplace: &'a Marketplace,
    registry: &str,
    name: &str,
) -> Result<&'a PluginEntry> {
    marketplace
        .find_plugin(name)
        .ok_or_else(|| PromptkitError::PluginNotFound {
            plugin: name.to_string(),
            registry: registry.to_string(),
        })
}

/// Registry-relative directory of a single-directory plugin.
///
/// Combines `metadata.pluginRoot` with the entry's own `source`. Structured
/// (external) sources are rejected.
pub fn resolve_source_path(entry: &PluginEntry, marketplace: &Marketplace) -> Result<String> {
    let path = match &entry.source {
        Some(PluginSource::Relative(path)) => strip_dot_slash(path).trim_end_matches('/'),
        Some(PluginSource::Structured(_)) => {
            return Err(PromptkitError::ExternalSourceUnsupported {
                plugin: entry.name.clone(),
            })
        }
        None => "",
    };

    let plugin_root = marketplace.plugin_root().trim_end_matches('/');
    Ok(match (plugin_root.is_empty(), path.is_empty()) {
        (true, _) => path.to_string(),
        (false, true) => plugin_root.to_string(),
        (false, false) => format!("{}/{}", plugin_root, path),
    })
}

/// Reject structured sources up front, before any cache work
pub fn reject_external_source(entry: &PluginEntry) -> Result<()> {
    match entry.source {
        Some(PluginSource::Structured(_)) => Err(PromptkitError::ExternalSourceUnsupported {
            plugin: entry.name.clone(),
        }),
        _ => Ok(()),
    }
}
