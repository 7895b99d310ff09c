//! `promptkit clean`

use tracing::{debug, info};

use crate::cache::PluginCache;
use crate::config::ProjectConfig;
use crate::error::Result;
use crate::fs_util;
use crate::manifest::ManifestTracker;
use crate::project::Project;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CleanResult {
    pub artifacts_removed: bool,
    pub cache_removed: bool,
}

/// Remove every file promptkit wrote, and optionally the cache.
///
/// User files in the output directories are left alone. Output directories
/// come from promptkit.toml when it loads, else the platform defaults.
pub fn clean(project: &Project, include_cache: bool) -> Result<CleanResult> {
    let tracker = ManifestTracker::new(project.manifests_dir());
    let config = ProjectConfig::load(&project.config_path()).ok();

    let mut result = CleanResult::default();
    for platform in tracker.list_platforms()? {
        let configured = config.as_ref().and_then(|c| c.output_dir(platform));
        let output_dir =
            project.output_dir(configured.unwrap_or_else(|| platform.default_output_dir()));

        let paths = tracker.read(platform)?;
        let removed = tracker.cleanup(&output_dir, &paths)?;
        tracker.remove(platform)?;
        debug!(platform = %platform, removed, "cleaned platform");
        result.artifacts_removed = true;
    }

    if include_cache {
        result.cache_removed = PluginCache::new(project.plugin_cache_dir()).clear()?;
        fs_util::remove_empty_parents(&project.cache_dir(), &project.state_dir());
    }

    info!(
        artifacts = result.artifacts_removed,
        cache = result.cache_removed,
        "clean finished"
    );
    Ok(result)
}
