//! Artifact builders
//!
//! Materialize resolved plugins into a platform's output directory. Each
//! build first removes what the previous build wrote (per the platform's
//! manifest), then copies the current files and records them.

mod claude;
mod cursor;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{PromptkitError, Result};
use crate::fs_util;
use crate::manifest::ManifestTracker;
use crate::platform::Platform;
use crate::plugin::ResolvedPlugin;
use crate::project::Project;

pub use claude::ClaudeBuilder;
pub use cursor::CursorBuilder;

/// Builds plugin artifacts for one platform
pub trait ArtifactBuilder {
    fn platform(&self) -> Platform;

    /// Write `plugins` into `output_dir`, returning the absolute paths written
    fn build(
        &self,
        plugins: &[ResolvedPlugin],
        output_dir: &Path,
        project_dir: &Path,
    ) -> Result<Vec<PathBuf>>;
}

/// One builder per supported platform
pub fn default_builders() -> HashMap<Platform, Box<dyn ArtifactBuilder>> {
    let builders: Vec<Box<dyn ArtifactBuilder>> =
        vec![Box::new(CursorBuilder), Box::new(ClaudeBuilder)];
    builders.into_iter().map(|b| (b.platform(), b)).collect()
}

/// Shared build routine: clean previous output, map, copy, record.
///
/// On failure the manifest is left untouched and already copied files stay.
pub(crate) fn build_platform(
    platform: Platform,
    plugins: &[ResolvedPlugin],
    output_dir: &Path,
    project_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let tracker = ManifestTracker::new(Project::new(project_dir).manifests_dir());

    let previous = tracker.read(platform)?;
    let removed = tracker.cleanup(output_dir, &previous)?;
    if removed > 0 {
        debug!(platform = %platform, removed, "removed previous artifacts");
    }

    let mut written_relative = Vec::new();
    let mut written = Vec::new();

    for plugin in plugins {
        for relative in &plugin.files {
            let Some(mapped) = platform.map_path(relative) else {
                debug!(platform = %platform, plugin = %plugin.name(), path = %relative, "skipping uncategorized file");
                continue;
            };

            let dst = output_dir.join(&mapped);
            fs_util::copy_file(&plugin.source_dir.join(relative), &dst).map_err(|source| {
                PromptkitError::Copy {
                    plugin: plugin.name().to_string(),
                    path: relative.clone(),
                    source,
                }
            })?;

            written.push(dst);
            written_relative.push(mapped);
        }
    }

    tracker.write(platform, &written_relative)?;
    info!(platform = %platform, files = written.len(), output = %output_dir.display(), "built artifacts");

    Ok(written)
}
