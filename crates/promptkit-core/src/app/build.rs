//! `promptkit build`
//!
//! Everything in the lock is resolved from the cache or `prompts/` before
//! any output directory is touched.

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::builder::ArtifactBuilder;
use crate::cache::PluginCache;
use crate::config::ProjectConfig;
use crate::error::{PromptkitError, Result};
use crate::lock::{LockEntry, LockFile};
use crate::platform::Platform;
use crate::plugin::local::local_relative;
use crate::plugin::{LocalPluginFetcher, PluginSpec, ResolvedPlugin};
use crate::project::Project;

/// Output of one platform build
#[derive(Debug, Clone)]
pub struct PlatformBuild {
    pub platform: Platform,
    pub output_dir: PathBuf,
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub platforms: Vec<PlatformBuild>,
}

impl BuildReport {
    pub fn total_files(&self) -> usize {
        self.platforms.iter().map(|p| p.files.len()).sum()
    }
}

/// Materializes locked plugins for every configured platform
pub struct BuildArtifacts {
    project: Project,
    builders: HashMap<Platform, Box<dyn ArtifactBuilder>>,
}

impl BuildArtifacts {
    pub fn new(project: Project, builders: HashMap<Platform, Box<dyn ArtifactBuilder>>) -> Self {
        Self { project, builders }
    }

    /// All plugins are resolved before anything is written, so a missing
    /// lock file or cache entry leaves the output directories untouched.
    pub fn execute(&self) -> Result<BuildReport> {
        let lock = LockFile::load(&self.project.lock_path())?;
        let config = ProjectConfig::load(&self.project.config_path())?;

        let specs: HashMap<&str, &PluginSpec> = config
            .prompts
            .iter()
            .map(|s| (s.source.as_str(), s))
            .collect();

        let plugins = lock
            .prompts
            .iter()
            .map(|entry| self.resolve(entry, specs.get(entry.source.as_str()).copied()))
            .collect::<Result<Vec<_>>>()?;

        let mut report = BuildReport::default();
        for platform_config in &config.platforms {
            let platform = platform_config.platform;
            let Some(builder) = self.builders.get(&platform) else {
                warn!(platform = %platform, "no builder for platform, skipping");
                continue;
            };

            let selected: Vec<ResolvedPlugin> = plugins
                .iter()
                .filter(|p| p.spec.targets_platform(platform))
                .cloned()
                .collect();

            let output_dir = self.project.output_dir(&platform_config.output_dir);
            let files = builder.build(&selected, &output_dir, self.project.root())?;
            report.platforms.push(PlatformBuild {
                platform,
                output_dir,
                files,
            });
        }

        Ok(report)
    }

    /// Rebuild a plugin's file list from its lock entry
    fn resolve(&self, entry: &LockEntry, declared: Option<&PluginSpec>) -> Result<ResolvedPlugin> {
        let spec = declared
            .cloned()
            .unwrap_or_else(|| PluginSpec::new(entry.source.clone()).with_name(entry.name.clone()));

        match &entry.commit_sha {
            Some(sha) => {
                let cache = PluginCache::new(self.project.plugin_cache_dir());
                let (registry, plugin) = (spec.registry_name(), spec.plugin_name());
                if !cache.has(registry, plugin, sha) {
                    return Err(PromptkitError::CacheMissing {
                        name: entry.name.clone(),
                        sha: sha.clone(),
                    });
                }
                debug!(plugin = %entry.name, sha = %sha, "using cached plugin");
                Ok(ResolvedPlugin {
                    files: cache.list_files(registry, plugin, sha)?,
                    source_dir: cache.plugin_dir(registry, plugin, sha),
                    commit_sha: Some(sha.clone()),
                    spec,
                })
            }
            None => {
                let local = LocalPluginFetcher::new(self.project.prompts_dir());
                let relative = local_relative(&entry.source);
                let files = local.resolve_files(relative)?.ok_or_else(|| {
                    PromptkitError::LocalPluginMissing {
                        name: entry.name.clone(),
                        path: relative.to_string(),
                    }
                })?;
                Ok(ResolvedPlugin {
                    files,
                    source_dir: self.project.prompts_dir(),
                    commit_sha: None,
                    spec,
                })
            }
        }
    }
}
