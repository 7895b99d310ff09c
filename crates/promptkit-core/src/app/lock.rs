//! `promptkit lock`

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::cache::PluginCache;
use crate::config::{ProjectConfig, Registry, RegistryType};
use crate::error::{PromptkitError, Result};
use crate::lock::{reconcile, LockEntry, LockFile};
use crate::plugin::{
    GitRegistryClone, LocalPluginFetcher, MarketplaceFetcher, PluginFetcher, ResolvedPlugin,
};
use crate::project::Project;

/// Fetchers keyed by registry name
pub type FetcherMap = HashMap<String, Box<dyn PluginFetcher>>;

/// Fetchers for every registry a declared prompt refers to, by registry type.
///
/// Registries nobody uses are skipped, so a project with only local prompts
/// never needs git.
pub fn registry_fetchers(project: &Project, config: &ProjectConfig) -> Result<FetcherMap> {
    let used: HashSet<&str> = config
        .prompts
        .iter()
        .filter(|spec| !spec.is_local())
        .map(|spec| spec.registry_name())
        .collect();

    let mut fetchers = FetcherMap::new();
    for registry in config
        .registries
        .iter()
        .filter(|r| used.contains(r.name.as_str()))
    {
        fetchers.insert(registry.name.clone(), fetcher_for_registry(project, registry)?);
    }
    Ok(fetchers)
}

fn fetcher_for_registry(project: &Project, registry: &Registry) -> Result<Box<dyn PluginFetcher>> {
    match registry.registry_type {
        RegistryType::ClaudeMarketplace => {
            let mirror =
                GitRegistryClone::new(&registry.name, &registry.url, &project.registries_dir())?;
            let cache = PluginCache::new(project.plugin_cache_dir());
            Ok(Box::new(MarketplaceFetcher::new(&registry.name, cache, mirror)))
        }
    }
}

/// Resolves every plugin and rewrites promptkit.lock
pub struct LockPrompts {
    project: Project,
    fetchers: FetcherMap,
    local: LocalPluginFetcher,
}

impl LockPrompts {
    pub fn new(project: Project, fetchers: FetcherMap) -> Self {
        let local = LocalPluginFetcher::new(project.prompts_dir());
        Self {
            project,
            fetchers,
            local,
        }
    }

    pub fn execute(&self, config: &ProjectConfig) -> Result<Vec<LockEntry>> {
        self.execute_at(config, Utc::now())
    }

    /// Same as [`LockPrompts::execute`] with a fixed clock
    pub fn execute_at(&self, config: &ProjectConfig, now: DateTime<Utc>) -> Result<Vec<LockEntry>> {
        let lock_path = self.project.lock_path();
        let existing = LockFile::load_or_default(&lock_path)?.by_source();

        let plugins = self.resolve_all(config)?;
        let entries = reconcile(&plugins, &existing, now)?;

        LockFile::new(entries.clone()).save(&lock_path)?;
        info!(prompts = entries.len(), path = %lock_path.display(), "wrote lock file");
        Ok(entries)
    }

    fn resolve_all(&self, config: &ProjectConfig) -> Result<Vec<ResolvedPlugin>> {
        let mut plugins = Vec::new();
        let mut seen = HashSet::new();

        for spec in &config.prompts {
            let plugin = if spec.is_local() {
                self.local.fetch(spec)?
            } else {
                self.fetcher_for(spec.registry_name())?.fetch(spec)?
            };
            seen.insert(spec.source.clone());
            plugins.push(plugin);
        }

        for spec in self.local.discover()? {
            if seen.contains(&spec.source) {
                debug!(source = %spec.source, "already declared in config");
                continue;
            }
            plugins.push(self.local.fetch(&spec)?);
        }

        Ok(plugins)
    }

    fn fetcher_for(&self, registry: &str) -> Result<&dyn PluginFetcher> {
        self.fetchers
            .get(registry)
            .map(|f| f.as_ref())
            .ok_or_else(|| PromptkitError::NoFetcher {
                registry: registry.to_string(),
            })
    }
}
