//! Plugin Fetcher
//!
//! Resolves registry plugins into the plugin cache

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::cache::PluginCache;
use crate::error::{PromptkitError, Result};
use crate::fs_util;
use crate::plugin::marketplace::{
    find_plugin, parse_marketplace, reject_external_source, resolve_source_path,
};
use crate::plugin::registry::RegistryMirror;
use crate::plugin::types::{
    strip_dot_slash, Marketplace, PluginEntry, PluginSpec, ResolvedPlugin,
};

/// Resolves a plugin spec into concrete files
pub trait PluginFetcher {
    fn fetch(&self, spec: &PluginSpec) -> Result<ResolvedPlugin>;
}

/// Fetches plugins listed in a registry's marketplace.json
pub struct MarketplaceFetcher<M: RegistryMirror> {
    registry_name: String,
    cache: PluginCache,
    mirror: M,
}

impl<M: RegistryMirror> MarketplaceFetcher<M> {
    pub fn new(registry_name: &str, cache: PluginCache, mirror: M) -> Self {
        Self {
            registry_name: registry_name.to_string(),
            cache,
            mirror,
        }
    }

    /// Registry directories to copy and where each lands in the cache entry.
    ///
    /// Every source is checked before anything is written, so a bad entry
    /// never leaves a partial cache directory behind.
    fn plan_copy(
        &self,
        marketplace: &Marketplace,
        entry: &PluginEntry,
    ) -> Result<Vec<(PathBuf, String)>> {
        let clone_dir = self.mirror.clone_dir();

        match &entry.skills {
            Some(skills) if !skills.is_empty() => {
                let mut plan = Vec::new();
                for skill in skills {
                    let relative = strip_dot_slash(skill).trim_end_matches('/');
                    let skill_dir = clone_dir.join(relative);
                    if !skill_dir.is_dir() {
                        warn!(plugin = %entry.name, skill = %relative, "skill directory not found, skipping");
                        continue;
                    }
                    ensure_within(&skill_dir, clone_dir)?;
                    plan.push((skill_dir, relative.to_string()));
                }
                Ok(plan)
            }
            _ => {
                let relative = resolve_source_path(entry, marketplace)?;
                let source_dir = if relative.is_empty() {
                    clone_dir.to_path_buf()
                } else {
                    clone_dir.join(&relative)
                };
                if !source_dir.is_dir() {
                    return Err(PromptkitError::PluginDirNotFound { path: relative });
                }
                ensure_within(&source_dir, clone_dir)?;
                Ok(vec![(source_dir, String::new())])
            }
        }
    }
}

impl<M: RegistryMirror> PluginFetcher for MarketplaceFetcher<M> {
    fn fetch(&self, spec: &PluginSpec) -> Result<ResolvedPlugin> {
        self.mirror.ensure_up_to_date()?;

        let marketplace = parse_marketplace(&self.registry_name, self.mirror.clone_dir())?;
        let plugin_name = spec.plugin_name();
        let entry = find_plugin(&marketplace, &self.registry_name, plugin_name)?;
        reject_external_source(entry)?;

        let sha = self.mirror.commit_sha()?;

        if self.cache.has(&self.registry_name, plugin_name, &sha) {
            debug!(plugin = %plugin_name, sha = %sha, "cache hit");
        } else {
            let plan = self.plan_copy(&marketplace, entry)?;
            let target_dir = self.cache.plugin_dir(&self.registry_name, plugin_name, &sha);
            populate(entry, &plan, &target_dir)?;
            info!(plugin = %plugin_name, registry = %self.registry_name, sha = %sha, "cached plugin");
        }

        let files = self.cache.list_files(&self.registry_name, plugin_name, &sha)?;
        Ok(ResolvedPlugin {
            spec: spec.clone(),
            files,
            source_dir: self.cache.plugin_dir(&self.registry_name, plugin_name, &sha),
            commit_sha: Some(sha),
        })
    }
}

/// Create the cache entry at `target_dir`, removing it again on failure
fn populate(
    entry: &PluginEntry,
    plan: &[(PathBuf, String)],
    target_dir: &Path,
) -> Result<()> {
    let copy_all = || -> std::io::Result<()> {
        fs::create_dir_all(target_dir)?;
        for (source_dir, relative) in plan {
            let dst = if relative.is_empty() {
                target_dir.to_path_buf()
            } else {
                target_dir.join(relative)
            };
            let copied = fs_util::copy_dir(source_dir, &dst)?;
            debug!(plugin = %entry.name, path = %relative, files = copied, "copied plugin files");
        }
        Ok(())
    };

    copy_all().map_err(|e| {
        if let Err(cleanup) = fs::remove_dir_all(target_dir) {
            warn!(path = %target_dir.display(), error = %cleanup, "could not remove partial cache entry");
        }
        fetch_error(entry, e)
    })
}

/// Reject plugin paths that resolve outside the registry clone
fn ensure_within(path: &Path, root: &Path) -> Result<()> {
    let canonical_path = path.canonicalize()?;
    let canonical_root = root.canonicalize()?;
    if !canonical_path.starts_with(&canonical_root) {
        return Err(PromptkitError::PathTraversal {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

fn fetch_error(entry: &PluginEntry, source: std::io::Error) -> PromptkitError {
    PromptkitError::Fetch {
        plugin: entry.name.clone(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use tempfile::TempDir;

    use crate::plugin::marketplace::MARKETPLACE_FILE;

    /// Mirror backed by a plain directory with a fixed commit
    struct FakeMirror {
        dir: PathBuf,
        sha: String,
        syncs: Cell<usize>,
    }

    impl FakeMirror {
        fn new(dir: PathBuf, sha: &str) -> Self {
            Self {
                dir,
                sha: sha.to_string(),
                syncs: Cell::new(0),
            }
        }
    }

    impl RegistryMirror for FakeMirror {
        fn clone_dir(&self) -> &Path {
            &self.dir
        }

        fn ensure_up_to_date(&self) -> Result<()> {
            self.syncs.set(self.syncs.get() + 1);
            Ok(())
        }

        fn commit_sha(&self) -> Result<String> {
            Ok(self.sha.clone())
        }
    }

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn setup_registry(marketplace_json: &str) -> (TempDir, PathBuf) {
        let temp = TempDir::new().unwrap();
        let registry = temp.path().join("registry");
        write(&registry.join(MARKETPLACE_FILE), marketplace_json);
        write(&registry.join(".git/HEAD"), "ref: refs/heads/main");
        (temp, registry)
    }

    fn fetcher(temp: &TempDir, registry: PathBuf, sha: &str) -> MarketplaceFetcher<FakeMirror> {
        MarketplaceFetcher::new(
            "official",
            PluginCache::new(temp.path().join("cache")),
            FakeMirror::new(registry, sha),
        )
    }

    #[test]
    fn test_fetch_single_directory_plugin() {
        let (temp, registry) = setup_registry(
            r#"{"plugins": [{"name": "code-review", "source": "./plugins/code-review"}]}"#,
        );
        write(
            &registry.join("plugins/code-review/agents/reviewer.md"),
            "# Reviewer",
        );
        write(
            &registry.join("plugins/code-review/.claude-plugin/plugin.json"),
            "{}",
        );

        let fetcher = fetcher(&temp, registry, "abc123");
        let plugin = fetcher
            .fetch(&PluginSpec::new("official/code-review"))
            .unwrap();

        assert_eq!(plugin.commit_sha.as_deref(), Some("abc123"));
        assert_eq!(
            plugin.files,
            vec![".claude-plugin/plugin.json", "agents/reviewer.md"]
        );
        assert_eq!(
            plugin.source_dir,
            temp.path().join("cache/official/code-review/abc123")
        );
        assert!(plugin.source_dir.join("agents/reviewer.md").is_file());
        assert_eq!(fetcher.mirror.syncs.get(), 1);
    }

    #[test]
    fn test_fetch_skills_plugin_keeps_registry_paths() {
        let (temp, registry) = setup_registry(
            r#"{"plugins": [{
                "name": "document-skills",
                "source": "./",
                "skills": ["./skills/pdf", "./skills/missing"]
            }]}"#,
        );
        write(&registry.join("skills/pdf/SKILL.md"), "# PDF");
        write(&registry.join("skills/xlsx/SKILL.md"), "# XLSX");

        let plugin = fetcher(&temp, registry, "sha1")
            .fetch(&PluginSpec::new("official/document-skills"))
            .unwrap();

        assert_eq!(plugin.files, vec!["skills/pdf/SKILL.md"]);
    }

    #[test]
    fn test_fetch_with_plugin_root() {
        let (temp, registry) = setup_registry(
            r#"{
                "metadata": {"pluginRoot": "./plugins"},
                "plugins": [{"name": "a", "source": "./a"}]
            }"#,
        );
        write(&registry.join("plugins/a/rules/a.md"), "a");

        let plugin = fetcher(&temp, registry, "sha1")
            .fetch(&PluginSpec::new("official/a"))
            .unwrap();

        assert_eq!(plugin.files, vec!["rules/a.md"]);
    }

    #[test]
    fn test_cache_entry_is_write_once() {
        let (temp, registry) = setup_registry(
            r#"{"plugins": [{"name": "p", "source": "./p"}]}"#,
        );
        write(&registry.join("p/rules/r.md"), "first");

        let fetcher = fetcher(&temp, registry.clone(), "same-sha");
        let spec = PluginSpec::new("official/p");
        fetcher.fetch(&spec).unwrap();

        // Same commit, different mirror content: the cached tree wins
        write(&registry.join("p/rules/r.md"), "second");
        write(&registry.join("p/rules/new.md"), "new");
        let plugin = fetcher.fetch(&spec).unwrap();

        assert_eq!(plugin.files, vec!["rules/r.md"]);
        assert_eq!(
            fs::read_to_string(plugin.source_dir.join("rules/r.md")).unwrap(),
            "first"
        );
    }

    #[test]
    fn test_missing_plugin_directory() {
        let (temp, registry) = setup_registry(
            r#"{"plugins": [{"name": "ghost", "source": "./plugins/ghost"}]}"#,
        );

        let err = fetcher(&temp, registry, "sha1")
            .fetch(&PluginSpec::new("official/ghost"))
            .unwrap_err();

        assert!(matches!(err, PromptkitError::PluginDirNotFound { ref path } if path == "plugins/ghost"));
    }

    #[test]
    fn test_path_traversal_rejected() {
        let (temp, registry) = setup_registry(
            r#"{"plugins": [{"name": "escape", "source": "../outside"}]}"#,
        );
        write(&temp.path().join("outside/rules/x.md"), "x");

        let err = fetcher(&temp, registry, "sha1")
            .fetch(&PluginSpec::new("official/escape"))
            .unwrap_err();

        assert!(matches!(err, PromptkitError::PathTraversal { .. }));
    }

    #[test]
    fn test_failed_fetch_leaves_no_cache_entry() {
        let (temp, registry) = setup_registry(
            r#"{"plugins": [
                {"name": "escape", "source": "../outside"},
                {"name": "ghost", "source": "./plugins/ghost"}
            ]}"#,
        );
        write(&temp.path().join("outside/rules/x.md"), "x");
        let fetcher = fetcher(&temp, registry, "sha1");

        for _ in 0..2 {
            let err = fetcher
                .fetch(&PluginSpec::new("official/escape"))
                .unwrap_err();
            assert!(matches!(err, PromptkitError::PathTraversal { .. }));

            let err = fetcher
                .fetch(&PluginSpec::new("official/ghost"))
                .unwrap_err();
            assert!(matches!(err, PromptkitError::PluginDirNotFound { .. }));
        }

        assert!(!temp.path().join("cache/official/escape/sha1").exists());
        assert!(!temp.path().join("cache/official/ghost/sha1").exists());
    }

    #[test]
    fn test_empty_skills_falls_back_to_source() {
        let (temp, registry) = setup_registry(
            r#"{"plugins": [{"name": "p", "source": "./p", "skills": []}]}"#,
        );
        write(&registry.join("p/agents/a.md"), "a");

        let plugin = fetcher(&temp, registry, "sha1")
            .fetch(&PluginSpec::new("official/p"))
            .unwrap();

        assert_eq!(plugin.files, vec!["agents/a.md"]);
    }

    #[test]
    fn test_unknown_plugin_and_external_source() {
        let (temp, registry) = setup_registry(
            r#"{"plugins": [{"name": "ext", "source": {"source": "github", "repo": "a/b"}}]}"#,
        );
        let fetcher = fetcher(&temp, registry, "sha1");

        let err = fetcher.fetch(&PluginSpec::new("official/nope")).unwrap_err();
        assert!(matches!(err, PromptkitError::PluginNotFound { .. }));

        let err = fetcher.fetch(&PluginSpec::new("official/ext")).unwrap_err();
        assert!(matches!(err, PromptkitError::ExternalSourceUnsupported { .. }));
        assert!(!temp.path().join("cache/official/ext").exists());
    }
}
