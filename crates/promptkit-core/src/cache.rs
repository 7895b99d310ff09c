//! Plugin cache
//!
//! Directory store for registry plugin file trees, keyed by
//! `{cache_dir}/{registry}/{plugin}/{commit_sha}/`. Entries are created once
//! by the marketplace fetcher and never overwritten.

use std::fs;
use std::path::PathBuf;

use crate::error::Result;
use crate::fs_util;

pub struct PluginCache {
    cache_dir: PathBuf,
}

impl PluginCache {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    /// Check if a plugin version is cached
    pub fn has(&self, registry: &str, plugin: &str, sha: &str) -> bool {
        self.plugin_dir(registry, plugin, sha).is_dir()
    }

    /// Cache path for a plugin version
    pub fn plugin_dir(&self, registry: &str, plugin: &str, sha: &str) -> PathBuf {
        self.cache_dir.join(registry).join(plugin).join(sha)
    }

    /// All files of a cached plugin version, as sorted relative paths.
    /// Empty when the version is not cached.
    pub fn list_files(&self, registry: &str, plugin: &str, sha: &str) -> Result<Vec<String>> {
        Ok(fs_util::list_files(
            &self.plugin_dir(registry, plugin, sha),
        )?)
    }

    /// Remove every cached plugin. Returns whether anything was removed.
    pub fn clear(&self) -> Result<bool> {
        if !self.cache_dir.is_dir() {
            return Ok(false);
        }
        fs::remove_dir_all(&self.cache_dir)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_cache() -> (PluginCache, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let cache = PluginCache::new(temp_dir.path().join("plugins"));
        (cache, temp_dir)
    }

    #[test]
    fn test_plugin_dir_layout() {
        let (cache, temp) = create_test_cache();
        assert_eq!(
            cache.plugin_dir("official", "code-review", "abc123"),
            temp.path().join("plugins/official/code-review/abc123")
        );
    }

    #[test]
    fn test_has_and_list_files() {
        let (cache, _temp) = create_test_cache();
        assert!(!cache.has("reg", "plugin", "sha"));
        assert!(cache.list_files("reg", "plugin", "sha").unwrap().is_empty());

        let dir = cache.plugin_dir("reg", "plugin", "sha");
        fs::create_dir_all(dir.join("skills/pdf")).unwrap();
        fs::write(dir.join("skills/pdf/SKILL.md"), "# PDF").unwrap();
        fs::write(dir.join("README.md"), "readme").unwrap();

        assert!(cache.has("reg", "plugin", "sha"));
        assert_eq!(
            cache.list_files("reg", "plugin", "sha").unwrap(),
            vec!["README.md", "skills/pdf/SKILL.md"]
        );
    }

    #[test]
    fn test_clear() {
        let (cache, temp) = create_test_cache();
        assert!(!cache.clear().unwrap());

        fs::create_dir_all(cache.plugin_dir("reg", "plugin", "sha")).unwrap();
        assert!(cache.clear().unwrap());
        assert!(!temp.path().join("plugins").exists());
    }
}
