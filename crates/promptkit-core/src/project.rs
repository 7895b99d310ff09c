//! Project layout
//!
//! ```text
//! <project>/
//!   promptkit.toml
//!   promptkit.lock
//!   prompts/
//!   .promptkit/
//!     cache/plugins/
//!     registries/
//!     manifests/
//! ```

use std::path::{Path, PathBuf};

use crate::config::CONFIG_FILENAME;
use crate::lock::LOCK_FILENAME;

pub const PROMPTS_DIR: &str = "prompts";
pub const STATE_DIR: &str = ".promptkit";

#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
}

impl Project {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILENAME)
    }

    pub fn lock_path(&self) -> PathBuf {
        self.root.join(LOCK_FILENAME)
    }

    pub fn prompts_dir(&self) -> PathBuf {
        self.root.join(PROMPTS_DIR)
    }

    pub fn state_dir(&self) -> PathBuf {
        self.root.join(STATE_DIR)
    }

    /// Root of the whole cache (`clean --cache` removes this)
    pub fn cache_dir(&self) -> PathBuf {
        self.state_dir().join("cache")
    }

    pub fn plugin_cache_dir(&self) -> PathBuf {
        self.cache_dir().join("plugins")
    }

    pub fn registries_dir(&self) -> PathBuf {
        self.state_dir().join("registries")
    }

    pub fn manifests_dir(&self) -> PathBuf {
        self.state_dir().join("manifests")
    }

    /// Resolve a configured output directory against the project root
    pub fn output_dir(&self, configured: &str) -> PathBuf {
        let path = Path::new(configured);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let project = Project::new("/work/app");
        assert_eq!(project.config_path(), Path::new("/work/app/promptkit.toml"));
        assert_eq!(project.lock_path(), Path::new("/work/app/promptkit.lock"));
        assert_eq!(
            project.plugin_cache_dir(),
            Path::new("/work/app/.promptkit/cache/plugins")
        );
        assert_eq!(
            project.manifests_dir(),
            Path::new("/work/app/.promptkit/manifests")
        );
        assert_eq!(project.output_dir(".cursor"), Path::new("/work/app/.cursor"));
    }
}
