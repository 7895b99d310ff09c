//! Local plugins
//!
//! Plugins that live directly in the project's `prompts/` directory. They are
//! read in place and never cached.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{PromptkitError, Result};
use crate::fs_util;
use crate::platform::DISCOVERY_CATEGORY_DIRS;
use crate::plugin::fetcher::PluginFetcher;
use crate::plugin::types::{PluginSpec, ResolvedPlugin, LOCAL_SOURCE_PREFIX};

const PROMPT_EXTENSION: &str = "md";

pub struct LocalPluginFetcher {
    prompts_dir: PathBuf,
}

impl LocalPluginFetcher {
    pub fn new(prompts_dir: PathBuf) -> Self {
        Self { prompts_dir }
    }

    pub fn prompts_dir(&self) -> &Path {
        &self.prompts_dir
    }

    /// Files of the local plugin at `relative`, or `None` if nothing is there.
    ///
    /// A `<relative>.md` file wins over a `<relative>/` directory.
    pub fn resolve_files(&self, relative: &str) -> Result<Option<Vec<String>>> {
        let file_relative = format!("{}.{}", relative, PROMPT_EXTENSION);
        if self.prompts_dir.join(&file_relative).is_file() {
            return Ok(Some(vec![file_relative]));
        }

        let dir = self.prompts_dir.join(relative);
        if dir.is_dir() {
            let files = fs_util::list_files_relative_to(&dir, &self.prompts_dir)?;
            return Ok(Some(files));
        }

        Ok(None)
    }

    /// Find every plugin under the prompts directory, sorted by source.
    ///
    /// Top-level `.md` files are single-file plugins. Category directories
    /// (`rules/`, `skills/`, ...) hold one plugin per child. Any other
    /// directory is one multi-file plugin.
    pub fn discover(&self) -> Result<Vec<PluginSpec>> {
        let mut specs = Vec::new();

        for (name, path) in visible_entries(&self.prompts_dir)? {
            if path.is_file() {
                if let Some(stem) = prompt_stem(&name) {
                    specs.push(local_spec(stem));
                }
            } else if path.is_dir() {
                if DISCOVERY_CATEGORY_DIRS.contains(&name.as_str()) {
                    for (child, child_path) in visible_entries(&path)? {
                        if child_path.is_dir() {
                            specs.push(local_spec(&format!("{}/{}", name, child)));
                        } else if let Some(stem) = prompt_stem(&child) {
                            specs.push(local_spec(&format!("{}/{}", name, stem)));
                        }
                    }
                } else {
                    specs.push(local_spec(&name));
                }
            }
        }

        specs.sort_by(|a, b| a.source.cmp(&b.source));
        debug!(count = specs.len(), "discovered local plugins");
        Ok(specs)
    }
}

impl PluginFetcher for LocalPluginFetcher {
    fn fetch(&self, spec: &PluginSpec) -> Result<ResolvedPlugin> {
        let relative = local_relative(&spec.source);

        let files = self
            .resolve_files(relative)?
            .ok_or_else(|| PromptkitError::LocalPluginNotFound {
                path: relative.to_string(),
            })?;

        Ok(ResolvedPlugin {
            spec: spec.clone(),
            files,
            source_dir: self.prompts_dir.clone(),
            commit_sha: None,
        })
    }
}

/// Path of a local source inside the prompts directory
pub fn local_relative(source: &str) -> &str {
    source.strip_prefix(LOCAL_SOURCE_PREFIX).unwrap_or(source)
}

fn local_spec(relative: &str) -> PluginSpec {
    PluginSpec::new(format!("{}{}", LOCAL_SOURCE_PREFIX, relative))
}

fn prompt_stem(file_name: &str) -> Option<&str> {
    file_name
        .strip_suffix(PROMPT_EXTENSION)
        .and_then(|s| s.strip_suffix('.'))
        .filter(|s| !s.is_empty())
}

/// Non-hidden entries of `dir`; empty when it does not exist
fn visible_entries(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        entries.push((name, entry.path()));
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn setup() -> (TempDir, LocalPluginFetcher) {
        let temp = TempDir::new().unwrap();
        let fetcher = LocalPluginFetcher::new(temp.path().join("prompts"));
        (temp, fetcher)
    }

    #[test]
    fn test_fetch_single_file() {
        let (_temp, fetcher) = setup();
        write(&fetcher.prompts_dir().join("rules/my-rule.md"), "# My Rule");

        let plugin = fetcher
            .fetch(&PluginSpec::new("local/rules/my-rule"))
            .unwrap();

        assert_eq!(plugin.name(), "my-rule");
        assert_eq!(plugin.files, vec!["rules/my-rule.md"]);
        assert_eq!(plugin.source_dir, fetcher.prompts_dir());
        assert!(!plugin.is_registry());
    }

    #[test]
    fn test_fetch_directory() {
        let (_temp, fetcher) = setup();
        let dir = fetcher.prompts_dir().join("skills/pdf");
        write(&dir.join("SKILL.md"), "# PDF");
        write(&dir.join("scripts/extract.py"), "print()");

        let plugin = fetcher.fetch(&PluginSpec::new("local/skills/pdf")).unwrap();

        assert_eq!(
            plugin.files,
            vec!["skills/pdf/SKILL.md", "skills/pdf/scripts/extract.py"]
        );
    }

    #[test]
    fn test_fetch_missing() {
        let (_temp, fetcher) = setup();
        let err = fetcher
            .fetch(&PluginSpec::new("local/rules/ghost"))
            .unwrap_err();
        assert!(
            matches!(err, PromptkitError::LocalPluginNotFound { ref path } if path == "rules/ghost")
        );
    }

    #[test]
    fn test_discover() {
        let (_temp, fetcher) = setup();
        let root = fetcher.prompts_dir().to_path_buf();
        write(&root.join("readme-helper.md"), "top");
        write(&root.join("notes.txt"), "ignored");
        write(&root.join("rules/a.md"), "a");
        write(&root.join("rules/.hidden.md"), "hidden");
        write(&root.join("skills/pdf/SKILL.md"), "pdf");
        write(&root.join("toolkit/one.md"), "one");
        write(&root.join("toolkit/two.md"), "two");
        write(&root.join(".drafts/x.md"), "hidden");

        let sources: Vec<String> = fetcher
            .discover()
            .unwrap()
            .into_iter()
            .map(|s| s.source)
            .collect();

        assert_eq!(
            sources,
            vec![
                "local/readme-helper",
                "local/rules/a",
                "local/skills/pdf",
                "local/toolkit",
            ]
        );
    }

    #[test]
    fn test_discover_missing_root() {
        let (_temp, fetcher) = setup();
        assert!(fetcher.discover().unwrap().is_empty());
    }
}
