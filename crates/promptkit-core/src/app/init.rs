//! `promptkit init`

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use tracing::info;

use crate::config::ProjectConfig;
use crate::error::{PromptkitError, Result};
use crate::lock::LockFile;
use crate::project::Project;

const GITIGNORE_FILENAME: &str = ".gitignore";
const GITIGNORE_ENTRY: &str = "\n# promptkit\n.promptkit/cache/\n.promptkit/registries/\n";

#[derive(Debug, Clone)]
pub struct InitResult {
    pub config_path: PathBuf,
    pub lock_path: PathBuf,
}

/// Scaffold a new project. Refuses to touch an existing promptkit.toml.
pub fn init(project: &Project) -> Result<InitResult> {
    let config_path = project.config_path();
    if config_path.exists() {
        return Err(PromptkitError::AlreadyInitialized { path: config_path });
    }

    fs::create_dir_all(project.prompts_dir())?;
    fs::create_dir_all(project.plugin_cache_dir())?;

    ProjectConfig::init(&config_path)?;

    let lock_path = project.lock_path();
    LockFile::default().save(&lock_path)?;

    let mut gitignore = OpenOptions::new()
        .create(true)
        .append(true)
        .open(project.root().join(GITIGNORE_FILENAME))?;
    gitignore.write_all(GITIGNORE_ENTRY.as_bytes())?;

    info!(path = %project.root().display(), "initialized project");
    Ok(InitResult {
        config_path,
        lock_path,
    })
}
