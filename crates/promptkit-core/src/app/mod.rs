//! Use cases behind the CLI commands.

mod build;
mod clean;
mod init;
mod lock;
mod validate;

pub use build::{BuildArtifacts, BuildReport, PlatformBuild};
pub use clean::{clean, CleanResult};
pub use init::{init, InitResult};
pub use lock::{registry_fetchers, FetcherMap, LockPrompts};
pub use validate::{validate, IssueLevel, ValidationIssue, ValidationReport};

use crate::builder::default_builders;
use crate::config::ProjectConfig;
use crate::error::Result;
use crate::lock::LockEntry;
use crate::project::Project;

/// Lock every plugin from the project's registries and prompts directory
pub fn lock(project: &Project) -> Result<Vec<LockEntry>> {
    let config = ProjectConfig::load(&project.config_path())?;
    let fetchers = registry_fetchers(project, &config)?;
    LockPrompts::new(project.clone(), fetchers).execute(&config)
}

/// Build every configured platform from the lock file
pub fn build(project: &Project) -> Result<BuildReport> {
    BuildArtifacts::new(project.clone(), default_builders()).execute()
}

#[derive(Debug)]
pub struct SyncResult {
    pub locked: Vec<LockEntry>,
    pub built: BuildReport,
}

/// `lock` followed by `build`
pub fn sync(project: &Project) -> Result<SyncResult> {
    let locked = lock(project)?;
    let built = build(project)?;
    Ok(SyncResult { locked, built })
}
