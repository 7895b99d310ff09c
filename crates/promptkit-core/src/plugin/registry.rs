//! Registry mirror
//!
//! Keeps a shallow git clone of a marketplace registry current.
//! Mirrors live at `{registries_dir}/{registry_name}/`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tracing::{debug, info, warn};

use crate::error::{PromptkitError, Result};

const GIT_CLONE_DEPTH: &str = "1";

/// A local mirror of a registry repository
pub trait RegistryMirror {
    /// Directory holding the mirrored checkout
    fn clone_dir(&self) -> &Path;

    /// Bring the mirror up to date with its remote
    fn ensure_up_to_date(&self) -> Result<()>;

    /// HEAD commit of the mirror. Only valid after `ensure_up_to_date`.
    fn commit_sha(&self) -> Result<String>;
}

/// Shallow git clone of a registry
#[derive(Debug)]
pub struct GitRegistryClone {
    registry_name: String,
    clone_url: String,
    clone_dir: PathBuf,
}

impl GitRegistryClone {
    /// Create a mirror handle. Fails if git is not installed.
    pub fn new(registry_name: &str, registry_url: &str, registries_dir: &Path) -> Result<Self> {
        check_git_available()?;

        Ok(Self {
            registry_name: registry_name.to_string(),
            clone_url: to_clone_url(registry_url),
            clone_dir: registries_dir.join(registry_name),
        })
    }

    fn is_valid_clone(&self) -> bool {
        self.clone_dir.join(".git").is_dir()
    }

    /// Delete any existing directory and clone fresh
    fn fresh_clone(&self) -> Result<()> {
        if self.clone_dir.exists() {
            fs::remove_dir_all(&self.clone_dir)?;
        }
        if let Some(parent) = self.clone_dir.parent() {
            fs::create_dir_all(parent)?;
        }

        info!(registry = %self.registry_name, url = %self.clone_url, "cloning registry");
        let target = self.clone_dir.to_string_lossy();
        run_git(&[
            "clone",
            "--depth",
            GIT_CLONE_DEPTH,
            self.clone_url.as_str(),
            &*target,
        ])?;
        Ok(())
    }
}

impl RegistryMirror for GitRegistryClone {
    fn clone_dir(&self) -> &Path {
        &self.clone_dir
    }

    fn ensure_up_to_date(&self) -> Result<()> {
        if !self.is_valid_clone() {
            return self.fresh_clone();
        }

        debug!(registry = %self.registry_name, "pulling registry");
        run_git_in(&self.clone_dir, &["pull"])
            .map(|_| ())
            .or_else(|e| {
                warn!(registry = %self.registry_name, error = %e, "pull failed, re-cloning");
                self.fresh_clone()
            })
    }

    fn commit_sha(&self) -> Result<String> {
        let output = run_git_in(&self.clone_dir, &["rev-parse", "HEAD"])?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Run a git command, turning a non-zero exit into a sync error
fn run_git(args: &[&str]) -> Result<Output> {
    let mut command = Command::new("git");
    command.args(args);
    output_of(command, args)
}

/// Run a git command against the repository at `repo` and nothing else.
///
/// Without an explicit git dir, git walks up from a broken checkout and
/// would operate on whatever repository encloses it.
fn run_git_in(repo: &Path, args: &[&str]) -> Result<Output> {
    let mut command = Command::new("git");
    command
        .arg("--git-dir")
        .arg(repo.join(".git"))
        .arg("--work-tree")
        .arg(repo)
        .args(args)
        .current_dir(repo);
    output_of(command, args)
}

fn output_of(mut command: Command, args: &[&str]) -> Result<Output> {
    let output = command.output().map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => PromptkitError::GitNotFound,
        _ => PromptkitError::Io(e),
    })?;

    if !output.status.success() {
        return Err(PromptkitError::GitCommand {
            command: args.join(" "),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(output)
}

fn check_git_available() -> Result<()> {
    match Command::new("git").arg("--version").output() {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(PromptkitError::GitNotFound),
        Err(e) => Err(PromptkitError::Io(e)),
    }
}

/// Whether a usable git executable is on PATH
pub fn git_available() -> bool {
    check_git_available().is_ok()
}

/// Normalize a registry URL into a clone URL
pub fn to_clone_url(registry_url: &str) -> String {
    let url = registry_url.trim_end_matches('/');
    if url.ends_with(".git") {
        url.to_string()
    } else {
        format!("{}.git", url)
    }
}
