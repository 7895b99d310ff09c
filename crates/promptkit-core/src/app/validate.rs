//! `promptkit validate`: config and lock consistency checks

use std::collections::HashSet;
use std::fmt;

use crate::config::ProjectConfig;
use crate::lock::LockFile;
use crate::project::Project;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueLevel {
    Error,
    Warning,
}

impl fmt::Display for IssueLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub level: IssueLevel,
    pub message: String,
}

impl ValidationIssue {
    fn error(message: impl Into<String>) -> Self {
        Self {
            level: IssueLevel::Error,
            message: message.into(),
        }
    }

    fn warning(message: impl Into<String>) -> Self {
        Self {
            level: IssueLevel::Warning,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Warnings alone never make a project invalid
    pub fn is_valid(&self) -> bool {
        self.errors().next().is_none()
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.level == IssueLevel::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.level == IssueLevel::Warning)
    }
}

/// Check promptkit.toml and its consistency with promptkit.lock
pub fn validate(project: &Project) -> ValidationReport {
    let mut report = ValidationReport::default();

    let config = match ProjectConfig::load(&project.config_path()) {
        Ok(config) => config,
        Err(e) => {
            report.issues.push(ValidationIssue::error(e.to_string()));
            return report;
        }
    };

    let registries: HashSet<&str> = config.registries.iter().map(|r| r.name.as_str()).collect();
    for spec in config.prompts.iter().filter(|s| !s.is_local()) {
        if !registries.contains(spec.registry_name()) {
            report.issues.push(ValidationIssue::error(format!(
                "Prompt '{}' references undefined registry '{}'",
                spec.source,
                spec.registry_name()
            )));
        }
    }

    let lock_path = project.lock_path();
    if !lock_path.exists() {
        report.issues.push(ValidationIssue::warning(
            "No lock file found. Run 'promptkit lock' to create one.",
        ));
        return report;
    }

    let lock = match LockFile::load(&lock_path) {
        Ok(lock) => lock,
        Err(e) => {
            report.issues.push(ValidationIssue::error(e.to_string()));
            return report;
        }
    };

    for spec in &config.prompts {
        if lock.find_by_source(&spec.source).is_none() {
            report.issues.push(ValidationIssue::warning(format!(
                "Prompt '{}' is not locked. Run 'promptkit lock' to update.",
                spec.source
            )));
        }
    }

    let declared: HashSet<&str> = config.prompts.iter().map(|s| s.source.as_str()).collect();
    for entry in lock.prompts.iter().filter(|e| e.is_registry()) {
        if !declared.contains(entry.source.as_str()) {
            report.issues.push(ValidationIssue::warning(format!(
                "Lock entry '{}' (source: {}) is stale. Run 'promptkit lock' to update.",
                entry.name, entry.source
            )));
        }
    }

    report
}
