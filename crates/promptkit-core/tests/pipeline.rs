//! End-to-end lock/build/clean runs against a scratch project.

use std::fs;
use std::path::Path;
use std::process::Command;

use chrono::{TimeZone, Utc};
use tempfile::TempDir;

use promptkit_core::app::{self, FetcherMap, LockPrompts};
use promptkit_core::plugin::git_available;
use promptkit_core::{
    LockEntry, LockFile, Platform, Project, ProjectConfig, PromptkitError,
};

const LOCAL_ONLY_CONFIG: &str = "version = 1\nprompts = []\n";

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn local_project(config: &str) -> (TempDir, Project) {
    let temp = TempDir::new().unwrap();
    let project = Project::new(temp.path());
    write(&project.config_path(), config);
    (temp, project)
}

fn lock_at(project: &Project, secs: i64) -> Vec<LockEntry> {
    let config = ProjectConfig::load(&project.config_path()).unwrap();
    LockPrompts::new(project.clone(), FetcherMap::new())
        .execute_at(&config, Utc.timestamp_opt(secs, 0).unwrap())
        .unwrap()
}

#[test]
fn local_rule_builds_identically_for_both_platforms() {
    let (_temp, project) = local_project(LOCAL_ONLY_CONFIG);
    write(&project.prompts_dir().join("rules/my-rule.md"), "# My Rule");

    app::lock(&project).unwrap();
    let report = app::build(&project).unwrap();

    let cursor = fs::read(project.root().join(".cursor/rules/my-rule.md")).unwrap();
    let claude = fs::read(project.root().join(".claude/rules/my-rule.md")).unwrap();
    assert_eq!(cursor, b"# My Rule");
    assert_eq!(cursor, claude);
    assert_eq!(report.total_files(), 2);
}

#[test]
fn missing_cache_entry_fails_build() {
    let (_temp, project) = local_project(LOCAL_ONLY_CONFIG);
    LockFile::new(vec![LockEntry {
        name: "code-review".to_string(),
        source: "official/code-review".to_string(),
        content_hash: String::new(),
        fetched_at: Utc::now(),
        commit_sha: Some("sha123".to_string()),
    }])
    .save(&project.lock_path())
    .unwrap();

    let err = app::build(&project).unwrap_err();

    assert!(matches!(err, PromptkitError::CacheMissing { .. }));
    let message = err.to_string();
    assert!(message.contains("code-review"));
    assert!(message.contains("sha123"));
    assert!(!project.root().join(".cursor").exists());
    assert!(!project.root().join(".claude").exists());
}

#[test]
fn build_without_lock_file_writes_nothing() {
    let (_temp, project) = local_project(LOCAL_ONLY_CONFIG);

    let err = app::build(&project).unwrap_err();

    assert!(matches!(err, PromptkitError::LockFileNotFound));
    assert!(err.to_string().to_lowercase().contains("lock file not found"));
    assert!(!project.root().join(".cursor").exists());
    assert!(!project.root().join(".claude").exists());
    assert!(!project.state_dir().exists());
}

#[test]
fn relocking_unchanged_project_is_byte_identical() {
    let (_temp, project) = local_project(LOCAL_ONLY_CONFIG);
    write(&project.prompts_dir().join("rules/a.md"), "A");
    write(&project.prompts_dir().join("skills/pdf/SKILL.md"), "PDF");

    lock_at(&project, 1_000);
    let first = fs::read(project.lock_path()).unwrap();
    lock_at(&project, 2_000);
    let second = fs::read(project.lock_path()).unwrap();

    assert_eq!(first, second);
}

#[test]
fn fetched_at_advances_only_for_changed_plugins() {
    let (_temp, project) = local_project(LOCAL_ONLY_CONFIG);
    write(&project.prompts_dir().join("rules/a.md"), "A");
    write(&project.prompts_dir().join("rules/b.md"), "B");
    lock_at(&project, 1_000);

    write(&project.prompts_dir().join("rules/b.md"), "B2");
    let entries = lock_at(&project, 2_000);

    let a = entries.iter().find(|e| e.name == "a").unwrap();
    let b = entries.iter().find(|e| e.name == "b").unwrap();
    assert_eq!(a.fetched_at.timestamp(), 1_000);
    assert_eq!(b.fetched_at.timestamp(), 2_000);
}

#[test]
fn removed_plugins_are_pruned_from_lock_and_output() {
    let (_temp, project) = local_project(LOCAL_ONLY_CONFIG);
    write(&project.prompts_dir().join("rules/keep.md"), "keep");
    write(&project.prompts_dir().join("rules/drop.md"), "drop");
    app::sync(&project).unwrap();
    write(&project.root().join(".claude/rules/mine.md"), "user");

    fs::remove_file(project.prompts_dir().join("rules/drop.md")).unwrap();
    let result = app::sync(&project).unwrap();

    let names: Vec<&str> = result.locked.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["keep"]);
    assert!(!project.root().join(".claude/rules/drop.md").exists());
    assert!(!project.root().join(".cursor/rules/drop.md").exists());
    assert!(project.root().join(".claude/rules/keep.md").exists());
    assert!(project.root().join(".claude/rules/mine.md").exists());
}

#[test]
fn second_output_for_same_platform_is_rejected() {
    let (_temp, project) = local_project(
        "version = 1\nprompts = []\n[platforms]\ncursor = \".cursor\"\nmirror = { type = \"cursor\", output_dir = \"alt\" }\n",
    );
    write(&project.prompts_dir().join("rules/a.md"), "# A");

    let err = app::sync(&project).unwrap_err();

    assert_eq!(err.exit_code(), 4);
    assert!(!project.lock_path().exists());
    assert!(!project.root().join(".cursor").exists());
    assert!(!project.root().join("alt").exists());
}

#[test]
fn clean_after_build_keeps_user_files() {
    let (_temp, project) = local_project(LOCAL_ONLY_CONFIG);
    write(&project.prompts_dir().join("agents/helper.md"), "helper");
    app::sync(&project).unwrap();
    write(&project.root().join(".cursor/agents/custom.md"), "custom");

    let result = app::clean(&project, true).unwrap();

    assert!(result.artifacts_removed);
    assert!(!project.root().join(".cursor/agents/helper.md").exists());
    assert!(!project.root().join(".claude/agents").exists());
    assert!(project.root().join(".cursor/agents/custom.md").exists());
}

fn git(args: &[&str], cwd: &Path) {
    let status = Command::new("git")
        .args(args)
        .current_dir(cwd)
        .output()
        .unwrap()
        .status;
    assert!(status.success(), "git {:?} failed", args);
}

fn commit_all(repo: &Path, message: &str) {
    git(&["add", "."], repo);
    git(
        &[
            "-c",
            "user.name=test",
            "-c",
            "user.email=test@example.com",
            "commit",
            "-q",
            "-m",
            message,
        ],
        repo,
    );
}

#[test]
fn registry_plugin_round_trip_through_git() {
    if !git_available() {
        return;
    }

    let temp = TempDir::new().unwrap();
    // The ".git" suffix keeps the URL unchanged by clone-URL normalization
    let origin = temp.path().join("origin.git");
    write(
        &origin.join(".claude-plugin/marketplace.json"),
        r#"{"plugins": [{"name": "document-skills", "source": "./", "skills": ["./skills/pdf"]}]}"#,
    );
    write(&origin.join("skills/pdf/SKILL.md"), "# PDF v1");
    git(&["init", "-q"], &origin);
    commit_all(&origin, "v1");

    let project_dir = temp.path().join("project");
    let project = Project::new(&project_dir);
    write(
        &project.config_path(),
        &format!(
            "version = 1\nprompts = [{{ source = \"official/document-skills\", platforms = [\"cursor\"] }}]\n\n[registries]\nofficial = \"file://{}\"\n",
            origin.display()
        ),
    );

    let first = app::sync(&project).unwrap();
    let sha1 = first.locked[0].commit_sha.clone().unwrap();
    assert_eq!(
        fs::read_to_string(project_dir.join(".cursor/skills-cursor/pdf/SKILL.md")).unwrap(),
        "# PDF v1"
    );
    assert!(!project_dir.join(".claude/skills").exists());

    write(&origin.join("skills/pdf/SKILL.md"), "# PDF v2");
    commit_all(&origin, "v2");

    let second = app::sync(&project).unwrap();
    let sha2 = second.locked[0].commit_sha.clone().unwrap();
    assert_ne!(sha1, sha2);
    assert_eq!(
        fs::read_to_string(project_dir.join(".cursor/skills-cursor/pdf/SKILL.md")).unwrap(),
        "# PDF v2"
    );
    assert!(project
        .plugin_cache_dir()
        .join("official/document-skills")
        .join(&sha1)
        .is_dir());
    assert_eq!(second.built.platforms.len(), 2);
    assert!(second
        .built
        .platforms
        .iter()
        .any(|p| p.platform == Platform::ClaudeCode && p.files.is_empty()));
}
