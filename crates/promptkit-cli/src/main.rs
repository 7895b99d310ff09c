use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use clap_complete::generate;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use promptkit_core::app::{self, BuildReport};
use promptkit_core::{IssueLevel, LockEntry, Project, PromptkitError, Result};

mod args;
use args::{Cli, Commands, Shell};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let project = Project::new(resolve_project_dir(cli.project_dir));

    let result = match cli.command {
        Some(Commands::Init) => handle_init(&project),
        Some(Commands::Lock) => handle_lock(&project),
        Some(Commands::Build) => handle_build(&project),
        Some(Commands::Sync) => handle_sync(&project),
        Some(Commands::Clean { cache }) => handle_clean(&project, cache),
        Some(Commands::Validate) => handle_validate(&project),
        Some(Commands::Completions { shell }) => {
            handle_completions(shell);
            Ok(())
        }
        None => {
            Cli::command().print_help().ok();
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "[ERROR]".red().bold(), e);
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

/// 0 = warn, 1 = info, 2+ = debug; `RUST_LOG` wins when set
fn init_tracing(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, _) => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("promptkit={level},promptkit_core={level}"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn resolve_project_dir(cli_dir: Option<PathBuf>) -> PathBuf {
    cli_dir.unwrap_or_else(|| PathBuf::from("."))
}

fn handle_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let shell = match shell {
        Shell::Bash => clap_complete::Shell::Bash,
        Shell::Zsh => clap_complete::Shell::Zsh,
        Shell::Fish => clap_complete::Shell::Fish,
        Shell::PowerShell => clap_complete::Shell::PowerShell,
        Shell::Elvish => clap_complete::Shell::Elvish,
    };
    generate(shell, &mut cmd, "promptkit", &mut io::stdout());
}

fn handle_init(project: &Project) -> Result<()> {
    let result = app::init(project)?;
    println!(
        "{} {}",
        "[OK]".green().bold(),
        format!("Created {}", display_relative(project, &result.config_path)).bold()
    );
    println!("  {} {}", "+".green(), display_relative(project, &result.lock_path));
    println!("  {} {}", "+".green(), display_relative(project, &project.prompts_dir()));
    println!();
    println!("Add prompts to promptkit.toml, then run {}", "promptkit sync".cyan());
    Ok(())
}

fn handle_lock(project: &Project) -> Result<()> {
    let entries = app::lock(project)?;
    print_locked(&entries);
    Ok(())
}

fn handle_build(project: &Project) -> Result<()> {
    let report = app::build(project)?;
    print_built(project, &report);
    Ok(())
}

fn handle_sync(project: &Project) -> Result<()> {
    let result = app::sync(project)?;
    print_locked(&result.locked);
    print_built(project, &result.built);
    Ok(())
}

fn handle_clean(project: &Project, cache: bool) -> Result<()> {
    let result = app::clean(project, cache)?;

    if result.artifacts_removed {
        println!("{} Removed generated artifacts", "[OK]".green().bold());
    } else {
        println!("{} No generated artifacts found", "[INFO]".blue());
    }
    if cache {
        if result.cache_removed {
            println!("{} Removed plugin cache", "[OK]".green().bold());
        } else {
            println!("{} No plugin cache found", "[INFO]".blue());
        }
    }
    Ok(())
}

fn handle_validate(project: &Project) -> Result<()> {
    let report = app::validate(project);

    for issue in &report.issues {
        let label = match issue.level {
            IssueLevel::Error => "[ERROR]".red().bold(),
            IssueLevel::Warning => "[WARN]".yellow().bold(),
        };
        println!("{} {}", label, issue.message);
    }

    if !report.is_valid() {
        return Err(PromptkitError::validation(format!(
            "Validation failed with {} error(s)",
            report.errors().count()
        )));
    }

    let warnings = report.warnings().count();
    if warnings == 0 {
        println!("{} Configuration is valid", "[OK]".green().bold());
    } else {
        println!(
            "{} Configuration is valid ({} warning(s))",
            "[OK]".green().bold(),
            warnings
        );
    }
    Ok(())
}

fn print_locked(entries: &[LockEntry]) {
    println!(
        "{} Locked {} prompt(s)",
        "[OK]".green().bold(),
        entries.len()
    );
    for entry in entries {
        let version = match &entry.commit_sha {
            Some(sha) => short(sha).to_string(),
            None => short(entry.content_hash.trim_start_matches("sha256:")).to_string(),
        };
        println!(
            "  {} {} {}",
            entry.name.cyan(),
            format!("({})", entry.source).dimmed(),
            version.yellow()
        );
    }
}

fn print_built(project: &Project, report: &BuildReport) {
    for build in &report.platforms {
        println!(
            "{} {}: {} file(s) -> {}",
            "[OK]".green().bold(),
            build.platform.name().bold(),
            build.files.len(),
            display_relative(project, &build.output_dir)
        );
    }
}

fn short(id: &str) -> &str {
    id.get(..12).unwrap_or(id)
}

fn display_relative(project: &Project, path: &Path) -> String {
    path.strip_prefix(project.root())
        .unwrap_or(path)
        .display()
        .to_string()
}
