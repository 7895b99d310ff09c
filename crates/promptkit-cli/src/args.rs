use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "promptkit")]
#[command(about = "Package manager for AI prompts, rules, skills and agents")]
#[command(version)]
pub struct Cli {
    /// Verbose output (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Quiet output (errors only, overrides -v)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Project directory (default: current directory)
    #[arg(short = 'C', long, global = true)]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create promptkit.toml, an empty lock file and the prompts/ directory
    Init,

    /// Fetch every plugin and update promptkit.lock
    Lock,

    /// Generate platform artifacts from promptkit.lock
    Build,

    /// Lock, then build
    Sync,

    /// Remove generated artifacts (user files are kept)
    Clean {
        /// Also delete the plugin cache
        #[arg(long)]
        cache: bool,
    },

    /// Check promptkit.toml and its consistency with promptkit.lock
    Validate,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
