//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::Parser;
use nosync_core::config::Config;
use nosync_core::package::PackageManager;
use nosync_core::repo::Layout;

/// nosync - clone a repository and keep node_modules out of cloud sync
#[derive(Parser, Debug)]
#[command(name = "nosync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Repository to clone (e.g. https://github.com/owner/repo.git)
    pub repository: Option<String>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to nosync.yaml config file
    #[arg(short, long)]
    pub config: Option<Utf8PathBuf>,

    /// Package manager used to install or initialize
    #[arg(long, value_parser = parse_package_manager)]
    pub package_manager: Option<PackageManager>,

    /// Folder layout: flat (<repo>) or owner (<owner>/<repo>)
    #[arg(long, value_parser = parse_layout)]
    pub layout: Option<Layout>,

    /// Shallow clone with history truncated to this many commits
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub depth: Option<u32>,

    /// Branch to check out after cloning
    #[arg(long)]
    pub branch: Option<String>,

    /// Continue when install or init exits non-zero
    #[arg(long)]
    pub no_strict: bool,

    /// Print what would run without running it
    #[arg(long)]
    pub dry_run: bool,

    /// Skip checking that git and the package manager are installed
    #[arg(long)]
    pub skip_preflight: bool,
}

impl Cli {
    /// Apply command-line overrides on top of loaded configuration
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(pm) = self.package_manager {
            config.package_manager = pm;
        }
        if let Some(layout) = self.layout {
            config.layout = layout;
        }
        if let Some(depth) = self.depth {
            config.clone.depth = Some(depth);
        }
        if let Some(branch) = &self.branch {
            config.clone.branch = Some(branch.clone());
        }
        if self.no_strict {
            config.strict_exit_codes = false;
        }
    }
}

fn parse_package_manager(s: &str) -> Result<PackageManager, String> {
    s.parse().map_err(|e: nosync_core::Error| e.to_string())
}

fn parse_layout(s: &str) -> Result<Layout, String> {
    s.parse().map_err(|e: nosync_core::Error| e.to_string())
}
