//! nosync CLI - clone a repository and keep node_modules out of cloud sync
//!
//! This is the main entry point for the nosync command-line interface.

mod cli;
mod output;
mod preflight;

use anyhow::{anyhow, Context, Result};
use camino::Utf8PathBuf;
use clap::Parser;
use nosync_core::bootstrap::{extract_reference, Bootstrapper, Plan};
use nosync_core::config::Config;
use nosync_core::output::{Message, OutputSink};
use nosync_core::process::SystemRunner;
use nosync_core::repo::RepoRef;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::Cli;
use output::ConsoleSink;

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI args
    let cli = Cli::parse();

    // Initialize tracing
    init_tracing(cli.verbose, cli.quiet);

    let sink = ConsoleSink::new(cli.quiet);
    match run(&cli, &sink).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report(&sink, &err),
    }
}

async fn run(cli: &Cli, sink: &ConsoleSink) -> Result<()> {
    // Argument problems are reported before any config file is read
    RepoRef::parse(extract_reference(cli.repository.as_deref())?)?;

    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let workdir = Utf8PathBuf::try_from(cwd)
        .map_err(|_| anyhow!("Current directory path is not valid UTF-8"))?;

    let loaded = Config::load(cli.config.as_deref(), &workdir)?;
    if let Some(source) = &loaded.source {
        debug!("Using configuration from {}", source);
    }
    let mut config = loaded.config;
    cli.apply_overrides(&mut config);
    config.validate()?;

    let runner = SystemRunner;
    let mut bootstrapper = Bootstrapper::new(&config, &runner, sink, workdir);

    let plan = bootstrapper.prepare(cli.repository.as_deref())?;

    if cli.dry_run {
        print_plan(&plan, &config);
        return Ok(());
    }

    if !cli.skip_preflight {
        preflight::check(&config)?;
    }

    bootstrapper.execute(&plan).await?;
    Ok(())
}

/// Print the error, an optional hint, and pick the exit code
fn report(sink: &ConsoleSink, err: &anyhow::Error) -> ExitCode {
    let core = err.downcast_ref::<nosync_core::Error>();

    sink.write(Message::Error(format!("Error: {:#}", err)));
    if let Some(hint) = core.and_then(|e| e.hint()) {
        sink.write(Message::Hint(hint));
    }

    let code = core.map(|e| e.exit_code()).unwrap_or(1);
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

fn print_plan(plan: &Plan, config: &Config) {
    output::header("Bootstrap plan");
    output::kv("Repository", &plan.repo.raw);
    output::kv("Project folder", plan.project_dir.as_str());
    output::kv("Clone", &plan.clone.to_string());
    output::kv(
        "Manifest",
        &format!("{} (install if present)", plan.manifest),
    );
    output::kv("Install", &plan.install.to_string());
    output::kv("Init", &plan.init.to_string());
    output::kv(
        "Relocate",
        &format!("{} -> {}", plan.cache_dir, plan.nosync_dir),
    );
    output::kv("Strict exit codes", &config.strict_exit_codes.to_string());
}

/// Initialize tracing with appropriate verbosity
fn init_tracing(verbose: u8, quiet: bool) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            // Progress is shown by the console sink; logs are for debugging
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
