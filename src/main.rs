//! The main entry point for the `reword` command-line application.
//!
//! Parses arguments, merges them over an optional profile file and runs a
//! preview or replace batch, printing the results on stdout.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use reword::cli::{self, Commands, RunArgs};
use reword::config::{ConfigLoader, ProfileConfig};
use reword::walker::{self, Walker};
use reword::{logging, OutputFormatter};
use std::env;
use std::io;
use std::sync::Arc;
use tracing::info;

fn main() -> Result<()> {
    let args = cli::parse_args();
    logging::init(args.verbose)?;

    match args.command {
        Commands::Preview { run } => execute(run, false, true),
        Commands::Replace { run, backup } => execute(run, backup, false),
    }
}

fn execute(run: RunArgs, backup: bool, dry_run: bool) -> Result<()> {
    let config = load_config(&run, backup)?;
    let profile = Arc::new(config.to_profile().context("Invalid replacement profile")?);

    let mut walker = Walker::new(config.walk_options())?;
    if run.progress {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")?
                .progress_chars("##-"),
        );
        walker = walker.with_progress(pb);
    }

    let pool = run.workers.map(walker::build_pool).transpose()?;
    info!(dir = %run.dir.display(), word = %profile.to_find(), dry_run, "starting batch");

    let results = if dry_run {
        walker.preview(&run.dir, &profile, pool.as_ref())
    } else {
        walker.replace(&run.dir, &profile, pool.as_ref())
    }
    .with_context(|| format!("Failed to process {}", run.dir.display()))?;

    let formatter = OutputFormatter::new(run.format, run.summary, dry_run);
    formatter.write_output(&mut io::stdout().lock(), &results)?;
    Ok(())
}

/// Command-line values, falling back to the profile file when one is given.
fn load_config(run: &RunArgs, backup: bool) -> Result<ProfileConfig> {
    let from_cli = run.profile_config(backup);
    let Some(profile_path) = &run.profile else {
        return Ok(from_cli);
    };

    let working_dir = env::current_dir()?;
    let path = ConfigLoader::find_config(profile_path, &working_dir)?;
    let from_file = ConfigLoader::load_profile(&path)
        .with_context(|| format!("Failed to load profile {}", path.display()))?;
    Ok(from_cli.or(from_file))
}
