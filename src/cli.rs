use crate::config::ProfileConfig;
use crate::output_formatter::OutputFormat;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

/// Exclusion-aware word replacement across files and file names.
///
/// `reword` replaces every occurrence of a literal word in the files under a
/// directory, except where the occurrence is part of a protected phrase.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Exclusion-aware word replacement across files",
    long_about = "reword - Replace a literal word in every matching file under a directory,
leaving occurrences inside protected phrases untouched.

QUICK EXAMPLES:
  reword preview -d docs --find colour --replace color
  reword replace -d docs --find colour --replace color --exclude 'Colour Me Bad'
  reword replace -d . --profile colour.yaml --rename --backup

For detailed help on any command, use: reword <command> --help"
)]
pub struct Args {
    /// Increase diagnostic output on stderr (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// The set of available commands for the `reword` CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show what would change without touching any file
    ///
    /// EXAMPLES:
    ///   reword preview -d . --find colour --replace color
    ///   reword preview -d . --profile colour.yaml -f json | jq '.resources[]'
    Preview {
        #[command(flatten)]
        run: RunArgs,
    },

    /// Rewrite matching files in place
    ///
    /// EXAMPLES:
    ///   reword replace -d . --find colour --replace color --backup
    ///   reword replace -d src --find OldName --replace NewName --rename -s
    ///
    /// Profile file format (colour.yaml):
    ///   find: colour
    ///   replace: color
    ///   exclusions: ['Colour Me Bad']
    Replace {
        #[command(flatten)]
        run: RunArgs,

        /// Keep a `.bak` copy of every rewritten file.
        #[arg(long)]
        backup: bool,
    },
}

/// Arguments shared by `preview` and `replace`.
#[derive(ClapArgs, Debug, Clone)]
pub struct RunArgs {
    /// The directory to process.
    #[arg(short, long, default_value = ".")]
    pub dir: PathBuf,

    /// The literal word to search for.
    #[arg(long)]
    pub find: Option<String>,

    /// The replacement text. Omit to delete the word.
    #[arg(long)]
    pub replace: Option<String>,

    /// A phrase containing the word whose occurrences are left alone. Repeatable.
    #[arg(short = 'e', long = "exclude")]
    pub exclusions: Vec<String>,

    /// The charset used to read and write files (e.g. `utf-8`, `windows-1252`).
    #[arg(long)]
    pub charset: Option<String>,

    /// Also rename files whose name contains the word.
    #[arg(long)]
    pub rename: bool,

    /// Glob matched against file names.
    #[arg(short, long)]
    pub pattern: Option<String>,

    /// Descend into subdirectories.
    #[arg(short, long)]
    pub subfolders: bool,

    /// Skip files excluded by `.gitignore`, `.ignore` and hidden-file rules.
    #[arg(long)]
    pub respect_ignore: bool,

    /// Path to a YAML profile file. Command-line values take precedence.
    #[arg(long)]
    pub profile: Option<PathBuf>,

    /// The number of parallel worker threads to use.
    #[arg(short, long, env = "REWORD_WORKERS")]
    pub workers: Option<usize>,

    /// The output format for the results.
    #[arg(short = 'f', long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Append a summary of the batch to text output.
    #[arg(long)]
    pub summary: bool,

    /// Show a progress bar on stderr.
    #[arg(long)]
    pub progress: bool,
}

impl RunArgs {
    /// The profile values given on the command line. Switches that were not
    /// passed stay unset so a profile file can supply them.
    pub fn profile_config(&self, backup: bool) -> ProfileConfig {
        ProfileConfig {
            find: self.find.clone(),
            replace: self.replace.clone(),
            rename: self.rename.then_some(true),
            charset: self.charset.clone(),
            exclusions: self.exclusions.clone(),
            pattern: self.pattern.clone(),
            subfolders: self.subfolders.then_some(true),
            respect_ignore: self.respect_ignore.then_some(true),
            backup: backup.then_some(true),
        }
    }
}

/// Parses command-line arguments and returns the populated `Args` struct.
pub fn parse_args() -> Args {
    Args::parse()
}
