//! `reword` is a library for exclusion-aware word replacement across files.
//!
//! It provides the core logic for the `reword` command-line tool but can also
//! be used as a standalone library. The main components are:
//!
//! - `Profile`: the word to find, its replacement, the charset and the
//!   phrases whose occurrences must be left alone.
//! - `ExclusionIndex`: prefix and suffix tries answering whether an
//!   occurrence sits inside one of those phrases.
//! - `ResourceEngine`: a per-file state machine that reads, marks, excludes
//!   and computes lazily, redoing only the stages a profile change requires.
//! - `Walker`: discovers files under a directory and runs one engine per file
//!   on a Rayon thread pool, keeping results in discovery order.
//! - `config`: loading replacement profiles from YAML files.

pub mod charset;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exclusion;
pub mod logging;
pub mod marker;
pub mod output_formatter;
pub mod prefix_tree;
pub mod profile;
pub mod result;
pub mod rewrite;
pub mod walker;

// Re-export main types for easier access by library users.
pub use charset::Charset;
pub use engine::{ResourceEngine, State};
pub use errors::{Error, ProfileError, ResourceError, Result};
pub use exclusion::ExclusionIndex;
pub use output_formatter::{OutputFormat, OutputFormatter};
pub use profile::{Profile, Word};
pub use result::ResourceResult;
pub use walker::{WalkOptions, Walker};
