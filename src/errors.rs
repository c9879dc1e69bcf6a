use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// The primary error type for all operations in the `reword` crate.
///
/// Per-resource I/O failures are normally captured inside a
/// [`ResourceResult`](crate::result::ResourceResult) instead of being returned,
/// so a batch always completes. Configuration problems and engine misuse are
/// returned directly to the caller.
#[derive(Error, Debug)]
pub enum Error {
    /// The profile (search word, exclusions, charset, name pattern) is invalid.
    #[error("Invalid profile: {0}")]
    InvalidProfile(#[from] ProfileError),

    /// A resource could not be read or written.
    #[error(transparent)]
    ResourceUnavailable(#[from] ResourceError),

    /// An engine operation was called before its prerequisites were bound.
    #[error("Engine misuse: {0}")]
    EngineMisuse(&'static str),

    /// An error related to file system I/O outside of a single resource.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An error that occurred while parsing a YAML profile file.
    #[error("Config parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// An error related to JSON serialization.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An error from the `ignore` crate, which is used for directory traversal.
    #[error("Walk error: {0}")]
    Walk(#[from] ignore::Error),

    /// An error that occurred while building the Rayon thread pool.
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// A general configuration-related error.
    #[error("Config error: {0}")]
    Config(String),
}

/// A convenient type alias for `Result<T, reword::errors::Error>`.
pub type Result<T> = std::result::Result<T, Error>;

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Config(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Config(s.to_string())
    }
}

/// Validation failures raised while building a [`Profile`](crate::profile::Profile)
/// or a [`Walker`](crate::walker::Walker).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProfileError {
    /// The search word is empty.
    #[error("the search word must not be empty")]
    EmptyWord,

    /// The search word contains a line break and could never match a line.
    #[error("the search word must not contain a line break")]
    MultilineWord,

    /// An exclusion phrase is unusable for the given search word.
    #[error("exclusion phrase {phrase:?} {reason}")]
    InvalidExclusion { phrase: String, reason: &'static str },

    /// An exclusion index was requested from an empty phrase set.
    #[error("no exclusion phrases were given")]
    NoExclusions,

    /// The charset label is not known.
    #[error("unsupported charset {0:?}")]
    UnsupportedCharset(String),

    /// The resource name pattern is not a valid glob.
    #[error("malformed name pattern {pattern:?}: {reason}")]
    MalformedPattern { pattern: String, reason: String },
}

/// What the engine was doing to a resource when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Write,
    Backup,
    Rename,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Action::Read => "read",
            Action::Write => "write",
            Action::Backup => "backup",
            Action::Rename => "rename",
        };
        f.write_str(verb)
    }
}

/// A failure to read or write one resource.
///
/// The source is shared so the error can be stored in a memoized result and
/// handed out again without losing the underlying `io::Error`.
#[derive(Error, Debug, Clone)]
#[error("{action} failed for {}: {source}", path.display())]
pub struct ResourceError {
    pub path: PathBuf,
    pub action: Action,
    #[source]
    pub source: Arc<std::io::Error>,
}

impl ResourceError {
    pub fn new(path: &Path, action: Action, source: std::io::Error) -> Self {
        Self {
            path: path.to_path_buf(),
            action,
            source: Arc::new(source),
        }
    }

    /// The kind of the underlying I/O error.
    pub fn kind(&self) -> std::io::ErrorKind {
        self.source.kind()
    }
}
