use crate::errors::ResourceError;
use std::path::{Path, PathBuf};

/// One original line and, if it had at least one accepted replacement, its
/// rewritten form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineChange {
    pub original: String,
    pub modified: Option<String>,
}

impl LineChange {
    pub fn is_modified(&self) -> bool {
        self.modified.is_some()
    }
}

/// The computed changes for a resource that could be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Changes {
    pub modified_name: Option<String>,
    pub lines: Vec<LineChange>,
    pub modification_count: usize,
}

/// Either the changes for a resource or the reason it could not be processed.
#[derive(Debug, Clone)]
pub enum Outcome {
    Changes(Changes),
    Failed(ResourceError),
}

/// What would be (preview) or was (commit) changed in one resource.
///
/// An exceptional result carries a cause and no content; a normal one
/// carries content and no cause.
#[derive(Debug, Clone)]
pub struct ResourceResult {
    path: PathBuf,
    original_name: String,
    outcome: Outcome,
}

impl ResourceResult {
    pub fn changed(path: &Path, original_name: impl Into<String>, changes: Changes) -> Self {
        Self {
            path: path.to_path_buf(),
            original_name: original_name.into(),
            outcome: Outcome::Changes(changes),
        }
    }

    pub fn failed(path: &Path, original_name: impl Into<String>, cause: ResourceError) -> Self {
        Self {
            path: path.to_path_buf(),
            original_name: original_name.into(),
            outcome: Outcome::Failed(cause),
        }
    }

    /// The path the resource had when it was scanned.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    pub fn is_exceptional(&self) -> bool {
        matches!(self.outcome, Outcome::Failed(_))
    }

    pub fn cause(&self) -> Option<&ResourceError> {
        match &self.outcome {
            Outcome::Failed(cause) => Some(cause),
            Outcome::Changes(_) => None,
        }
    }

    pub fn changes(&self) -> Option<&Changes> {
        match &self.outcome {
            Outcome::Changes(changes) => Some(changes),
            Outcome::Failed(_) => None,
        }
    }

    pub fn modified_name(&self) -> Option<&str> {
        self.changes()?.modified_name.as_deref()
    }

    /// All original lines; `None` for an exceptional result.
    pub fn lines(&self) -> Option<&[LineChange]> {
        self.changes().map(|c| c.lines.as_slice())
    }

    /// Accepted replacements plus one if the resource is renamed; zero for an
    /// exceptional result.
    pub fn modification_count(&self) -> usize {
        self.changes().map_or(0, |c| c.modification_count)
    }

    pub fn has_modifications(&self) -> bool {
        self.modification_count() > 0
    }

    /// Replaces the rename decision of a computed result, keeping its lines.
    pub(crate) fn with_modified_name(&self, modified_name: Option<String>) -> Self {
        let outcome = match &self.outcome {
            Outcome::Changes(changes) => {
                let was_renamed = usize::from(changes.modified_name.is_some());
                let now_renamed = usize::from(modified_name.is_some());
                Outcome::Changes(Changes {
                    modification_count: changes.modification_count - was_renamed + now_renamed,
                    modified_name,
                    lines: changes.lines.clone(),
                })
            }
            Outcome::Failed(cause) => Outcome::Failed(cause.clone()),
        };
        Self {
            path: self.path.clone(),
            original_name: self.original_name.clone(),
            outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Action;
    use std::io;

    fn sample() -> ResourceResult {
        ResourceResult::changed(
            Path::new("dir/findme.txt"),
            "findme.txt",
            Changes {
                modified_name: Some("done.txt".to_string()),
                lines: vec![
                    LineChange {
                        original: "findme".to_string(),
                        modified: Some("done".to_string()),
                    },
                    LineChange {
                        original: "other".to_string(),
                        modified: None,
                    },
                ],
                modification_count: 2,
            },
        )
    }

    #[test]
    fn test_normal_result_accessors() {
        let result = sample();
        assert!(!result.is_exceptional());
        assert!(result.cause().is_none());
        assert_eq!(result.modified_name(), Some("done.txt"));
        assert_eq!(result.lines().unwrap().len(), 2);
        assert_eq!(result.modification_count(), 2);
    }

    #[test]
    fn test_exceptional_result_has_no_content() {
        let path = Path::new("gone.txt");
        let cause = ResourceError::new(path, Action::Read, io::Error::from(io::ErrorKind::NotFound));
        let result = ResourceResult::failed(path, "gone.txt", cause);
        assert!(result.is_exceptional());
        assert_eq!(result.cause().unwrap().kind(), io::ErrorKind::NotFound);
        assert!(result.lines().is_none());
        assert!(result.modified_name().is_none());
        assert_eq!(result.modification_count(), 0);
    }

    #[test]
    fn test_rename_decision_can_be_swapped() {
        let result = sample().with_modified_name(None);
        assert_eq!(result.modified_name(), None);
        assert_eq!(result.modification_count(), 1);
        assert_eq!(result.lines().unwrap()[0].modified.as_deref(), Some("done"));

        let back = result.with_modified_name(Some("done.txt".to_string()));
        assert_eq!(back.modification_count(), 2);
    }
}
