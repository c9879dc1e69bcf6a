//! Per-resource state machine.
//!
//! A [`ResourceEngine`] owns the cached content, name and markers of one
//! resource. Each operation advances the engine only as far as it needs to,
//! and a profile change moves it back only as far as the changed field
//! requires: a new replacement text reuses the markers, a new exclusion set
//! reuses the located occurrences, a new search word reuses the cached lines.

use crate::errors::{Action, Error, ResourceError, Result};
use crate::marker::{Marker, Position};
use crate::profile::{Profile, ProfileChange};
use crate::result::{Changes, LineChange, ResourceResult};
use crate::rewrite;
use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// How far an engine has advanced on its resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum State {
    /// Nothing cached; the resource must be read.
    #[default]
    BeforeFind,
    /// Lines are cached but must be scanned for the search word.
    FindOther,
    /// Markers are cached but their exclusion flags are stale.
    ExcludeOther,
    /// Markers are current; no result computed yet.
    AfterFound,
    /// A result is memoized.
    Computed,
    /// The result has been written to the resource.
    Replaced,
    /// Reading or writing failed; the memoized result is exceptional.
    Interrupted,
}

impl State {
    /// Rank used to decide whether a profile change is a regression.
    pub const fn advancement(self) -> u8 {
        match self {
            State::BeforeFind => 0,
            State::FindOther => 10,
            State::ExcludeOther => 20,
            State::AfterFound => 30,
            State::Computed => 40,
            State::Replaced => 50,
            State::Interrupted => 60,
        }
    }

    fn regress_to(self, target: State) -> State {
        if self.advancement() > target.advancement() {
            target
        } else {
            self
        }
    }

    /// The state an engine moves to when its profile changes by `change`.
    ///
    /// An interrupted engine only leaves `Interrupted` when the charset
    /// changes, since that forces a fresh read. A charset change after the
    /// result was written has nothing left to re-read.
    pub fn after(self, change: ProfileChange) -> State {
        match (self, change) {
            (State::Interrupted, ProfileChange::Charset) => State::BeforeFind,
            (State::Interrupted, _) => State::Interrupted,
            (State::Replaced, ProfileChange::Charset) => State::Replaced,
            (_, ProfileChange::Charset) => State::BeforeFind,
            (state, ProfileChange::Word) => state.regress_to(State::FindOther),
            (state, ProfileChange::Exclusions) => state.regress_to(State::ExcludeOther),
            (state, ProfileChange::Replacement) => state.regress_to(State::AfterFound),
            (state, ProfileChange::Rename | ProfileChange::Unchanged) => state,
        }
    }
}

#[derive(Debug, Clone)]
struct Line {
    text: String,
    ending: &'static str,
}

/// Splits text into lines, remembering each line's terminator so the
/// content can be written back byte for byte.
fn split_lines(text: &str) -> Vec<Line> {
    text.split_inclusive('\n')
        .map(|raw| {
            let (text, ending) = if let Some(text) = raw.strip_suffix("\r\n") {
                (text, "\r\n")
            } else if let Some(text) = raw.strip_suffix('\n') {
                (text, "\n")
            } else {
                (raw, "")
            };
            Line {
                text: text.to_string(),
                ending,
            }
        })
        .collect()
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Scans, previews and rewrites a single resource.
#[derive(Debug, Default)]
pub struct ResourceEngine {
    path: Option<PathBuf>,
    profile: Option<Arc<Profile>>,
    backup: bool,
    state: State,
    name: Option<String>,
    lines: Vec<Line>,
    name_markers: Vec<Marker>,
    content_markers: Vec<Marker>,
    result: Option<Arc<ResourceResult>>,
}

impl ResourceEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy the resource to `<path>.bak` before overwriting its content.
    pub fn with_backup(mut self, backup: bool) -> Self {
        self.backup = backup;
        self
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// The bound path; after a committed rename this is the new path.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn profile(&self) -> Option<&Arc<Profile>> {
        self.profile.as_ref()
    }

    /// Binds the engine to a resource, discarding everything cached.
    pub fn bind(&mut self, path: impl Into<PathBuf>) {
        self.path = Some(path.into());
        self.clear();
        self.state = State::BeforeFind;
    }

    /// Switches to `profile`, invalidating only what the change requires.
    pub fn set_profile(&mut self, profile: Arc<Profile>) {
        let (change, next) = match &self.profile {
            Some(old) => {
                let change = ProfileChange::between(old, &profile);
                (change, self.state.after(change))
            }
            None => (ProfileChange::Charset, State::BeforeFind),
        };
        debug!(path = ?self.path, ?change, from = ?self.state, to = ?next, "profile changed");

        self.profile = Some(profile);
        self.enter(next);
        if change == ProfileChange::Rename && self.state == State::Computed {
            self.recompute_name_decision();
        }
    }

    /// Returns `true` if the search word occurs in the resource's name or in
    /// any line, whether or not the occurrence is excluded.
    pub fn has_replacements(&mut self) -> Result<bool> {
        let (path, profile) = self.bound()?;
        if self.state == State::Interrupted {
            return Err(Error::EngineMisuse(
                "resource is interrupted; rebind it or change the charset",
            ));
        }
        if let Err(cause) = self.refresh_markers(&path, &profile) {
            self.interrupt(&path, cause.clone());
            return Err(cause.into());
        }
        Ok(!self.name_markers.is_empty() || !self.content_markers.is_empty())
    }

    /// Computes, or returns the memoized, result for the bound resource.
    ///
    /// A resource that cannot be read yields an exceptional result rather
    /// than an error.
    pub fn get_result(&mut self) -> Result<Arc<ResourceResult>> {
        let (path, profile) = self.bound()?;
        if let Some(result) = &self.result {
            if self.state.advancement() >= State::Computed.advancement() {
                return Ok(Arc::clone(result));
            }
        }

        if let Err(cause) = self.refresh_markers(&path, &profile) {
            return Ok(self.interrupt(&path, cause));
        }

        let result = Arc::new(self.compute(&path, &profile));
        debug!(
            path = %path.display(),
            modifications = result.modification_count(),
            "computed result"
        );
        self.result = Some(Arc::clone(&result));
        self.state = State::Computed;
        Ok(result)
    }

    /// Computes the result and writes it: content first, then the rename.
    ///
    /// A failure at either step yields an exceptional result and leaves the
    /// engine `Interrupted`; a content write that succeeded before a failed
    /// rename is not rolled back.
    pub fn write_result(&mut self) -> Result<Arc<ResourceResult>> {
        let result = self.get_result()?;
        if self.state != State::Computed {
            return Ok(result);
        }
        let (path, profile) = self.bound()?;
        let Some(changes) = result.changes() else {
            return Ok(result);
        };

        match self.persist(&path, &profile, changes) {
            Ok(new_path) => {
                debug!(path = %path.display(), to = %new_path.display(), "resource replaced");
                self.absorb(new_path, changes, &profile);
                self.state = State::Replaced;
                Ok(result)
            }
            Err(cause) => Ok(self.interrupt(&path, cause)),
        }
    }

    fn bound(&self) -> Result<(PathBuf, Arc<Profile>)> {
        let path = self
            .path
            .clone()
            .ok_or(Error::EngineMisuse("no resource path is bound"))?;
        let profile = self
            .profile
            .clone()
            .ok_or(Error::EngineMisuse("no profile is set"))?;
        Ok((path, profile))
    }

    fn clear(&mut self) {
        self.name = None;
        self.lines.clear();
        self.name_markers.clear();
        self.content_markers.clear();
        self.result = None;
    }

    fn enter(&mut self, next: State) {
        if next == State::BeforeFind {
            self.clear();
        } else if next.advancement() < State::Computed.advancement() {
            self.result = None;
        }
        self.state = next;
    }

    fn interrupt(&mut self, path: &Path, cause: ResourceError) -> Arc<ResourceResult> {
        warn!(path = %path.display(), error = %cause, "resource interrupted");
        let result = Arc::new(ResourceResult::failed(path, display_name(path), cause));
        self.result = Some(Arc::clone(&result));
        self.state = State::Interrupted;
        result
    }

    /// Performs whatever reading, scanning or re-excluding the current state
    /// calls for, leaving the engine at `AfterFound` or beyond.
    fn refresh_markers(&mut self, path: &Path, profile: &Profile) -> std::result::Result<(), ResourceError> {
        if self.state == State::BeforeFind {
            self.load(path, profile)?;
            self.state = State::FindOther;
        }
        if self.state == State::FindOther {
            self.find(profile);
            self.state = State::AfterFound;
        }
        if self.state == State::ExcludeOther {
            self.exclude(profile);
            self.state = State::AfterFound;
        }
        Ok(())
    }

    fn load(&mut self, path: &Path, profile: &Profile) -> std::result::Result<(), ResourceError> {
        let bytes = fs::read(path).map_err(|e| ResourceError::new(path, Action::Read, e))?;
        let text = profile
            .charset()
            .decode(&bytes)
            .map_err(|e| ResourceError::new(path, Action::Read, e))?;

        self.lines = split_lines(&text);
        self.name = path.file_name().and_then(|n| n.to_str()).map(str::to_string);
        debug!(path = %path.display(), lines = self.lines.len(), charset = %profile.charset(), "loaded resource");
        Ok(())
    }

    fn find(&mut self, profile: &Profile) {
        let word = profile.to_find().as_str();
        let exclusions = profile.exclusions();

        self.name_markers = match &self.name {
            Some(name) => rewrite::mark(name, Position::Name, word, exclusions),
            None => Vec::new(),
        };
        self.content_markers = self
            .lines
            .iter()
            .enumerate()
            .flat_map(|(i, line)| rewrite::mark(&line.text, Position::Line(i), word, exclusions))
            .collect();
    }

    fn exclude(&mut self, profile: &Profile) {
        let word_len = profile.to_find().len();
        let exclusions = profile.exclusions();

        if let Some(name) = &self.name {
            rewrite::reexclude(name, &mut self.name_markers, word_len, exclusions);
        }
        for markers in self
            .content_markers
            .chunk_by_mut(|a, b| a.position == b.position)
        {
            if let Position::Line(i) = markers[0].position {
                rewrite::reexclude(&self.lines[i].text, markers, word_len, exclusions);
            }
        }
    }

    fn compute(&self, path: &Path, profile: &Profile) -> ResourceResult {
        let find_len = profile.to_find().len();
        let replace_with = profile.replace_with();

        let mut lines: Vec<LineChange> = self
            .lines
            .iter()
            .map(|line| LineChange {
                original: line.text.clone(),
                modified: None,
            })
            .collect();

        let mut modification_count = 0;
        for markers in self.content_markers.chunk_by(|a, b| a.position == b.position) {
            let Position::Line(i) = markers[0].position else {
                continue;
            };
            let (rewritten, spliced) =
                rewrite::apply_markers(&self.lines[i].text, markers, find_len, replace_with);
            if spliced > 0 {
                lines[i].modified = Some(rewritten);
                modification_count += spliced;
            }
        }

        let modified_name = self.name_decision(profile);
        modification_count += usize::from(modified_name.is_some());

        ResourceResult::changed(
            path,
            display_name(path),
            Changes {
                modified_name,
                lines,
                modification_count,
            },
        )
    }

    /// The new name, if renaming is enabled and the name has an accepted
    /// replacement that yields a different name in the same directory.
    fn name_decision(&self, profile: &Profile) -> Option<String> {
        if !profile.rename_resource() {
            return None;
        }
        let name = self.name.as_deref()?;
        let (renamed, spliced) = rewrite::apply_markers(
            name,
            &self.name_markers,
            profile.to_find().len(),
            profile.replace_with(),
        );
        if spliced == 0 || renamed == name || !is_plain_file_name(&renamed) {
            if spliced > 0 && renamed != name {
                warn!(original = name, renamed = %renamed, "rejected rename that is not a plain file name");
            }
            return None;
        }
        Some(renamed)
    }

    fn recompute_name_decision(&mut self) {
        let (Some(profile), Some(result)) = (&self.profile, &self.result) else {
            return;
        };
        let modified_name = self.name_decision(profile);
        self.result = Some(Arc::new(result.with_modified_name(modified_name)));
    }

    /// Writes the changes and returns the resource's path afterwards.
    fn persist(&self, path: &Path, profile: &Profile, changes: &Changes) -> std::result::Result<PathBuf, ResourceError> {
        if changes.lines.iter().any(LineChange::is_modified) {
            let bytes = profile
                .charset()
                .encode(&self.render(changes))
                .map_err(|e| ResourceError::new(path, Action::Write, e))?;
            if self.backup {
                let mut backup = OsString::from(path.as_os_str());
                backup.push(".bak");
                fs::copy(path, PathBuf::from(backup))
                    .map_err(|e| ResourceError::new(path, Action::Backup, e))?;
            }
            write_atomically(path, &bytes).map_err(|e| ResourceError::new(path, Action::Write, e))?;
        }

        let Some(new_name) = &changes.modified_name else {
            return Ok(path.to_path_buf());
        };
        let target = path.with_file_name(new_name);
        rename_exclusive(path, &target).map_err(|e| ResourceError::new(path, Action::Rename, e))?;
        Ok(target)
    }

    fn render(&self, changes: &Changes) -> String {
        let mut text = String::new();
        for (line, change) in self.lines.iter().zip(&changes.lines) {
            text.push_str(change.modified.as_deref().unwrap_or(&change.original));
            text.push_str(line.ending);
        }
        text
    }

    /// Brings the caches in line with what was just written.
    fn absorb(&mut self, new_path: PathBuf, changes: &Changes, profile: &Profile) {
        for (line, change) in self.lines.iter_mut().zip(&changes.lines) {
            if let Some(modified) = &change.modified {
                line.text.clone_from(modified);
            }
        }
        if let Some(new_name) = &changes.modified_name {
            self.name = Some(new_name.clone());
        }
        self.path = Some(new_path);
        self.find(profile);
    }
}

/// A name that stays in the resource's directory when joined to it.
fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
}

/// Moves `from` to `to`, failing with `AlreadyExists` instead of replacing
/// an existing `to`.
///
/// The hard link claims the target atomically, so two workers renaming
/// different resources to the same name cannot both succeed.
fn rename_exclusive(from: &Path, to: &Path) -> io::Result<()> {
    match fs::hard_link(from, to) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::Unsupported => {
            // Filesystems without hard links fall back to check then rename.
            if fs::symlink_metadata(to).is_ok() {
                return Err(already_exists(to));
            }
            return fs::rename(from, to);
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Err(already_exists(to)),
        Err(e) => return Err(e),
    }

    if let Err(e) = fs::remove_file(from) {
        let _ = fs::remove_file(to);
        return Err(e);
    }
    Ok(())
}

fn already_exists(target: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("{} already exists", target.display()),
    )
}

/// Writes `bytes` over `path` through a temporary file in the same
/// directory, keeping the original permissions.
fn write_atomically(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp_file = NamedTempFile::new_in(parent)?;
    temp_file.write_all(bytes)?;

    let perms = fs::metadata(path)?.permissions();
    fs::set_permissions(temp_file.path(), perms)?;

    temp_file.persist(path).map_err(|e| e.error)?;
    Ok(())
}
