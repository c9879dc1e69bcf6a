//! Discovers resources under a root and runs one [`ResourceEngine`] per
//! resource on a rayon thread pool.

use crate::engine::ResourceEngine;
use crate::errors::{ProfileError, Result};
use crate::profile::Profile;
use crate::result::ResourceResult;
use globset::{Glob, GlobMatcher};
use ignore::{DirEntry, WalkBuilder};
use indicatif::ProgressBar;
use rayon::prelude::*;
use rayon::ThreadPool;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Threads per logical CPU in an owned pool; resource work is I/O bound.
const OVERSUBSCRIPTION: usize = 2;

/// Options controlling which resources a [`Walker`] discovers.
#[derive(Debug, Clone)]
pub struct WalkOptions {
    /// Glob matched against each file name, e.g. `*.txt`.
    pub pattern: String,
    /// Descend into subdirectories instead of scanning only the root level.
    pub subfolders: bool,
    /// Honour `.gitignore`, `.ignore` and hidden-file rules while walking.
    pub respect_ignore: bool,
    /// Write a `.bak` copy before replacing a resource's content.
    pub backup: bool,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            pattern: "*".to_string(),
            subfolders: false,
            respect_ignore: false,
            backup: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Preview,
    Replace,
}

/// Batch driver for previewing or committing a profile over a directory.
pub struct Walker {
    matcher: GlobMatcher,
    options: WalkOptions,
    progress: Option<ProgressBar>,
}

impl Walker {
    /// Creates a walker, rejecting a malformed name pattern.
    pub fn new(options: WalkOptions) -> Result<Self> {
        let matcher = Glob::new(&options.pattern)
            .map_err(|e| ProfileError::MalformedPattern {
                pattern: options.pattern.clone(),
                reason: e.kind().to_string(),
            })?
            .compile_matcher();
        Ok(Self {
            matcher,
            options,
            progress: None,
        })
    }

    /// Ticks `progress` once per finished resource.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn options(&self) -> &WalkOptions {
        &self.options
    }

    /// Lists eligible resources under `root` in a stable, name-sorted order.
    ///
    /// A path is eligible when it is a file, is not read-only, and its file
    /// name matches the pattern.
    ///
    /// A missing root is an error. Entries below it that cannot be read are
    /// logged and skipped.
    pub fn discover(&self, root: &Path) -> Result<Vec<PathBuf>> {
        fs::metadata(root)?;

        let mut walker = WalkBuilder::new(root);
        walker
            .standard_filters(self.options.respect_ignore)
            .max_depth((!self.options.subfolders).then_some(1))
            .sort_by_file_name(|a, b| a.cmp(b));

        let mut seen = HashSet::new();
        let mut paths = Vec::new();
        for entry in walker.build().filter_map(readable) {
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let path = entry.path();
            if !self.is_eligible(path) {
                debug!(path = %path.display(), "skipping ineligible resource");
                continue;
            }
            if seen.insert(path.to_path_buf()) {
                paths.push(path.to_path_buf());
            }
        }

        debug!(root = %root.display(), resources = paths.len(), "discovery finished");
        Ok(paths)
    }

    fn is_eligible(&self, path: &Path) -> bool {
        let name_matches = path
            .file_name()
            .is_some_and(|name| self.matcher.is_match(name));
        let writable = path
            .metadata()
            .is_ok_and(|meta| !meta.permissions().readonly());
        name_matches && writable
    }

    /// Computes the result for every eligible resource without writing.
    ///
    /// Results are in discovery order. When `pool` is `None` a pool is built
    /// for this call and dropped when it returns.
    pub fn preview(
        &self,
        root: &Path,
        profile: &Arc<Profile>,
        pool: Option<&ThreadPool>,
    ) -> Result<Vec<Arc<ResourceResult>>> {
        self.run(root, profile, pool, Mode::Preview)
    }

    /// Computes and writes the result for every eligible resource.
    ///
    /// A resource that fails to read or write produces an exceptional result
    /// and does not affect the others.
    pub fn replace(
        &self,
        root: &Path,
        profile: &Arc<Profile>,
        pool: Option<&ThreadPool>,
    ) -> Result<Vec<Arc<ResourceResult>>> {
        self.run(root, profile, pool, Mode::Replace)
    }

    fn run(
        &self,
        root: &Path,
        profile: &Arc<Profile>,
        pool: Option<&ThreadPool>,
        mode: Mode,
    ) -> Result<Vec<Arc<ResourceResult>>> {
        let paths = self.discover(root)?;
        if let Some(pb) = &self.progress {
            pb.set_length(paths.len() as u64);
        }

        let owned;
        let pool = match pool {
            Some(pool) => pool,
            None => {
                owned = default_pool()?;
                &owned
            }
        };

        let results = pool.install(|| {
            paths
                .par_iter()
                .map(|path| self.process(path, profile, mode))
                .collect::<Result<Vec<_>>>()
        })?;
        if let Some(pb) = &self.progress {
            pb.finish_with_message(format!("{} resources", results.len()));
        }

        let failed = results.iter().filter(|r| r.is_exceptional()).count();
        let changed = results.iter().filter(|r| r.has_modifications()).count();
        info!(
            ?mode,
            root = %root.display(),
            resources = results.len(),
            changed,
            failed,
            "batch finished"
        );
        Ok(results)
    }

    fn process(&self, path: &Path, profile: &Arc<Profile>, mode: Mode) -> Result<Arc<ResourceResult>> {
        let mut engine = ResourceEngine::new().with_backup(self.options.backup);
        engine.bind(path);
        engine.set_profile(Arc::clone(profile));

        let result = match mode {
            Mode::Preview => engine.get_result()?,
            Mode::Replace => engine.write_result()?,
        };
        if let Some(cause) = result.cause() {
            warn!(path = %path.display(), error = %cause, "resource failed");
        }
        if let Some(pb) = &self.progress {
            pb.inc(1);
        }
        Ok(result)
    }
}

fn readable(entry: std::result::Result<DirEntry, ignore::Error>) -> Option<DirEntry> {
    match entry {
        Ok(entry) => Some(entry),
        Err(e) => {
            warn!(error = %e, "skipping unreadable entry");
            None
        }
    }
}

/// Builds a pool sized to the machine, oversubscribed for I/O-bound work.
pub fn default_pool() -> Result<ThreadPool> {
    build_pool(num_cpus::get() * OVERSUBSCRIPTION)
}

/// Builds a pool with exactly `threads` workers (at least one).
pub fn build_pool(threads: usize) -> Result<ThreadPool> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .thread_name(|i| format!("reword-worker-{i}"))
        .build()?;
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use tempfile::TempDir;

    fn profile(find: &str, replace: &str) -> Arc<Profile> {
        Arc::new(Profile::builder(find).replace_with(replace).build().unwrap())
    }

    fn walker(pattern: &str, subfolders: bool) -> Walker {
        Walker::new(WalkOptions {
            pattern: pattern.to_string(),
            subfolders,
            ..WalkOptions::default()
        })
        .unwrap()
    }

    fn names(paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_malformed_pattern_is_rejected() {
        let err = Walker::new(WalkOptions {
            pattern: "[unclosed".to_string(),
            ..WalkOptions::default()
        })
        .err()
        .unwrap();
        assert!(matches!(
            err,
            crate::Error::InvalidProfile(ProfileError::MalformedPattern { .. })
        ));
    }

    #[test]
    fn test_discovery_filters_and_depth() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.txt"), "x").unwrap();
        fs::write(dir.path().join("a.txt"), "x").unwrap();
        fs::write(dir.path().join("c.md"), "x").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("d.txt"), "x").unwrap();

        let top = walker("*.txt", false).discover(dir.path()).unwrap();
        assert_eq!(names(&top), vec!["a.txt", "b.txt"]);

        let deep = walker("*.txt", true).discover(dir.path()).unwrap();
        assert_eq!(names(&deep), vec!["a.txt", "b.txt", "d.txt"]);
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("gone");
        assert!(matches!(
            walker("*", false).discover(&missing),
            Err(crate::Error::Io(_))
        ));
    }

    #[test]
    fn test_unreadable_entries_are_skipped() {
        let err = ignore::Error::Io(io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(readable(Err(err)).is_none());
    }

    #[test]
    fn test_progress_is_finished_after_batch() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "X").unwrap();
        fs::write(dir.path().join("b.txt"), "X").unwrap();

        let pb = ProgressBar::hidden();
        let walker = walker("*.txt", false).with_progress(pb.clone());
        walker.preview(dir.path(), &profile("X", "Y"), None).unwrap();

        assert!(pb.is_finished());
        assert_eq!(pb.position(), 2);
        assert_eq!(pb.length(), Some(2));
    }

    #[test]
    fn test_read_only_files_are_not_eligible() {
        let dir = TempDir::new().unwrap();
        let locked = dir.path().join("locked.txt");
        fs::write(&locked, "x").unwrap();
        fs::write(dir.path().join("open.txt"), "x").unwrap();

        let mut perms = fs::metadata(&locked).unwrap().permissions();
        perms.set_readonly(true);
        fs::set_permissions(&locked, perms).unwrap();

        let found = walker("*", false).discover(dir.path()).unwrap();
        assert_eq!(names(&found), vec!["open.txt"]);
    }

    #[test]
    fn test_failed_resource_does_not_disturb_the_batch() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("1.txt"), "X and X\n").unwrap();
        fs::write(dir.path().join("2.txt"), [0xff, 0xfe, b'X']).unwrap();
        fs::write(dir.path().join("3.txt"), "one X\n").unwrap();

        let pool = build_pool(1).unwrap();
        let results = walker("*.txt", false)
            .preview(dir.path(), &profile("X", "Y"), Some(&pool))
            .unwrap();

        let order: Vec<_> = results.iter().map(|r| r.original_name().to_string()).collect();
        assert_eq!(order, vec!["1.txt", "2.txt", "3.txt"]);
        assert_eq!(results.iter().filter(|r| r.is_exceptional()).count(), 1);
        assert!(results[1].is_exceptional());
        assert_eq!(results[0].modification_count(), 2);
        assert_eq!(results[2].modification_count(), 1);
    }

    #[test]
    fn test_preview_does_not_write() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("keep.txt");
        fs::write(&file, "X").unwrap();

        let results = walker("*", false)
            .preview(dir.path(), &profile("X", "Y"), None)
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].modification_count(), 1);
        assert_eq!(fs::read_to_string(&file).unwrap(), "X");
    }

    #[test]
    fn test_replace_writes_every_resource_in_order() {
        let dir = TempDir::new().unwrap();
        for i in 0..12 {
            fs::write(dir.path().join(format!("f{i:02}.txt")), format!("X {i}\n")).unwrap();
        }

        let results = walker("*.txt", false)
            .replace(dir.path(), &profile("X", "done"), None)
            .unwrap();

        assert_eq!(results.len(), 12);
        for (i, result) in results.iter().enumerate() {
            assert_eq!(result.original_name(), format!("f{i:02}.txt"));
            assert_eq!(result.modification_count(), 1);
        }
        for i in 0..12 {
            let content = fs::read_to_string(dir.path().join(format!("f{i:02}.txt"))).unwrap();
            assert_eq!(content, format!("done {i}\n"));
        }
    }

    #[test]
    fn test_replace_renames_when_enabled() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("findmefile.txt"), "nothing to see").unwrap();

        let profile = Arc::new(
            Profile::builder("findme")
                .replace_with("done")
                .rename_resource(true)
                .build()
                .unwrap(),
        );
        let results = walker("*.txt", false)
            .replace(dir.path(), &profile, None)
            .unwrap();

        assert_eq!(results[0].modified_name(), Some("donefile.txt"));
        assert!(dir.path().join("donefile.txt").exists());
        assert!(!dir.path().join("findmefile.txt").exists());
    }

    #[test]
    fn test_colliding_renames_never_lose_files() {
        let pool = build_pool(16).unwrap();
        let profile = Arc::new(
            Profile::builder("ab")
                .replace_with("")
                .rename_resource(true)
                .build()
                .unwrap(),
        );

        for _ in 0..20 {
            let dir = TempDir::new().unwrap();
            for i in 0..32 {
                fs::write(dir.path().join(format!("ab{i}")), format!("front {i}")).unwrap();
                fs::write(dir.path().join(format!("{i}ab")), format!("back {i}")).unwrap();
            }

            let results = walker("*", false)
                .replace(dir.path(), &profile, Some(&pool))
                .unwrap();

            assert_eq!(results.len(), 64);
            assert_eq!(results.iter().filter(|r| r.is_exceptional()).count(), 32);
            assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 64);
            for result in results.iter().filter(|r| r.is_exceptional()) {
                assert_eq!(result.cause().unwrap().kind(), io::ErrorKind::AlreadyExists);
            }
        }
    }
}
