use crate::errors::Result;
use crate::profile::Profile;
use crate::walker::WalkOptions;
use serde::Deserialize;
use std::env;
use std::fs::File;
use std::path::{Path, PathBuf};

/// A replacement profile as stored in a YAML file.
///
/// ```yaml
/// find: colour
/// replace: color
/// rename: true
/// charset: utf-8
/// exclusions:
///   - "Colour Me Bad"
/// pattern: "*.md"
/// subfolders: true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProfileConfig {
    /// The literal word to search for.
    pub find: Option<String>,
    /// The replacement text. Defaults to deleting the word.
    pub replace: Option<String>,
    /// Also rename resources whose file name contains the word.
    pub rename: Option<bool>,
    /// Charset label used to read and write resources.
    pub charset: Option<String>,
    /// Phrases containing the word whose occurrences must be left alone.
    pub exclusions: Vec<String>,
    /// Glob matched against file names.
    pub pattern: Option<String>,
    /// Descend into subdirectories.
    pub subfolders: Option<bool>,
    /// Honour ignore files while walking.
    pub respect_ignore: Option<bool>,
    /// Keep a `.bak` copy of every rewritten resource.
    pub backup: Option<bool>,
}

impl ProfileConfig {
    /// Fills every unset field of `self` from `fallback`; exclusions are
    /// combined.
    pub fn or(mut self, fallback: ProfileConfig) -> Self {
        self.find = self.find.or(fallback.find);
        self.replace = self.replace.or(fallback.replace);
        self.rename = self.rename.or(fallback.rename);
        self.charset = self.charset.or(fallback.charset);
        self.pattern = self.pattern.or(fallback.pattern);
        self.subfolders = self.subfolders.or(fallback.subfolders);
        self.respect_ignore = self.respect_ignore.or(fallback.respect_ignore);
        self.backup = self.backup.or(fallback.backup);
        for phrase in fallback.exclusions {
            if !self.exclusions.contains(&phrase) {
                self.exclusions.push(phrase);
            }
        }
        self
    }

    /// Validates the profile fields.
    pub fn to_profile(&self) -> Result<Profile> {
        let find = self
            .find
            .clone()
            .ok_or("No search word given; use --find or set `find` in the profile")?;
        let mut builder = Profile::builder(find)
            .replace_with(self.replace.clone().unwrap_or_default())
            .rename_resource(self.rename.unwrap_or(false))
            .exclusions(self.exclusions.iter().cloned());
        if let Some(charset) = &self.charset {
            builder = builder.charset(charset.clone());
        }
        Ok(builder.build()?)
    }

    pub fn walk_options(&self) -> WalkOptions {
        let defaults = WalkOptions::default();
        WalkOptions {
            pattern: self.pattern.clone().unwrap_or(defaults.pattern),
            subfolders: self.subfolders.unwrap_or(defaults.subfolders),
            respect_ignore: self.respect_ignore.unwrap_or(defaults.respect_ignore),
            backup: self.backup.unwrap_or(defaults.backup),
        }
    }
}

/// A utility for locating and loading profile files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Finds a profile file by searching a prioritized list of locations.
    ///
    /// The search order is:
    /// 1. The absolute path provided in `config_path`, if it exists.
    /// 2. A path relative to the current directory.
    /// 3. A path relative to the `working_dir`.
    /// 4. Inside the user's `reword` config directory.
    /// 5. Next to the executable.
    pub fn find_config(config_path: &Path, working_dir: &Path) -> Result<PathBuf> {
        if config_path.is_absolute() && config_path.exists() {
            return Ok(config_path.to_path_buf());
        }

        let mut candidates = vec![config_path.to_path_buf(), working_dir.join(config_path)];
        if let Some(config_dir) = dirs::config_dir() {
            candidates.push(config_dir.join("reword").join(config_path));
        }
        if let Some(exe_dir) = env::current_exe().ok().and_then(|exe| exe.parent().map(Path::to_path_buf)) {
            candidates.push(exe_dir.join(config_path));
        }

        if let Some(found) = candidates.iter().find(|candidate| candidate.exists()) {
            return Ok(found.clone());
        }

        let tried: Vec<String> = candidates.iter().map(|c| c.display().to_string()).collect();
        Err(format!(
            "Profile file '{}' not found. Searched in:\n  - {}",
            config_path.display(),
            tried.join("\n  - ")
        )
        .into())
    }

    /// Loads a `ProfileConfig` from a YAML file.
    pub fn load_profile(path: &Path) -> Result<ProfileConfig> {
        let file = File::open(path)?;
        Ok(serde_yaml::from_reader(file)?)
    }
}
