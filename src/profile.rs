//! The immutable replacement profile shared by every engine in a batch.

use crate::charset::Charset;
use crate::errors::ProfileError;
use crate::exclusion::ExclusionIndex;
use std::fmt;
use std::ops::Deref;

/// The literal, non-empty search term.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Word(String);

impl Word {
    pub fn new(word: impl Into<String>) -> Result<Self, ProfileError> {
        let word = word.into();
        if word.is_empty() {
            return Err(ProfileError::EmptyWord);
        }
        if word.contains(['\n', '\r']) {
            return Err(ProfileError::MultilineWord);
        }
        Ok(Word(word))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for Word {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a resource engine needs to know to scan and rewrite one resource.
///
/// A `Profile` is never mutated; the `with_*` methods return a new value.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    charset: Charset,
    rename_resource: bool,
    to_find: Word,
    replace_with: String,
    exclusions: ExclusionIndex,
}

/// The most significant field that differs between two profiles.
///
/// Variants are listed in priority order: a charset change dominates a word
/// change, which dominates an exclusion change, and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileChange {
    Charset,
    Word,
    Exclusions,
    Replacement,
    Rename,
    Unchanged,
}

impl ProfileChange {
    /// Compares `old` and `new` field by field in priority order.
    pub fn between(old: &Profile, new: &Profile) -> Self {
        if old.charset != new.charset {
            ProfileChange::Charset
        } else if old.to_find != new.to_find {
            ProfileChange::Word
        } else if old.exclusions != new.exclusions {
            ProfileChange::Exclusions
        } else if old.replace_with != new.replace_with {
            ProfileChange::Replacement
        } else if old.rename_resource != new.rename_resource {
            ProfileChange::Rename
        } else {
            ProfileChange::Unchanged
        }
    }
}

impl Profile {
    /// Starts building a profile that searches for `to_find`.
    pub fn builder(to_find: impl Into<String>) -> ProfileBuilder {
        ProfileBuilder {
            to_find: to_find.into(),
            replace_with: String::new(),
            rename_resource: false,
            charset: None,
            exclusions: Vec::new(),
        }
    }

    pub fn charset(&self) -> Charset {
        self.charset
    }

    pub fn rename_resource(&self) -> bool {
        self.rename_resource
    }

    pub fn to_find(&self) -> &Word {
        &self.to_find
    }

    pub fn replace_with(&self) -> &str {
        &self.replace_with
    }

    pub fn exclusions(&self) -> &ExclusionIndex {
        &self.exclusions
    }

    pub fn with_replacement(&self, replace_with: impl Into<String>) -> Self {
        Self {
            replace_with: replace_with.into(),
            ..self.clone()
        }
    }

    pub fn with_rename(&self, rename_resource: bool) -> Self {
        Self {
            rename_resource,
            ..self.clone()
        }
    }

    pub fn with_charset(&self, charset: Charset) -> Self {
        Self {
            charset,
            ..self.clone()
        }
    }
}

/// Validating builder for [`Profile`].
#[derive(Debug, Clone)]
pub struct ProfileBuilder {
    to_find: String,
    replace_with: String,
    rename_resource: bool,
    charset: Option<String>,
    exclusions: Vec<String>,
}

impl ProfileBuilder {
    pub fn replace_with(mut self, replace_with: impl Into<String>) -> Self {
        self.replace_with = replace_with.into();
        self
    }

    pub fn rename_resource(mut self, rename: bool) -> Self {
        self.rename_resource = rename;
        self
    }

    /// Sets the charset label; UTF-8 is used when none is given.
    pub fn charset(mut self, label: impl Into<String>) -> Self {
        self.charset = Some(label.into());
        self
    }

    pub fn exclusion(mut self, phrase: impl Into<String>) -> Self {
        self.exclusions.push(phrase.into());
        self
    }

    pub fn exclusions<I>(mut self, phrases: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.exclusions.extend(phrases.into_iter().map(Into::into));
        self
    }

    /// Validates every field and produces the profile.
    pub fn build(self) -> Result<Profile, ProfileError> {
        let to_find = Word::new(self.to_find)?;
        let charset = match self.charset {
            Some(label) => Charset::for_label(&label)?,
            None => Charset::default(),
        };
        let exclusions = if self.exclusions.is_empty() {
            ExclusionIndex::none()
        } else {
            ExclusionIndex::build(&self.exclusions, &to_find, true)?
        };

        Ok(Profile {
            charset,
            rename_resource: self.rename_resource,
            to_find,
            replace_with: self.replace_with,
            exclusions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_validation() {
        assert_eq!(Word::new(""), Err(ProfileError::EmptyWord));
        assert_eq!(Word::new("a\nb"), Err(ProfileError::MultilineWord));
        assert_eq!(Word::new("abc").unwrap().len(), 3);
    }

    #[test]
    fn test_builder_defaults() {
        let profile = Profile::builder("foo").build().unwrap();
        assert_eq!(profile.replace_with(), "");
        assert!(!profile.rename_resource());
        assert_eq!(profile.charset(), Charset::default());
        assert!(profile.exclusions().is_empty());
    }

    #[test]
    fn test_builder_rejects_bad_input() {
        assert_eq!(
            Profile::builder("").build().unwrap_err(),
            ProfileError::EmptyWord
        );
        assert!(matches!(
            Profile::builder("foo").exclusion("bar").build(),
            Err(ProfileError::InvalidExclusion { .. })
        ));
        assert!(matches!(
            Profile::builder("foo").charset("nope").build(),
            Err(ProfileError::UnsupportedCharset(_))
        ));
    }

    #[test]
    fn test_change_priority() {
        let base = Profile::builder("foo")
            .replace_with("bar")
            .exclusion("nofoo")
            .build()
            .unwrap();

        assert_eq!(ProfileChange::between(&base, &base.clone()), ProfileChange::Unchanged);
        assert_eq!(
            ProfileChange::between(&base, &base.with_rename(true)),
            ProfileChange::Rename
        );
        assert_eq!(
            ProfileChange::between(&base, &base.with_replacement("baz").with_rename(true)),
            ProfileChange::Replacement
        );

        let other_exclusions = Profile::builder("foo")
            .replace_with("baz")
            .exclusion("foox")
            .build()
            .unwrap();
        assert_eq!(
            ProfileChange::between(&base, &other_exclusions),
            ProfileChange::Exclusions
        );

        let other_word = Profile::builder("fo").replace_with("bar").build().unwrap();
        assert_eq!(ProfileChange::between(&base, &other_word), ProfileChange::Word);

        let latin = Charset::for_label("latin1").unwrap();
        assert_eq!(
            ProfileChange::between(&base, &other_word.with_charset(latin)),
            ProfileChange::Charset
        );
    }
}
