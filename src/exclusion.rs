//! Prefix/suffix exclusion index.
//!
//! An exclusion phrase such as `"NoXend"` for the search word `"X"` is split
//! around the word into the prefix `"No"` and the suffix `"end"`. An
//! occurrence of the word is excluded when the text right before it ends with
//! a stored prefix, or the text right after it starts with a stored suffix.

use crate::errors::ProfileError;
use crate::prefix_tree::PrefixTree;
use crate::profile::Word;
use std::collections::BTreeSet;

/// Immutable index over the prefixes and suffixes of a set of exclusion
/// phrases.
#[derive(Debug, Clone)]
pub struct ExclusionIndex {
    prefixes: PrefixTree,
    suffixes: PrefixTree,
    prefixes_reversed: bool,
    prefix_set: BTreeSet<String>,
    suffix_set: BTreeSet<String>,
}

impl Default for ExclusionIndex {
    fn default() -> Self {
        Self::none()
    }
}

impl PartialEq for ExclusionIndex {
    fn eq(&self, other: &Self) -> bool {
        self.prefix_set == other.prefix_set && self.suffix_set == other.suffix_set
    }
}

impl Eq for ExclusionIndex {}

impl ExclusionIndex {
    /// An index that excludes nothing.
    pub fn none() -> Self {
        Self {
            prefixes: PrefixTree::new(),
            suffixes: PrefixTree::new(),
            prefixes_reversed: true,
            prefix_set: BTreeSet::new(),
            suffix_set: BTreeSet::new(),
        }
    }

    /// Builds an index from already split prefix and suffix lists.
    ///
    /// Empty strings are ignored; both lists may be empty.
    pub fn from_parts<P, S>(prefixes: P, suffixes: S) -> Self
    where
        P: IntoIterator,
        P::Item: AsRef<str>,
        S: IntoIterator,
        S::Item: AsRef<str>,
    {
        let mut index = Self::none();
        for prefix in prefixes {
            index.add_prefix(prefix.as_ref());
        }
        for suffix in suffixes {
            index.add_suffix(suffix.as_ref());
        }
        index
    }

    /// Builds an index from exclusion phrases, each of which must contain
    /// `word`.
    ///
    /// With `reverse_prefixes` the prefixes are stored reversed so a lookup
    /// walks outward from the occurrence; otherwise they are stored in
    /// natural order and probed tail by tail.
    pub fn build<I>(phrases: I, word: &Word, reverse_prefixes: bool) -> Result<Self, ProfileError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut index = Self::none();
        index.prefixes_reversed = reverse_prefixes;

        let mut seen = 0;
        for phrase in phrases {
            let phrase = phrase.as_ref();
            seen += 1;

            let Some(at) = phrase.find(word.as_str()) else {
                return Err(ProfileError::InvalidExclusion {
                    phrase: phrase.to_string(),
                    reason: "does not contain the search word",
                });
            };
            let prefix = &phrase[..at];
            let suffix = &phrase[at + word.len()..];
            if prefix.is_empty() && suffix.is_empty() {
                return Err(ProfileError::InvalidExclusion {
                    phrase: phrase.to_string(),
                    reason: "adds no context around the search word",
                });
            }

            index.add_prefix(prefix);
            index.add_suffix(suffix);
        }

        if seen == 0 {
            return Err(ProfileError::NoExclusions);
        }
        Ok(index)
    }

    fn add_prefix(&mut self, prefix: &str) {
        if prefix.is_empty() || !self.prefix_set.insert(prefix.to_string()) {
            return;
        }
        if self.prefixes_reversed {
            self.prefixes.insert(prefix.chars().rev());
        } else {
            self.prefixes.insert(prefix.chars());
        }
    }

    fn add_suffix(&mut self, suffix: &str) {
        if suffix.is_empty() || !self.suffix_set.insert(suffix.to_string()) {
            return;
        }
        self.suffixes.insert(suffix.chars());
    }

    /// Length in chars of the longest stored prefix.
    pub fn max_prefix_len(&self) -> usize {
        self.prefixes.max_depth()
    }

    /// Length in chars of the longest stored suffix.
    pub fn max_suffix_len(&self) -> usize {
        self.suffixes.max_depth()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty() && self.suffixes.is_empty()
    }

    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.prefix_set.iter().map(String::as_str)
    }

    pub fn suffixes(&self) -> impl Iterator<Item = &str> {
        self.suffix_set.iter().map(String::as_str)
    }

    /// Decides whether the occurrence at `line[match_start..match_end]` is
    /// excluded by its immediate context.
    ///
    /// Offsets are byte offsets; offsets that are out of range or not on a
    /// char boundary never exclude.
    pub fn is_excluded(&self, line: &str, match_start: usize, match_end: usize) -> bool {
        if match_start > match_end {
            return false;
        }
        let (Some(before), Some(after)) = (line.get(..match_start), line.get(match_end..)) else {
            return false;
        };
        self.prefix_hit(before) || self.suffix_hit(after)
    }

    fn prefix_hit(&self, before: &str) -> bool {
        if self.prefixes.is_empty() {
            return false;
        }
        let window = self.max_prefix_len();
        if self.prefixes_reversed {
            return self
                .prefixes
                .shortest_match(before.chars().rev().take(window))
                .is_some();
        }

        // Natural order: every tail of the window is a candidate prefix.
        before
            .char_indices()
            .rev()
            .take(window)
            .any(|(at, _)| self.prefixes.contains(before[at..].chars()))
    }

    fn suffix_hit(&self, after: &str) -> bool {
        if self.suffixes.is_empty() {
            return false;
        }
        self.suffixes
            .shortest_match(after.chars().take(self.max_suffix_len()))
            .is_some()
    }
}
