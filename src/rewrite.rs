//! Locating occurrences of the search word and splicing in the replacement.

use crate::exclusion::ExclusionIndex;
use crate::marker::{Marker, Position};

/// Every non-overlapping, leftmost occurrence of `word` in `text`, as byte
/// ranges `(start, end)` in ascending order.
pub fn find_occurrences<'a>(text: &'a str, word: &'a str) -> impl Iterator<Item = (usize, usize)> + 'a {
    text.match_indices(word)
        .map(|(start, found)| (start, start + found.len()))
}

/// Scans `text` and returns one marker per occurrence, with the exclusion
/// verdict computed on the spot.
pub fn mark(text: &str, position: Position, word: &str, exclusions: &ExclusionIndex) -> Vec<Marker> {
    find_occurrences(text, word)
        .map(|(start, end)| Marker::new(position, start, exclusions.is_excluded(text, start, end)))
        .collect()
}

/// Recomputes the exclusion flag of already located markers against the text
/// they were found in.
pub fn reexclude(text: &str, markers: &mut [Marker], word_len: usize, exclusions: &ExclusionIndex) {
    for marker in markers {
        marker.excluded = exclusions.is_excluded(text, marker.start, marker.start + word_len);
    }
}

/// Applies the accepted markers of a single line (or name) to `text`.
///
/// `markers` must belong to `text` and be in ascending offset order. Each
/// accepted marker is spliced at `start + shift * (replace_with.len() - find_len)`
/// where `shift` counts the splices already made on this text; excluded
/// markers are skipped and do not advance `shift`.
///
/// Returns the rewritten text and the number of splices.
pub fn apply_markers(text: &str, markers: &[Marker], find_len: usize, replace_with: &str) -> (String, usize) {
    let delta = replace_with.len() as isize - find_len as isize;
    let mut rewritten = text.to_string();
    let mut shift: isize = 0;

    for marker in markers.iter().filter(|m| !m.excluded) {
        let point = (marker.start as isize + shift * delta) as usize;
        rewritten.replace_range(point..point + find_len, replace_with);
        shift += 1;
    }

    (rewritten, shift as usize)
}
