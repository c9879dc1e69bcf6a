//! Property-based tests for reword
//!
//! These use proptest to check the rewrite invariants over generated lines,
//! words and exclusion phrases.

use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

use reword::marker::Position;
use reword::rewrite::{apply_markers, find_occurrences, mark};
use reword::{ExclusionIndex, Profile, ResourceEngine, Word};

use proptest::prelude::*;

fn rewrite(text: &str, word: &str, replace_with: &str, exclusions: &ExclusionIndex) -> (String, usize) {
    let markers = mark(text, Position::Line(0), word, exclusions);
    apply_markers(text, &markers, word.len(), replace_with)
}

// ============================================================================
// Without exclusions the rewrite is plain substitution
// ============================================================================

proptest! {
    #[test]
    fn prop_unexcluded_rewrite_matches_str_replace(
        text in "[abc ]{0,80}",
        word in "[abc]{1,3}",
        replace_with in "[a-z]{0,4}"
    ) {
        let (rewritten, count) = rewrite(&text, &word, &replace_with, &ExclusionIndex::none());

        prop_assert_eq!(&rewritten, &text.replace(&word, &replace_with));
        prop_assert_eq!(count, text.matches(word.as_str()).count());
    }

    #[test]
    fn prop_multibyte_text_matches_str_replace(
        text in "[aéü€ ]{0,40}",
        word in "[aé€]{1,2}",
        replace_with in "[xß]{0,3}"
    ) {
        let (rewritten, _) = rewrite(&text, &word, &replace_with, &ExclusionIndex::none());
        prop_assert_eq!(rewritten, text.replace(&word, &replace_with));
    }

    #[test]
    fn prop_text_without_occurrence_is_unchanged(
        text in "[a-m \n]{0,120}",
        word in "[n-z]{1,4}"
    ) {
        prop_assert_eq!(find_occurrences(&text, &word).count(), 0);
        let (rewritten, count) = rewrite(&text, &word, "REPLACED", &ExclusionIndex::none());
        prop_assert_eq!(rewritten, text);
        prop_assert_eq!(count, 0);
    }
}

// ============================================================================
// Exclusions protect exactly the occurrences inside a phrase
// ============================================================================

proptest! {
    #[test]
    fn prop_excluded_occurrence_survives(
        pad in "[0-9 ]{0,10}",
        word in "[a-z]{2,4}",
        replace_with in "[A-W]{1,3}"
    ) {
        let profile = Profile::builder(word.clone())
            .replace_with(replace_with.clone())
            .exclusion(format!("X{word}Y"))
            .build()
            .unwrap();
        let line = format!("{pad}X{word}Y {word}{pad}");

        let (rewritten, count) = rewrite(&line, &word, &replace_with, profile.exclusions());

        prop_assert_eq!(rewritten, format!("{pad}X{word}Y {replace_with}{pad}"));
        prop_assert_eq!(count, 1);
    }

    #[test]
    fn prop_prefix_storage_order_does_not_change_verdicts(
        line in "[abXY ]{0,40}",
        prefixes in prop::collection::vec("[abXY ]{1,4}", 1..4)
    ) {
        let word = Word::new("ab").unwrap();
        let phrases: Vec<String> = prefixes.iter().map(|p| format!("{p}ab")).collect();
        let reversed = ExclusionIndex::build(&phrases, &word, true).unwrap();
        let natural = ExclusionIndex::build(&phrases, &word, false).unwrap();

        for (start, end) in find_occurrences(&line, "ab") {
            prop_assert_eq!(
                reversed.is_excluded(&line, start, end),
                natural.is_excluded(&line, start, end)
            );
        }
    }
}

// ============================================================================
// Engine results agree with the line-level rewrite
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_engine_preview_matches_line_rewrite(
        lines in prop::collection::vec("[abc ]{0,30}", 1..8),
        word in "[abc]{1,2}",
        replace_with in "[x-z]{0,3}"
    ) {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("sample.txt");
        let content: String = lines.iter().map(|line| format!("{line}\n")).collect();
        fs::write(&file_path, &content).unwrap();

        let profile = Arc::new(
            Profile::builder(word.clone())
                .replace_with(replace_with.clone())
                .build()
                .unwrap(),
        );
        let mut engine = ResourceEngine::new();
        engine.bind(&file_path);
        engine.set_profile(profile);
        let result = engine.get_result().unwrap();

        let expected_count: usize = lines.iter().map(|l| l.matches(word.as_str()).count()).sum();
        prop_assert_eq!(result.modification_count(), expected_count);

        let changes = result.lines().unwrap();
        prop_assert_eq!(changes.len(), lines.len());
        for (change, line) in changes.iter().zip(&lines) {
            prop_assert_eq!(&change.original, line);
            let expected = line.contains(word.as_str()).then(|| line.replace(&word, &replace_with));
            prop_assert_eq!(&change.modified, &expected);
        }

        // Preview never writes.
        prop_assert_eq!(fs::read_to_string(&file_path).unwrap(), content);
    }
}
