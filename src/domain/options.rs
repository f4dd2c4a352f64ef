//! Option label cleaning and ordering.

use std::collections::HashSet;

use super::PollOption;

/// Cleans raw option labels for poll creation.
///
/// Each label is trimmed and empty results are dropped. Duplicates are
/// removed case-insensitively, keeping the first occurrence's casing and
/// position. Count limits are enforced later by the create schema.
#[must_use]
pub fn validate_poll_options<S: AsRef<str>>(options: &[S]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(options.len());
    options
        .iter()
        .map(|option| option.as_ref().trim())
        .filter(|option| !option.is_empty())
        .filter(|option| seen.insert(option.to_lowercase()))
        .map(str::to_string)
        .collect()
}

/// Returns the options ordered by `order_index`.
#[must_use]
pub fn sort_poll_options(options: &[PollOption]) -> Vec<PollOption> {
    let mut sorted = options.to_vec();
    sorted.sort_by_key(|option| option.order_index);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::poll::fixtures::poll_with_counts;

    #[test]
    fn trims_dedupes_and_drops_empties() {
        let cleaned = validate_poll_options(&["Option 1", "Option 2", " Option 1 ", ""]);
        assert_eq!(cleaned, vec!["Option 1", "Option 2"]);
    }

    #[test]
    fn dedupes_case_insensitively_keeping_first_casing() {
        assert_eq!(
            validate_poll_options(&["Option 1", "option 1"]),
            vec!["Option 1"]
        );
        assert_eq!(
            validate_poll_options(&["  rust", "Go", "RUST", "go "]),
            vec!["rust", "Go"]
        );
    }

    #[test]
    fn single_option_is_kept() {
        assert_eq!(validate_poll_options(&["Option 1"]), vec!["Option 1"]);
    }

    #[test]
    fn whitespace_only_labels_are_dropped() {
        let cleaned = validate_poll_options(&[String::from("   "), String::from("\t\n")]);
        assert!(cleaned.is_empty());
    }

    #[test]
    fn sorts_by_order_index() {
        let mut options = poll_with_counts(&[0, 0, 0]).options;
        options.reverse();
        let sorted = sort_poll_options(&options);
        let order: Vec<u32> = sorted.iter().map(|o| o.order_index).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }
}
