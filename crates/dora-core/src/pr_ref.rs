//! Pull-request references in free-text commit messages.
//!
//! The match is a heuristic: the first `#<digits>` wins, so an unrelated
//! `#123` earlier in the message produces a false positive.

use std::sync::LazyLock;

use regex::Regex;

static PR_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#(\d+)").expect("PR reference pattern is valid"));

/// Returns the number of the first `#<digits>` reference in `message`.
///
/// Returns `None` when there is no reference or the digits overflow `i64`.
pub fn extract_pr_number(message: &str) -> Option<i64> {
    PR_REF
        .captures(message)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<i64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn squash_merge_title() {
        assert_eq!(extract_pr_number("Add metrics endpoint (#123)"), Some(123));
    }

    #[test]
    fn merge_commit_message() {
        assert_eq!(
            extract_pr_number("Merge pull request #7 from org/feature\n\nDetails"),
            Some(7)
        );
    }

    #[test]
    fn first_match_wins() {
        assert_eq!(extract_pr_number("Fixes #12, follow-up to #34"), Some(12));
    }

    #[test]
    fn no_reference() {
        assert_eq!(extract_pr_number("bump version"), None);
        assert_eq!(extract_pr_number("# heading"), None);
    }

    #[test]
    fn overflow_is_ignored() {
        assert_eq!(extract_pr_number("#99999999999999999999999"), None);
    }
}
