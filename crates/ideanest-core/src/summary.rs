//! Templated summaries for enriched ideas.

/// Separator used when enumerating tags (Chinese enumeration comma).
pub const TAG_SEPARATOR: &str = "、";

/// Sentence used when no keyword matched.
pub const GENERIC_SUMMARY: &str = "这是一个新想法，暂未识别出明确的主题。";

/// Compose the automated summary sentence for a set of matched tags.
///
/// Never fails: an empty tag set yields [`GENERIC_SUMMARY`].
pub fn compose_summary<S: AsRef<str>>(tags: &[S]) -> String {
    if tags.is_empty() {
        return GENERIC_SUMMARY.to_string();
    }
    let joined = tags
        .iter()
        .map(|t| t.as_ref())
        .collect::<Vec<_>>()
        .join(TAG_SEPARATOR);
    format!("这是关于{}的想法。", joined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_lists_all_tags() {
        let summary = compose_summary(&["工作", "重要"]);
        assert_eq!(summary, "这是关于工作、重要的想法。");
    }

    #[test]
    fn test_summary_single_tag_has_no_separator() {
        let summary = compose_summary(&["学习".to_string()]);
        assert!(summary.contains("学习"));
        assert!(!summary.contains(TAG_SEPARATOR));
    }

    #[test]
    fn test_summary_empty_is_generic() {
        let summary = compose_summary::<&str>(&[]);
        assert_eq!(summary, GENERIC_SUMMARY);
        assert!(!summary.is_empty());
    }
}
