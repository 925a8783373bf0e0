/// Keyword-count spam heuristic for comment bodies.
///
/// Runs on every save, not only creation — an edit or a moderation write that
/// leaves spammy content in place gets re-flagged, silently overriding
/// whatever status was submitted.
const SPAM_KEYWORDS: [&str; 14] = [
    "viagra",
    "casino",
    "lottery",
    "winner",
    "congratulations",
    "click here",
    "free money",
    "make money fast",
    "work from home",
    "buy now",
    "limited time",
    "act now",
    "urgent",
    "guaranteed",
];

const SPAM_THRESHOLD: usize = 2;

pub fn is_spam(content: &str) -> bool {
    let content_lower = content.to_lowercase();
    let hits = SPAM_KEYWORDS
        .iter()
        .filter(|keyword| content_lower.contains(**keyword))
        .count();
    hits >= SPAM_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_content_passes() {
        assert!(!is_spam("Great write-up, thanks for sharing."));
        assert!(!is_spam(""));
    }

    #[test]
    fn single_keyword_is_not_enough() {
        assert!(!is_spam("This deal feels urgent to me"));
    }

    #[test]
    fn two_keywords_cross_the_threshold() {
        assert!(is_spam("Act now, this is urgent!"));
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert!(is_spam("BUY NOW!!! Limited Time offer"));
    }

    #[test]
    fn stacked_keywords_count_individually() {
        // "buy now", "guaranteed", "winner", "click here"
        assert!(is_spam("buy now guaranteed winner click here"));
    }

    #[test]
    fn keywords_match_as_substrings_of_longer_text() {
        assert!(is_spam(
            "Congratulations! You are our lottery winner, click here to claim."
        ));
    }
}
