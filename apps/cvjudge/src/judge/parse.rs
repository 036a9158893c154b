//! Lenient extraction of structured answers from free-form judge replies.

use std::sync::OnceLock;

use regex::Regex;

/// Labels of the three-line scored comparison layout.
pub const CV_1_SCORE_LABEL: &str = "CV 1 Score";
pub const CV_2_SCORE_LABEL: &str = "CV 2 Score";
pub const WINNER_LABEL: &str = "Winner";

fn score_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // "100" is tried last so that "10" followed by "0" falls through to it.
    RE.get_or_init(|| Regex::new(r"\b([1-9][0-9]?|100)\b").expect("static score pattern"))
}

fn labeled_regex(label: &str) -> Regex {
    Regex::new(&format!(r"{}:\s*(\d+)", regex::escape(label))).expect("escaped label pattern")
}

fn labeled_regexes() -> &'static [(&'static str, Regex); 3] {
    static RES: OnceLock<[(&'static str, Regex); 3]> = OnceLock::new();
    RES.get_or_init(|| {
        [
            (CV_1_SCORE_LABEL, labeled_regex(CV_1_SCORE_LABEL)),
            (CV_2_SCORE_LABEL, labeled_regex(CV_2_SCORE_LABEL)),
            (WINNER_LABEL, labeled_regex(WINNER_LABEL)),
        ]
    })
}

/// First standalone integer in [1, 100] anywhere in `text`, or 0 when there is none.
pub fn extract_score(text: &str) -> u32 {
    score_regex()
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

/// First line of the trimmed reply, itself trimmed. No validation of the token.
pub fn first_line(text: &str) -> String {
    text.trim().lines().next().unwrap_or_default().trim().to_string()
}

/// Digits following `<label>:`, or `None` when the label is absent.
pub fn extract_labeled(label: &str, text: &str) -> Option<u64> {
    let owned;
    let re = match labeled_regexes().iter().find(|(l, _)| *l == label) {
        Some((_, re)) => re,
        None => {
            owned = labeled_regex(label);
            &owned
        }
    };
    re.captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_number_is_score() {
        assert_eq!(extract_score("87"), 87);
        assert_eq!(extract_score("  42\n"), 42);
    }

    #[test]
    fn test_score_tolerates_prose() {
        assert_eq!(extract_score("I would rate this CV a 73 out of 100."), 73);
    }

    #[test]
    fn test_hundred_is_a_valid_score() {
        assert_eq!(extract_score("100"), 100);
        assert_eq!(extract_score("Score: 100/100"), 100);
    }

    #[test]
    fn test_out_of_range_numbers_are_skipped() {
        assert_eq!(extract_score("0"), 0);
        assert_eq!(extract_score("150"), 0);
        assert_eq!(extract_score("2024 was a good year, so 64"), 64);
    }

    #[test]
    fn test_no_number_scores_zero() {
        assert_eq!(extract_score("This candidate seems strong."), 0);
        assert_eq!(extract_score(""), 0);
    }

    #[test]
    fn test_first_line_takes_leading_token() {
        assert_eq!(first_line("2\n"), "2");
        assert_eq!(first_line("\n  1  \nBecause CV 1 lists more skills."), "1");
        assert_eq!(first_line("CV 2 is better"), "CV 2 is better");
        assert_eq!(first_line("   "), "");
    }

    #[test]
    fn test_labeled_fields_extracted_independently() {
        let reply = "CV 1 Score: 78\nCV 2 Score:  64\nWinner: 1";
        assert_eq!(extract_labeled(CV_1_SCORE_LABEL, reply), Some(78));
        assert_eq!(extract_labeled(CV_2_SCORE_LABEL, reply), Some(64));
        assert_eq!(extract_labeled(WINNER_LABEL, reply), Some(1));
    }

    #[test]
    fn test_missing_label_is_none() {
        let reply = "CV 1 Score: 78\nWinner: 2";
        assert_eq!(extract_labeled(CV_2_SCORE_LABEL, reply), None);
        assert_eq!(extract_labeled(WINNER_LABEL, reply), Some(2));
    }

    #[test]
    fn test_label_without_digits_is_none() {
        assert_eq!(extract_labeled(WINNER_LABEL, "Winner: CV 1"), None);
    }

    #[test]
    fn test_unknown_label_still_works() {
        assert_eq!(extract_labeled("Confidence", "Confidence: 9"), Some(9));
    }
}
