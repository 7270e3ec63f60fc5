//! Answer normalization and the three correctness tiers.

/// Normalizes a raw generation: trims, strips one leading `+` polarity
/// marker, strips surrounding quote/backtick wrapping.
pub(super) fn normalize_answer(raw: &str) -> String {
    let trimmed = raw.trim();
    let depolarized = trimmed.strip_prefix('+').unwrap_or(trimmed);
    depolarized
        .trim()
        .trim_matches(|c| matches!(c, '`' | '"' | '\''))
        .trim()
        .to_string()
}

/// Whitespace-free form used for equality and containment comparisons only.
fn comparable(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Correctness {
    pub weak: bool,
    pub strong: bool,
}

/// Strong: whitespace-insensitive equality. Weak: whitespace-insensitive
/// substring containment, tolerating commentary the model wraps around the
/// literal. Strong implies weak.
pub(super) fn score_answer(normalized_answer: &str, solution: &str) -> Correctness {
    let answer = comparable(normalized_answer);
    let solution = comparable(solution.trim());

    if solution.is_empty() {
        return Correctness {
            weak: false,
            strong: false,
        };
    }

    Correctness {
        weak: answer.contains(&solution),
        strong: answer == solution,
    }
}

/// Exact match of the retrieved template against the recorded expectation.
/// Domains without recorded labels never score retrieval-correct.
pub(super) fn retrieval_matches(retrieved: &str, expected: Option<&str>) -> bool {
    expected.is_some_and(|expected| retrieved.trim() == expected.trim())
}

#[cfg(test)]
mod tests {
    use super::{normalize_answer, retrieval_matches, score_answer};

    #[test]
    fn backtick_wrapping_and_spacing_do_not_block_strong() {
        let normalized = normalize_answer("`hasColor(apple,green)`");
        let correctness = score_answer(&normalized, "hasColor(apple, green)");
        assert!(correctness.strong);
        assert!(correctness.weak);
    }

    #[test]
    fn commentary_keeps_weak_but_loses_strong() {
        let normalized = normalize_answer("Sure, here it is: order(sushi, _, 14).");
        let correctness = score_answer(&normalized, "order(sushi,_,14)");
        assert!(correctness.weak);
        assert!(!correctness.strong);
    }

    #[test]
    fn leading_polarity_marker_is_stripped_once() {
        assert_eq!(normalize_answer("+bid(tv, 100)"), "bid(tv, 100)");
        assert_eq!(normalize_answer("++bid(tv, 100)"), "+bid(tv, 100)");
    }

    #[test]
    fn quote_wrapping_is_stripped() {
        assert_eq!(normalize_answer("\"bid(tv, 100)\""), "bid(tv, 100)");
        assert_eq!(normalize_answer("' bid(tv, 100) '"), "bid(tv, 100)");
    }

    #[test]
    fn empty_answers_score_false_on_both_tiers() {
        let correctness = score_answer("", "order(sushi,_,14)");
        assert!(!correctness.weak);
        assert!(!correctness.strong);
    }

    #[test]
    fn blank_solutions_never_match() {
        let correctness = score_answer("anything", "   ");
        assert!(!correctness.weak);
        assert!(!correctness.strong);
    }

    #[test]
    fn retrieval_requires_a_recorded_expectation() {
        assert!(retrieval_matches("bid(Service, V)", Some("bid(Service, V)\n")));
        assert!(!retrieval_matches("bid(Service, V)", Some("ask(Service)")));
        assert!(!retrieval_matches("bid(Service, V)", None));
    }
}
