//! Answer checking for quiz questions.
//!
//! Answers are compared after lowercasing and dropping all whitespace, and a
//! small Levenshtein distance is forgiven so that typos still count.

/// Checks typed answers against the expected translation
#[derive(Debug, Clone)]
pub struct AnswerChecker {
    /// Largest edit distance still accepted as correct
    tolerance: usize,
}

impl Default for AnswerChecker {
    fn default() -> Self {
        Self { tolerance: 1 }
    }
}

impl AnswerChecker {
    pub fn new(tolerance: usize) -> Self {
        Self { tolerance }
    }

    /// Whether `given` should be accepted for `expected`
    ///
    /// An answer that is empty after normalization is never accepted.
    pub fn is_correct(&self, given: &str, expected: &str) -> bool {
        let given = normalize(given);
        if given.is_empty() {
            return false;
        }
        let expected = normalize(expected);
        levenshtein_distance(&given, &expected) <= self.tolerance
    }
}

/// Lowercase and strip every whitespace character
pub fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Calculate Levenshtein distance between two strings
fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    let mut prev_row: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr_row: Vec<usize> = vec![0; b_chars.len() + 1];

    for (i, a_char) in a_chars.iter().enumerate() {
        curr_row[0] = i + 1;

        for (j, b_char) in b_chars.iter().enumerate() {
            let cost = if a_char == b_char { 0 } else { 1 };
            curr_row[j + 1] = (prev_row[j + 1] + 1)
                .min(curr_row[j] + 1)
                .min(prev_row[j] + cost);
        }

        std::mem::swap(&mut prev_row, &mut curr_row);
    }

    prev_row[b_chars.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_distance() {
        assert_eq!(levenshtein_distance("hello", "hello"), 0);
        assert_eq!(levenshtein_distance("hello", "hallo"), 1);
        assert_eq!(levenshtein_distance("", "hello"), 5);
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  The Dog "), "thedog");
        assert_eq!(normalize("ÉCOLE"), "école");
    }

    // Case and whitespace never matter
    #[test]
    fn test_case_and_whitespace_insensitive() {
        let checker = AnswerChecker::default();
        assert!(checker.is_correct("TEST", "test"));
        assert!(checker.is_correct(" ice cream ", "icecream"));
        assert!(checker.is_correct("to  run", "To run"));
    }

    // One typo is forgiven, two are not
    #[test]
    fn test_typo_tolerance() {
        let checker = AnswerChecker::default();
        assert!(checker.is_correct("hous", "house"));
        assert!(checker.is_correct("hoese", "house"));
        assert!(!checker.is_correct("hoes", "house"));

        let strict = AnswerChecker::new(0);
        assert!(!strict.is_correct("hous", "house"));
    }

    #[test]
    fn test_empty_answer_is_wrong() {
        let checker = AnswerChecker::default();
        assert!(!checker.is_correct("", "a"));
        assert!(!checker.is_correct("   ", "a"));
    }
}
