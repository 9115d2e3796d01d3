//! Tokenizer shared by profile and job text.

use std::collections::HashSet;

/// Words too common in academic adverts and CVs to signal relevance.
const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "in", "into", "is", "it",
    "of", "on", "or", "the", "to", "with", "within", "we", "you", "our", "your", "this", "that",
    "job", "jobs", "post", "role", "position", "vacancy", "university", "college", "school",
    "department", "faculty", "institute", "centre", "center", "uk", "fixed", "term",
    "permanent", "full", "part", "time",
];

/// Common field abbreviations and the phrase they stand for in adverts.
const ABBREVIATIONS: &[(&str, &str)] = &[
    ("ml", "machine learning"),
    ("ai", "artificial intelligence"),
    ("nlp", "natural language processing"),
    ("cv", "computer vision"),
    ("rl", "reinforcement learning"),
    ("hpc", "high performance computing"),
    ("hci", "human computer interaction"),
    ("stats", "statistics"),
];

/// Lowercases and splits on anything but alphanumerics, `+` and `#`
/// (so `c++` and `c#` survive). Drops stop words and single characters.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '+' || c == '#'))
        .filter(|t| t.chars().count() >= 2 && !STOP_WORDS.contains(t))
        .map(str::to_string)
        .collect()
}

pub fn token_set(text: &str) -> HashSet<String> {
    tokenize(text).into_iter().collect()
}

/// Space-joined token stream, used for phrase containment checks.
pub fn normalized(text: &str) -> String {
    tokenize(text).join(" ")
}

/// Expansion for an abbreviation token, if it is a known one.
pub fn expand_abbreviation(token: &str) -> Option<&'static str> {
    ABBREVIATIONS
        .iter()
        .find(|(short, _)| *short == token)
        .map(|(_, long)| *long)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_lowercases_and_drops_stop_words() {
        assert_eq!(
            tokenize("Lecturer in Machine Learning, University of Bath"),
            vec!["lecturer", "machine", "learning", "bath"]
        );
    }

    #[test]
    fn test_tokenize_keeps_language_symbols() {
        assert_eq!(tokenize("C++ / C# / R"), vec!["c++", "c#"]);
    }

    #[test]
    fn test_normalized_joins_tokens() {
        assert_eq!(normalized("Research Fellow: Machine-Learning"), "research fellow machine learning");
    }

    #[test]
    fn test_expand_abbreviation() {
        assert_eq!(expand_abbreviation("ml"), Some("machine learning"));
        assert_eq!(expand_abbreviation("python"), None);
    }
}
