use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReflectionSignal {
    pub sentiment: Sentiment,
    pub struggle_keywords: u32,
}

// Entries match whole words; a trailing `*` matches any word starting
// with the stem.
const POSITIVE: &[&str] = &[
    "clicked", "clear", "confident", "easy", "enjoyed", "fun", "good", "great", "got it",
    "makes sense", "productive", "understood",
];

const NEGATIVE: &[&str] = &[
    "annoyed", "bad", "bored", "exhausted", "hate", "overwhelmed", "tired", "terrible",
    "useless", "waste",
];

const STRUGGLE: &[&str] = &[
    "confus*", "stuck", "lost", "struggl*", "frustrat*", "difficult", "don't understand",
    "dont understand", "no idea", "unclear",
];

fn words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|w| w.trim_matches('\''))
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

fn word_matches(word: &str, pattern: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(stem) => word.starts_with(stem),
        None => word == pattern,
    }
}

fn count(words: &[String], lexicon: &[&str]) -> u32 {
    lexicon
        .iter()
        .map(|entry| {
            let parts: Vec<&str> = entry.split(' ').collect();
            words
                .windows(parts.len())
                .filter(|w| w.iter().zip(&parts).all(|(word, part)| word_matches(word, part)))
                .count() as u32
        })
        .sum()
}

/// Keyword-level classification of a free-text reflection.
///
/// Sentiment weighs positive against negative words only; struggle words
/// are reported separately.
pub fn classify_reflection(text: &str) -> ReflectionSignal {
    let words = words(text);
    let positive = count(&words, POSITIVE);
    let negative = count(&words, NEGATIVE);
    let struggle_keywords = count(&words, STRUGGLE);

    let sentiment = if negative > positive {
        Sentiment::Negative
    } else if positive > negative {
        Sentiment::Positive
    } else {
        Sentiment::Neutral
    };

    ReflectionSignal {
        sentiment,
        struggle_keywords,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_reflection() {
        let s = classify_reflection("Recursion finally clicked, great session");
        assert_eq!(s.sentiment, Sentiment::Positive);
        assert_eq!(s.struggle_keywords, 0);
    }

    #[test]
    fn struggle_words_are_counted() {
        let s = classify_reflection("I was stuck, confused and lost. Still confused.");
        assert_eq!(s.struggle_keywords, 4);
        assert_eq!(s.sentiment, Sentiment::Neutral);
    }

    #[test]
    fn words_match_on_boundaries() {
        let s = classify_reflection("The proof was unclear");
        assert_eq!(s.struggle_keywords, 1);
        assert_eq!(s.sentiment, Sentiment::Neutral);

        let s = classify_reflection("Nuclear physics example, all clear now");
        assert_eq!(s.struggle_keywords, 0);
        assert_eq!(s.sentiment, Sentiment::Positive);
    }

    #[test]
    fn one_struggle_word_does_not_set_sentiment() {
        let s = classify_reflection("Got stuck once but it was a good session");
        assert_eq!(s.struggle_keywords, 1);
        assert_eq!(s.sentiment, Sentiment::Positive);

        let s = classify_reflection("Tired and stuck");
        assert_eq!(s.sentiment, Sentiment::Negative);
    }

    #[test]
    fn phrases_and_stems() {
        let s = classify_reflection("I don't understand lifetimes, so frustrating. No idea.");
        assert_eq!(s.struggle_keywords, 3);
        let s = classify_reflection("It makes sense and I got it");
        assert_eq!(s.sentiment, Sentiment::Positive);
    }

    #[test]
    fn empty_is_neutral() {
        let s = classify_reflection("");
        assert_eq!(s.sentiment, Sentiment::Neutral);
        assert_eq!(s.struggle_keywords, 0);
    }
}
