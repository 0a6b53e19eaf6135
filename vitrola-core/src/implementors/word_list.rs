use std::collections::HashMap;

use async_trait::async_trait;
use log::debug;

use crate::{Moderation, ModerationCategory};

/// Blocks text containing listed words whose severity reaches the threshold.
///
/// Matching is case-insensitive and only considers whole words,
/// so "classic" is not caught by "ass".
#[derive(Debug, Clone)]
pub struct WordListModeration {
    words: HashMap<String, u8>,
    threshold: u8,
}

impl WordListModeration {
    pub fn new(threshold: u8) -> Self {
        Self {
            words: HashMap::new(),
            threshold,
        }
    }

    /// Adds a word with the given severity, replacing any earlier entry.
    pub fn with_word(mut self, word: &str, severity: u8) -> Self {
        self.words.insert(word.trim().to_lowercase(), severity);
        self
    }

    /// Parses a list in the form `word:severity,word:severity`.
    /// Entries without a severity are treated as maximally severe.
    pub fn parse(list: &str, threshold: u8) -> Self {
        list.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .fold(Self::new(threshold), |moderation, entry| {
                match entry.split_once(':') {
                    Some((word, severity)) => {
                        let severity = severity.trim().parse().unwrap_or(u8::MAX);
                        moderation.with_word(word, severity)
                    }
                    None => moderation.with_word(entry, u8::MAX),
                }
            })
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Returns the highest severity of any listed word found in the text
    pub fn severity_of(&self, text: &str) -> Option<u8> {
        text.to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter_map(|word| self.words.get(word).copied())
            .max()
    }
}

#[async_trait]
impl Moderation for WordListModeration {
    async fn is_allowed(&self, text: &str, category: ModerationCategory) -> bool {
        match self.severity_of(text) {
            Some(severity) if severity >= self.threshold => {
                debug!("Blocked {:?} with severity {}", category, severity);
                false
            }
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_words_and_severities() {
        let moderation = WordListModeration::parse("Chato:2, idiota:5,, bobo", 3);

        assert_eq!(moderation.len(), 3);
        assert_eq!(moderation.severity_of("que CHATO"), Some(2));
        assert_eq!(moderation.severity_of("bobo e idiota"), Some(u8::MAX));
        assert_eq!(moderation.severity_of("tudo certo"), None);
    }

    #[tokio::test]
    async fn blocks_only_whole_words_over_the_threshold() {
        let moderation = WordListModeration::new(3)
            .with_word("idiota", 5)
            .with_word("chato", 2);

        let category = ModerationCategory::Dedication;

        assert!(!moderation.is_allowed("seu idiota!", category).await);
        assert!(moderation.is_allowed("idiotas", category).await);
        assert!(moderation.is_allowed("chato demais", category).await);
    }
}
