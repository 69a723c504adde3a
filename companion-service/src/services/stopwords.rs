//! Stopword list loaded once at startup.

use std::collections::HashSet;
use std::path::Path;

/// Exact-match token exclusion set.
///
/// Tokens are trimmed before comparison; case is preserved as loaded.
#[derive(Debug, Clone, Default)]
pub struct StopwordFilter {
    words: HashSet<String>,
}

impl StopwordFilter {
    /// Reads a newline-delimited list. An unreadable file yields an empty
    /// filter so the service still starts.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let filter = Self::from_words(content.lines());
                tracing::info!(
                    path = %path.display(),
                    count = filter.len(),
                    "Stopwords loaded"
                );
                filter
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to load stopwords, keyword filtering disabled"
                );
                Self::default()
            }
        }
    }

    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_string())
            .filter(|w| !w.is_empty())
            .collect();
        Self { words }
    }

    pub fn exclude(&self, token: &str) -> bool {
        self.words.contains(token.trim())
    }

    /// Drops stopwords and tokens that are empty after trimming.
    pub fn apply(&self, tokens: Vec<String>) -> Vec<String> {
        tokens
            .into_iter()
            .filter_map(|token| {
                let trimmed = token.trim();
                if trimmed.is_empty() || self.exclude(trimmed) {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_trims_and_skips_blank_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "그리고\r\n  오늘 \n\n하루\n").unwrap();

        let filter = StopwordFilter::load(file.path());
        assert_eq!(filter.len(), 3);
        assert!(filter.exclude("오늘"));
        assert!(filter.exclude(" 하루 "));
        assert!(!filter.exclude("친구"));
    }

    #[test]
    fn test_missing_file_yields_empty_filter() {
        let filter = StopwordFilter::load("/nonexistent/stopwords.txt");
        assert!(filter.is_empty());
        assert!(!filter.exclude("a"));
    }

    #[test]
    fn test_case_is_preserved() {
        let filter = StopwordFilter::from_words(["The"]);
        assert!(filter.exclude("The"));
        assert!(!filter.exclude("the"));
    }

    #[test]
    fn test_apply_drops_stopwords_and_empty_tokens() {
        let filter = StopwordFilter::from_words(["a", "the"]);
        let tokens = vec!["a".into(), " ".into(), "the".into(), " joy ".into()];
        assert_eq!(filter.apply(tokens), vec!["joy"]);
    }
}
