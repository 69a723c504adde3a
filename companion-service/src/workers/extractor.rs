//! Keyword extraction backed by an external worker process.

use super::executor::{WorkerError, WorkerExecutor};
use async_trait::async_trait;

/// Extracts keyword tokens from free text.
///
/// Implementations may spawn a process per call or talk to a long-lived
/// worker; callers only rely on the returned token order.
#[async_trait]
pub trait KeywordExtractor: Send + Sync {
    async fn extract(&self, text: &str) -> Result<Vec<String>, WorkerError>;
}

/// Launches one worker process per call. The worker reads text on stdin and
/// prints a single comma-separated token line.
#[derive(Debug, Clone)]
pub struct ProcessKeywordExtractor {
    executor: WorkerExecutor,
}

impl ProcessKeywordExtractor {
    pub fn new(executor: WorkerExecutor) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl KeywordExtractor for ProcessKeywordExtractor {
    async fn extract(&self, text: &str) -> Result<Vec<String>, WorkerError> {
        let output = self.executor.run(text).await?;

        if !output.stderr.trim().is_empty() {
            tracing::warn!(
                program = %self.executor.program(),
                stderr = %output.stderr.trim(),
                "Extraction worker wrote diagnostics"
            );
        }

        Ok(parse_tokens(&output.stdout))
    }
}

/// Splits worker output on commas, trimming each token and dropping empties.
pub fn parse_tokens(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tokens_trims_and_drops_empty() {
        assert_eq!(parse_tokens(" a, the ,joy,, \n"), vec!["a", "the", "joy"]);
    }

    #[test]
    fn test_parse_tokens_empty_output() {
        assert!(parse_tokens("").is_empty());
        assert!(parse_tokens("\n").is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_extractor_reads_worker_line() {
        use std::time::Duration;

        let executor = WorkerExecutor::new(
            "sh",
            vec![
                "-c".to_string(),
                "cat >/dev/null; echo '공부, 친구 ,'".to_string(),
            ],
            Duration::from_secs(5),
        );
        let extractor = ProcessKeywordExtractor::new(executor);
        let words = extractor.extract("오늘 친구와 공부했다").await.unwrap();
        assert_eq!(words, vec!["공부", "친구"]);
    }
}
