//! Scatter/gather keyword extraction across emotion buckets.

use super::extractor::KeywordExtractor;
use crate::models::{EmotionBucket, ExtractionResult};
use crate::services::metrics::record_extraction;
use crate::services::stopwords::StopwordFilter;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;

/// Runs one extraction per bucket concurrently and joins on all of them.
///
/// Results come back in input order. A failing bucket yields an empty word
/// list and never affects its siblings.
#[derive(Clone)]
pub struct KeywordAggregator {
    extractor: Arc<dyn KeywordExtractor>,
    stopwords: Arc<StopwordFilter>,
    permits: Arc<Semaphore>,
}

impl KeywordAggregator {
    pub fn new(
        extractor: Arc<dyn KeywordExtractor>,
        stopwords: Arc<StopwordFilter>,
        max_concurrency: usize,
    ) -> Self {
        Self {
            extractor,
            stopwords,
            permits: Arc::new(Semaphore::new(max_concurrency.max(1))),
        }
    }

    pub async fn aggregate(&self, buckets: Vec<EmotionBucket>) -> Vec<ExtractionResult> {
        if buckets.is_empty() {
            return Vec::new();
        }

        let bucket_count = buckets.len();
        let start = Instant::now();

        let results = join_all(buckets.into_iter().map(|bucket| self.extract_bucket(bucket))).await;

        tracing::info!(
            bucket_count,
            duration_ms = start.elapsed().as_millis() as u64,
            "Keyword aggregation complete"
        );

        results
    }

    async fn extract_bucket(&self, bucket: EmotionBucket) -> ExtractionResult {
        let EmotionBucket {
            emotion,
            count,
            source_text,
        } = bucket;

        // Never closed.
        let _permit = match self.permits.acquire().await {
            Ok(permit) => Some(permit),
            Err(e) => {
                tracing::error!(error = %e, "Extraction semaphore closed");
                None
            }
        };

        let start = Instant::now();
        let words = match self.extractor.extract(&source_text).await {
            Ok(tokens) => {
                record_extraction("ok", start.elapsed().as_secs_f64());
                self.stopwords.apply(tokens)
            }
            Err(e) => {
                record_extraction(e.outcome(), start.elapsed().as_secs_f64());
                tracing::warn!(
                    emotion = %emotion,
                    error = %e,
                    "Keyword extraction failed, returning no words"
                );
                Vec::new()
            }
        };

        tracing::debug!(emotion = %emotion, words = ?words, "Extracted keywords");

        ExtractionResult {
            emotion,
            count,
            words,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workers::executor::WorkerError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Returns canned output keyed by input text; unknown text fails.
    struct ScriptedExtractor {
        outputs: HashMap<String, (Duration, &'static str)>,
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl ScriptedExtractor {
        fn new(outputs: &[(&str, u64, &'static str)]) -> Self {
            Self {
                outputs: outputs
                    .iter()
                    .map(|(text, delay, out)| {
                        (text.to_string(), (Duration::from_millis(*delay), *out))
                    })
                    .collect(),
                calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl KeywordExtractor for ScriptedExtractor {
        async fn extract(&self, text: &str) -> Result<Vec<String>, WorkerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            let result = match self.outputs.get(text) {
                Some((delay, out)) => {
                    tokio::time::sleep(*delay).await;
                    Ok(crate::workers::extractor::parse_tokens(out))
                }
                None => Err(WorkerError::Timeout(Duration::from_millis(1))),
            };

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            result
        }
    }

    fn bucket(emotion: &str, count: i64, text: &str) -> EmotionBucket {
        EmotionBucket {
            emotion: emotion.to_string(),
            count,
            source_text: text.to_string(),
        }
    }

    fn aggregator(extractor: Arc<ScriptedExtractor>, limit: usize) -> KeywordAggregator {
        KeywordAggregator::new(
            extractor,
            Arc::new(StopwordFilter::from_words(["a", "the"])),
            limit,
        )
    }

    #[tokio::test]
    async fn test_empty_buckets_launch_no_worker() {
        let extractor = Arc::new(ScriptedExtractor::new(&[]));
        let results = aggregator(extractor.clone(), 4).aggregate(Vec::new()).await;
        assert!(results.is_empty());
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_filters_stopwords_per_bucket() {
        let extractor = Arc::new(ScriptedExtractor::new(&[
            ("happy text", 0, "a, the, joy"),
            ("sad text", 0, "a, grief"),
        ]));
        let results = aggregator(extractor, 4)
            .aggregate(vec![bucket("happy", 5, "happy text"), bucket("sad", 3, "sad text")])
            .await;

        assert_eq!(
            results,
            vec![
                ExtractionResult {
                    emotion: "happy".into(),
                    count: 5,
                    words: vec!["joy".into()],
                },
                ExtractionResult {
                    emotion: "sad".into(),
                    count: 3,
                    words: vec!["grief".into()],
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_results_keep_input_order_regardless_of_completion() {
        let extractor = Arc::new(ScriptedExtractor::new(&[
            ("slow", 80, "first"),
            ("fast", 0, "second"),
        ]));
        let results = aggregator(extractor, 4)
            .aggregate(vec![bucket("joy", 2, "slow"), bucket("anger", 1, "fast")])
            .await;

        let emotions: Vec<_> = results.iter().map(|r| r.emotion.as_str()).collect();
        assert_eq!(emotions, vec!["joy", "anger"]);
        assert_eq!(results[0].words, vec!["first"]);
    }

    #[tokio::test]
    async fn test_failed_bucket_degrades_to_empty_words() {
        let extractor = Arc::new(ScriptedExtractor::new(&[("ok", 0, "grief")]));
        let results = aggregator(extractor, 4)
            .aggregate(vec![
                bucket("happy", 5, "crashes"),
                bucket("sad", 3, "ok"),
                bucket("calm", 1, "also crashes"),
            ])
            .await;

        assert_eq!(results.len(), 3);
        assert!(results[0].words.is_empty());
        assert_eq!(results[1].words, vec!["grief"]);
        assert!(results[2].words.is_empty());
    }

    #[tokio::test]
    async fn test_buckets_run_concurrently() {
        let extractor = Arc::new(ScriptedExtractor::new(&[
            ("one", 50, "x"),
            ("two", 50, "y"),
            ("three", 50, "z"),
        ]));
        aggregator(extractor.clone(), 4)
            .aggregate(vec![bucket("a", 1, "one"), bucket("b", 1, "two"), bucket("c", 1, "three")])
            .await;
        assert_eq!(extractor.max_in_flight.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_concurrency_limit_is_respected() {
        let extractor = Arc::new(ScriptedExtractor::new(&[
            ("one", 20, "x"),
            ("two", 20, "y"),
            ("three", 20, "z"),
        ]));
        let results = aggregator(extractor.clone(), 1)
            .aggregate(vec![bucket("a", 1, "one"), bucket("b", 1, "two"), bucket("c", 1, "three")])
            .await;
        assert_eq!(results.len(), 3);
        assert_eq!(extractor.max_in_flight.load(Ordering::SeqCst), 1);
    }
}
