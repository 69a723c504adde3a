mod aggregator;
mod executor;
mod extractor;

pub use aggregator::KeywordAggregator;
pub use executor::{WorkerError, WorkerExecutor, WorkerOutput};
pub use extractor::{parse_tokens, KeywordExtractor, ProcessKeywordExtractor};
