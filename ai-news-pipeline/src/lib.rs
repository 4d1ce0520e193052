pub mod types;
pub mod config;
pub mod retry;
pub mod relevance;
pub mod traits;
pub mod sources;
pub mod classifier;
pub mod processing;
pub mod store;
pub mod cache;
pub mod pipeline;
pub mod server;

pub use types::*;
pub use config::PipelineConfig;
pub use retry::{ResilientCaller, RetryPolicy};
pub use relevance::{FilterVerdict, RelevanceFilter};
pub use traits::{GenerationClassifier, NewsSource};
pub use sources::NewsApiSource;
pub use classifier::OpenAiClassifier;
pub use processing::{BatchProcessor, EmptyBatchPolicy};
pub use store::{CacheStore, MemoryCacheStore, PostgresCacheStore};
pub use cache::CacheGateway;
pub use pipeline::{NewsPipeline, PipelineOutcome, ResultOrigin};
