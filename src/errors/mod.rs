pub mod types;
pub mod classification;
pub mod retry;

pub use types::PipelineError;
pub use classification::ErrorClassification;
pub use retry::{with_retry, BackoffPolicy, RetryExecutor, RetryPolicy};
