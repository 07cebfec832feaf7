pub mod retry;

pub use retry::{retry_call, RetryConfig, Retryable};
