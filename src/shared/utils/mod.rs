pub mod retry;

pub use retry::{retry_transient, retry_with_backoff, RetryConfig};
