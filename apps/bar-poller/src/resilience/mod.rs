//! Resilience - Bounded retry with exponential backoff.
//!
//! Policy (how many retries, backoff shape) is kept apart from mechanism:
//! an operation reports each attempt as an [`AttemptOutcome`] and
//! [`retry_with_backoff`] decides whether to wait and try again.
//!
//! Backoff waits are cancellation-aware so a shutdown request never has to
//! sit out a full delay.

mod policy;
mod retry;

pub use policy::RetryPolicy;
pub use retry::{AttemptOutcome, RetryError, retry_with_backoff};
