//! Application Use Cases
//!
//! Use cases orchestrate services and ports to fulfill application requirements.

mod poll_bars;

pub use poll_bars::{IterationError, IterationOutcome, PollBarsUseCase, PollSettings};
