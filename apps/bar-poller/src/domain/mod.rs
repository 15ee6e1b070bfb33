//! Domain Layer - Credential and market data types.
//!
//! Everything here is pure Rust with serialization support; time is always
//! passed in as epoch seconds so the rules stay deterministic.

/// Persisted OAuth credential and its validity rules.
pub mod credential;

/// Instruments, contracts and historical bars.
pub mod market_data;
