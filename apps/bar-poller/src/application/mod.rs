//! Application Layer - Use cases and port definitions.
//!
//! This layer contains the application services and port interfaces
//! that define how the domain interacts with external systems.

/// Port interfaces for external systems (token storage, token endpoint, gateway).
pub mod ports;

/// Application services (credential lifecycle).
pub mod services;

/// Use cases (the polling loop).
pub mod use_cases;
