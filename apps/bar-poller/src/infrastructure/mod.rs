//! Infrastructure Layer - Adapters and external integrations.
//!
//! This layer contains the concrete implementations of the port interfaces
//! defined in the application layer.

/// Environment-driven configuration.
pub mod config;

/// Client Portal gateway REST session.
pub mod gateway;

/// Prometheus metrics instrumentation.
pub mod metrics;

/// OAuth refresh-token grant client.
pub mod oauth;

/// OpenTelemetry tracing integration.
pub mod telemetry;

/// JSON credential file with atomic replacement.
pub mod token_store;
