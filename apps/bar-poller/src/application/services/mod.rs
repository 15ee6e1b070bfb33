//! Application Services
//!
//! Services compose ports into reusable operations for the use cases.

mod credential_manager;

pub use credential_manager::{CredentialError, CredentialManager};
