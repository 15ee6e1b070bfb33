//! Token Store Port (Driven Port)
//!
//! Persistence of the single credential record.

use crate::domain::credential::Credential;

/// Errors from the credential store.
///
/// "No credential stored" is not an error; it is `Ok(None)` from
/// [`TokenStorePort::load`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenStoreError {
    /// The stored record exists but could not be read.
    #[error("failed to read credential file {path}: {message}")]
    Read {
        /// Location of the record.
        path: String,
        /// Underlying error.
        message: String,
    },

    /// The stored record exists but is not a valid credential.
    #[error("credential file {path} is corrupt: {message}")]
    Corrupt {
        /// Location of the record.
        path: String,
        /// Parse error.
        message: String,
    },

    /// The record could not be written. The previous record is unchanged.
    #[error("failed to write credential file {path}: {message}")]
    Write {
        /// Location of the record.
        path: String,
        /// Underlying error.
        message: String,
    },
}

/// Port for loading and saving the persisted credential.
pub trait TokenStorePort: Send + Sync {
    /// Load the stored credential, or `None` if nothing has been stored yet.
    fn load(&self) -> Result<Option<Credential>, TokenStoreError>;

    /// Replace the stored credential. Readers never observe a partial record.
    fn save(&self, credential: &Credential) -> Result<(), TokenStoreError>;

    /// Human-readable location of the record, for diagnostics.
    fn location(&self) -> String;
}
