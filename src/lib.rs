//! sealkit - Streaming authenticated file encryption toolkit
//!
//! This library encrypts files and streams with passphrase-derived or
//! RSA-wrapped keys, verifies them with HMAC-SHA512, and can hide file
//! names behind random identifiers backed by a local ledger.

pub mod config;
pub mod crypto;
pub mod error;
pub mod pass;
pub mod rename;
pub mod vault;

pub use config::KdfConfig;
pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::KdfConfig;
    pub use crate::crypto::Algorithm;
    pub use crate::error::{Error, Result};
}
