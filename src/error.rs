//! Error types for sealkit

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for sealkit
#[derive(Error, Debug)]
pub enum Error {
    // Stream format errors
    #[error("Malformed stream: {0}")]
    MalformedStream(String),

    #[error("Container version mismatch: {0}")]
    VersionMismatch(String),

    #[error("Integrity check failed: authentication tag mismatch")]
    IntegrityFailure,

    #[error("Wrong passphrase")]
    WrongPassphrase,

    // Crypto errors
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("Decryption error: {0}")]
    Decryption(String),

    #[error("Key derivation error: {0}")]
    KeyDerivation(String),

    #[error("Public key error: {0}")]
    PublicKey(String),

    // Rename ledger errors
    #[error("ID not found in ledger: {0}")]
    IdNotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    // Encoding errors
    #[error("Encoding error: {0}")]
    Encoding(String),

    // Config errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Encoding(e.to_string())
    }
}
