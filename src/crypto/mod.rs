//! Cryptography module for sealkit
//!
//! Provides the streaming AES-256-CTR + HMAC-SHA512 construction, one-shot
//! AES-256-GCM, the legacy RC4 format, Argon2id key derivation and the
//! RSA-OAEP envelope used for public-key file encryption.

pub mod block;
pub mod kdf;
pub mod legacy;
pub mod lookahead;
pub mod pubkey;
pub mod stream;
pub mod suite;

pub use kdf::{derive_key, derive_stream_keys, DerivedKey, StreamKeys};
pub use suite::Algorithm;

/// Size of AES-256 key in bytes
pub const KEY_SIZE: usize = 32;

/// Size of salt for key derivation
pub const SALT_SIZE: usize = 16;

/// Size of CTR initialization vector in bytes
pub const IV_SIZE: usize = 16;

/// Size of the HMAC-SHA512 authentication tag in bytes
pub const MAC_SIZE: usize = 64;

/// Size of GCM nonce in bytes
pub const NONCE_SIZE: usize = 12;

/// Size of GCM authentication tag in bytes
pub const TAG_SIZE: usize = 16;

/// Size of the SHA-256 passphrase tag on legacy streams
pub const PASS_TAG_SIZE: usize = 32;

/// Chunk size for streaming reads
pub const CHUNK_SIZE: usize = 16 * 1024;

/// Version byte leading every CTR stream frame
pub const STREAM_VERSION: u8 = 0x01;

/// Key material drawn for a stream (cipher key + MAC key)
pub const STREAM_KEY_LEN: usize = 64;
