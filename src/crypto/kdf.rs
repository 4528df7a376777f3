//! Key derivation for sealkit
//!
//! Argon2id turns a passphrase and salt into key material. Streaming
//! encryption draws 64 bytes at once and splits them so the cipher key and
//! the MAC key are independent.

use crate::config::KdfConfig;
use crate::crypto::{KEY_SIZE, SALT_SIZE, STREAM_KEY_LEN};
use crate::error::{Error, Result};
use argon2::{Argon2, Params, Version};
use rand::RngCore;
use zeroize::Zeroizing;

/// Key material derived from a passphrase
pub struct DerivedKey {
    /// The actual key bytes
    key: Zeroizing<Vec<u8>>,
    /// Salt used for derivation (needed for re-derivation)
    salt: [u8; SALT_SIZE],
}

impl DerivedKey {
    /// Get the raw key bytes
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// Get the salt
    pub fn salt(&self) -> &[u8; SALT_SIZE] {
        &self.salt
    }
}

/// Independent cipher and MAC keys for one stream
pub struct StreamKeys {
    cipher: Zeroizing<[u8; KEY_SIZE]>,
    auth: Zeroizing<[u8; KEY_SIZE]>,
}

impl StreamKeys {
    /// Key feeding the CTR keystream
    pub fn cipher(&self) -> &[u8; KEY_SIZE] {
        &self.cipher
    }

    /// Key feeding the HMAC authenticator
    pub fn auth(&self) -> &[u8; KEY_SIZE] {
        &self.auth
    }
}

/// Derive `len` bytes of key material from a passphrase.
///
/// A fresh random salt is generated when `salt` is `None`; pass the stored
/// salt back in to re-derive the same key.
pub fn derive_key(
    passphrase: &[u8],
    salt: Option<&[u8]>,
    len: usize,
    config: &KdfConfig,
) -> Result<DerivedKey> {
    let mut salt_bytes = [0u8; SALT_SIZE];
    match salt {
        Some(s) => {
            if s.len() != SALT_SIZE {
                return Err(Error::KeyDerivation(format!(
                    "Invalid salt length: expected {}, got {}",
                    SALT_SIZE,
                    s.len()
                )));
            }
            salt_bytes.copy_from_slice(s);
        }
        None => rand::thread_rng().fill_bytes(&mut salt_bytes),
    }

    let params = Params::new(
        config.argon2_memory_kib,
        config.argon2_iterations,
        config.argon2_parallelism,
        Some(len),
    )
    .map_err(|e| Error::KeyDerivation(format!("Invalid Argon2 parameters: {}", e)))?;
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params);

    let mut key = Zeroizing::new(vec![0u8; len]);
    argon2
        .hash_password_into(passphrase, &salt_bytes, key.as_mut_slice())
        .map_err(|e| Error::KeyDerivation(format!("Argon2 derivation failed: {}", e)))?;

    Ok(DerivedKey {
        key,
        salt: salt_bytes,
    })
}

/// Derive a cipher/MAC key pair for streaming encryption.
///
/// Returns the keys together with the salt that produced them so callers can
/// persist it ahead of the stream.
pub fn derive_stream_keys(
    passphrase: &[u8],
    salt: Option<&[u8]>,
    config: &KdfConfig,
) -> Result<(StreamKeys, [u8; SALT_SIZE])> {
    let derived = derive_key(passphrase, salt, STREAM_KEY_LEN, config)?;

    let mut cipher = Zeroizing::new([0u8; KEY_SIZE]);
    let mut auth = Zeroizing::new([0u8; KEY_SIZE]);
    cipher.copy_from_slice(&derived.key()[..KEY_SIZE]);
    auth.copy_from_slice(&derived.key()[KEY_SIZE..]);

    Ok((StreamKeys { cipher, auth }, *derived.salt()))
}
