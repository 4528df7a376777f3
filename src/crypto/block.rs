//! AES-256-GCM one-shot encryption
//!
//! Used for short payloads that fit in memory, such as the file names kept
//! in the rename ledger. The caller supplies the nonce; the suite layer
//! derives it from the same salt that produced the key, so both are fresh
//! per encryption.

use crate::crypto::{KEY_SIZE, NONCE_SIZE, TAG_SIZE};
use crate::error::{Error, Result};
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM};

/// Encrypt `plaintext`, returning ciphertext with the tag appended.
pub fn encrypt(
    key: &[u8; KEY_SIZE],
    nonce: &[u8; NONCE_SIZE],
    plaintext: &[u8],
) -> Result<Vec<u8>> {
    let unbound_key = UnboundKey::new(&AES_256_GCM, key)
        .map_err(|_| Error::Encryption("Failed to create encryption key".to_string()))?;
    let sealing_key = LessSafeKey::new(unbound_key);
    let nonce = Nonce::assume_unique_for_key(*nonce);

    let mut in_out = plaintext.to_vec();
    in_out.reserve(TAG_SIZE);
    sealing_key
        .seal_in_place_append_tag(nonce, Aad::empty(), &mut in_out)
        .map_err(|_| Error::Encryption("Encryption failed".to_string()))?;

    Ok(in_out)
}

/// Decrypt ciphertext produced by [`encrypt`].
///
/// Fails with [`Error::IntegrityFailure`] when the tag does not verify,
/// which also covers a wrong key.
pub fn decrypt(
    key: &[u8; KEY_SIZE],
    nonce: &[u8; NONCE_SIZE],
    ciphertext: &[u8],
) -> Result<Vec<u8>> {
    if ciphertext.len() < TAG_SIZE {
        return Err(Error::MalformedStream("Ciphertext too short".to_string()));
    }

    let unbound_key = UnboundKey::new(&AES_256_GCM, key)
        .map_err(|_| Error::Decryption("Failed to create decryption key".to_string()))?;
    let opening_key = LessSafeKey::new(unbound_key);
    let nonce = Nonce::assume_unique_for_key(*nonce);

    let mut in_out = ciphertext.to_vec();
    let plaintext = opening_key
        .open_in_place(nonce, Aad::empty(), &mut in_out)
        .map_err(|_| Error::IntegrityFailure)?;

    Ok(plaintext.to_vec())
}
