//! Cipher suite dispatch
//!
//! Callers pick an [`Algorithm`]; this module wires the passphrase through
//! key derivation and into the matching construction. Streaming suites
//! prepend whatever state decryption needs (the KDF salt for AES-256-CTR,
//! the passphrase tag for RC4). The one-shot suite appends the salt after
//! the ciphertext instead.

use crate::config::KdfConfig;
use crate::crypto::{block, kdf, legacy, stream};
use crate::crypto::{KEY_SIZE, NONCE_SIZE, SALT_SIZE, TAG_SIZE};
use crate::error::{Error, Result};
use std::fmt;
use std::io::{ErrorKind, Read, Write};
use zeroize::Zeroizing;

/// Supported cipher suites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    /// AES-256-CTR with HMAC-SHA512, streaming
    Aes256Ctr,
    /// AES-256-GCM, one-shot
    Aes256Gcm,
    /// RC4 keystream, legacy, no integrity
    Rc4,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::Aes256Ctr => write!(f, "AES-256-CTR"),
            Algorithm::Aes256Gcm => write!(f, "AES-256-GCM"),
            Algorithm::Rc4 => write!(f, "RC4"),
        }
    }
}

/// Encrypt `reader` into `writer` under a streaming suite.
///
/// For AES-256-CTR the 16-byte KDF salt is written first, then the framed
/// stream. The one-shot GCM suite is rejected here.
pub fn stream_encrypt<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    passphrase: &[u8],
    algorithm: Algorithm,
    config: &KdfConfig,
) -> Result<()> {
    match algorithm {
        Algorithm::Aes256Ctr => {
            let (keys, salt) = kdf::derive_stream_keys(passphrase, None, config)?;
            writer.write_all(&salt)?;
            stream::encrypt(reader, writer, keys.cipher(), keys.auth())
        }
        Algorithm::Rc4 => legacy::encrypt(reader, writer, passphrase),
        Algorithm::Aes256Gcm => Err(Error::UnsupportedAlgorithm(format!(
            "{} cannot encrypt streams",
            algorithm
        ))),
    }
}

/// Decrypt a stream produced by [`stream_encrypt`] with the same suite.
pub fn stream_decrypt<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    passphrase: &[u8],
    algorithm: Algorithm,
    config: &KdfConfig,
) -> Result<()> {
    match algorithm {
        Algorithm::Aes256Ctr => {
            let mut salt = [0u8; SALT_SIZE];
            reader.read_exact(&mut salt).map_err(|e| {
                if e.kind() == ErrorKind::UnexpectedEof {
                    Error::MalformedStream("Truncated key salt".to_string())
                } else {
                    Error::Io(e)
                }
            })?;

            let (keys, _) = kdf::derive_stream_keys(passphrase, Some(&salt), config)?;
            stream::decrypt(reader, writer, keys.cipher(), keys.auth())
        }
        Algorithm::Rc4 => legacy::decrypt(reader, writer, passphrase),
        Algorithm::Aes256Gcm => Err(Error::UnsupportedAlgorithm(format!(
            "{} cannot decrypt streams",
            algorithm
        ))),
    }
}

/// Encrypt a small in-memory payload under a one-shot suite.
///
/// Output layout: `[ciphertext || tag][salt: 16]`. The trailing salt lets
/// [`block_decrypt`] re-derive the key; the GCM nonce is the salt's first
/// 12 bytes, fresh because the salt is fresh.
pub fn block_encrypt(
    plaintext: &[u8],
    passphrase: &[u8],
    algorithm: Algorithm,
    config: &KdfConfig,
) -> Result<Vec<u8>> {
    match algorithm {
        Algorithm::Aes256Gcm => {
            let derived = kdf::derive_key(passphrase, None, KEY_SIZE, config)?;
            let (key, nonce) = block_key_nonce(&derived);

            let mut out = block::encrypt(&key, &nonce, plaintext)?;
            out.extend_from_slice(derived.salt());
            Ok(out)
        }
        Algorithm::Aes256Ctr | Algorithm::Rc4 => Err(Error::UnsupportedAlgorithm(format!(
            "{} cannot encrypt blocks",
            algorithm
        ))),
    }
}

/// Decrypt a payload produced by [`block_encrypt`] with the same suite.
pub fn block_decrypt(
    data: &[u8],
    passphrase: &[u8],
    algorithm: Algorithm,
    config: &KdfConfig,
) -> Result<Vec<u8>> {
    match algorithm {
        Algorithm::Aes256Gcm => {
            if data.len() < SALT_SIZE + TAG_SIZE {
                return Err(Error::MalformedStream(
                    "Block too short to carry a salt and tag".to_string(),
                ));
            }

            let (body, salt) = data.split_at(data.len() - SALT_SIZE);
            let derived = kdf::derive_key(passphrase, Some(salt), KEY_SIZE, config)?;
            let (key, nonce) = block_key_nonce(&derived);

            block::decrypt(&key, &nonce, body)
        }
        Algorithm::Aes256Ctr | Algorithm::Rc4 => Err(Error::UnsupportedAlgorithm(format!(
            "{} cannot decrypt blocks",
            algorithm
        ))),
    }
}

fn block_key_nonce(derived: &kdf::DerivedKey) -> (Zeroizing<[u8; KEY_SIZE]>, [u8; NONCE_SIZE]) {
    let mut key = Zeroizing::new([0u8; KEY_SIZE]);
    key.copy_from_slice(derived.key());

    let mut nonce = [0u8; NONCE_SIZE];
    nonce.copy_from_slice(&derived.salt()[..NONCE_SIZE]);

    (key, nonce)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{PASS_TAG_SIZE, STREAM_VERSION};
    use std::io::Cursor;

    fn test_config() -> KdfConfig {
        KdfConfig {
            argon2_memory_kib: 1024,
            argon2_iterations: 1,
            argon2_parallelism: 1,
        }
    }

    fn stream_round_trip(algorithm: Algorithm, plaintext: &[u8]) -> Vec<u8> {
        let config = test_config();
        let mut ciphertext = Vec::new();
        stream_encrypt(
            &mut Cursor::new(plaintext),
            &mut ciphertext,
            b"pass",
            algorithm,
            &config,
        )
        .unwrap();

        let mut out = Vec::new();
        stream_decrypt(
            &mut Cursor::new(&ciphertext),
            &mut out,
            b"pass",
            algorithm,
            &config,
        )
        .unwrap();
        assert_eq!(out, plaintext);
        ciphertext
    }

    #[test]
    fn test_ctr_stream_layout() {
        let ciphertext = stream_round_trip(Algorithm::Aes256Ctr, b"hello");
        // salt, version byte, IV, ciphertext, tag
        assert_eq!(ciphertext.len(), SALT_SIZE + 1 + 16 + 5 + 64);
        assert_eq!(ciphertext[SALT_SIZE], STREAM_VERSION);
    }

    #[test]
    fn test_rc4_stream_layout() {
        let ciphertext = stream_round_trip(Algorithm::Rc4, b"hello");
        assert_eq!(ciphertext.len(), PASS_TAG_SIZE + 5);
    }

    #[test]
    fn test_ctr_wrong_passphrase_is_integrity_failure() {
        let config = test_config();
        let mut ciphertext = Vec::new();
        stream_encrypt(
            &mut Cursor::new(b"hello".as_slice()),
            &mut ciphertext,
            b"pass",
            Algorithm::Aes256Ctr,
            &config,
        )
        .unwrap();

        let mut out = Vec::new();
        let result = stream_decrypt(
            &mut Cursor::new(&ciphertext),
            &mut out,
            b"wrong",
            Algorithm::Aes256Ctr,
            &config,
        );
        assert!(matches!(result, Err(Error::IntegrityFailure)));
    }

    #[test]
    fn test_rc4_wrong_passphrase() {
        let config = test_config();
        let mut ciphertext = Vec::new();
        stream_encrypt(
            &mut Cursor::new(b"hello".as_slice()),
            &mut ciphertext,
            b"pass",
            Algorithm::Rc4,
            &config,
        )
        .unwrap();

        let mut out = Vec::new();
        let result = stream_decrypt(
            &mut Cursor::new(&ciphertext),
            &mut out,
            b"wrong",
            Algorithm::Rc4,
            &config,
        );
        assert!(matches!(result, Err(Error::WrongPassphrase)));
    }

    #[test]
    fn test_gcm_rejected_for_streams() {
        let config = test_config();
        let mut out = Vec::new();

        let result = stream_encrypt(
            &mut Cursor::new(b"hello".as_slice()),
            &mut out,
            b"pass",
            Algorithm::Aes256Gcm,
            &config,
        );
        assert!(matches!(result, Err(Error::UnsupportedAlgorithm(_))));

        let result = stream_decrypt(
            &mut Cursor::new(b"hello".as_slice()),
            &mut out,
            b"pass",
            Algorithm::Aes256Gcm,
            &config,
        );
        assert!(matches!(result, Err(Error::UnsupportedAlgorithm(_))));
    }

    #[test]
    fn test_block_round_trip() {
        let config = test_config();
        let ciphertext =
            block_encrypt(b"secret-name.txt", b"pass", Algorithm::Aes256Gcm, &config).unwrap();
        assert_eq!(ciphertext.len(), 15 + TAG_SIZE + SALT_SIZE);

        let plaintext =
            block_decrypt(&ciphertext, b"pass", Algorithm::Aes256Gcm, &config).unwrap();
        assert_eq!(plaintext, b"secret-name.txt");
    }

    #[test]
    fn test_block_salts_are_fresh() {
        let config = test_config();
        let a = block_encrypt(b"name", b"pass", Algorithm::Aes256Gcm, &config).unwrap();
        let b = block_encrypt(b"name", b"pass", Algorithm::Aes256Gcm, &config).unwrap();

        assert_ne!(a, b);
        assert_ne!(a[a.len() - SALT_SIZE..], b[b.len() - SALT_SIZE..]);
    }

    #[test]
    fn test_block_wrong_passphrase_is_integrity_failure() {
        let config = test_config();
        let ciphertext =
            block_encrypt(b"secret-name.txt", b"pass", Algorithm::Aes256Gcm, &config).unwrap();

        let result = block_decrypt(&ciphertext, b"wrong", Algorithm::Aes256Gcm, &config);
        assert!(matches!(result, Err(Error::IntegrityFailure)));
    }

    #[test]
    fn test_block_tampering_detected() {
        let config = test_config();
        let mut ciphertext =
            block_encrypt(b"secret-name.txt", b"pass", Algorithm::Aes256Gcm, &config).unwrap();
        ciphertext[2] ^= 0x01;

        let result = block_decrypt(&ciphertext, b"pass", Algorithm::Aes256Gcm, &config);
        assert!(matches!(result, Err(Error::IntegrityFailure)));
    }

    #[test]
    fn test_block_too_short_rejected() {
        let config = test_config();
        let result = block_decrypt(&[0u8; 8], b"pass", Algorithm::Aes256Gcm, &config);
        assert!(matches!(result, Err(Error::MalformedStream(_))));
    }

    #[test]
    fn test_streaming_suites_rejected_for_blocks() {
        let config = test_config();
        for algorithm in [Algorithm::Aes256Ctr, Algorithm::Rc4] {
            let result = block_encrypt(b"data", b"pass", algorithm, &config);
            assert!(matches!(result, Err(Error::UnsupportedAlgorithm(_))));

            let result = block_decrypt(&[0u8; 64], b"pass", algorithm, &config);
            assert!(matches!(result, Err(Error::UnsupportedAlgorithm(_))));
        }
    }

    #[test]
    fn test_display_names() {
        assert_eq!(Algorithm::Aes256Ctr.to_string(), "AES-256-CTR");
        assert_eq!(Algorithm::Aes256Gcm.to_string(), "AES-256-GCM");
        assert_eq!(Algorithm::Rc4.to_string(), "RC4");
    }
}
