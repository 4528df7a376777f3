//! Legacy RC4 keystream format
//!
//! Kept so archives produced by earlier releases stay readable. The layout
//! is a SHA-256 digest of the passphrase followed by the RC4 keystream XOR
//! of the payload:
//!
//! ```text
//! [passphrase tag: 32][keystream body: n]
//! ```
//!
//! The tag only lets decryption reject a wrong passphrase before emitting
//! anything. It carries no tamper evidence: a flipped body bit decrypts to
//! a flipped plaintext bit without any error.

use crate::crypto::{CHUNK_SIZE, PASS_TAG_SIZE};
use crate::error::{Error, Result};
use rc4::consts::U32;
use rc4::{Key, KeyInit, Rc4, StreamCipher};
use sha2::{Digest, Sha256};
use std::io::{ErrorKind, Read, Write};
use subtle::ConstantTimeEq;

/// SHA-256 digest of the passphrase, written ahead of the body.
fn passphrase_tag(passphrase: &[u8]) -> [u8; PASS_TAG_SIZE] {
    let mut hasher = Sha256::new();
    hasher.update(passphrase);
    hasher.finalize().into()
}

/// RC4 key bytes for a passphrase.
///
/// The cipher wants a fixed-length key, so the passphrase is hashed. The
/// domain prefix keeps the key distinct from the tag bytes on the wire.
fn keystream_key(passphrase: &[u8]) -> [u8; PASS_TAG_SIZE] {
    let mut hasher = Sha256::new();
    hasher.update(b"sealkit-rc4-key-v1");
    hasher.update(passphrase);
    hasher.finalize().into()
}

/// Encrypt `reader` into `writer` under the legacy format.
pub fn encrypt<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    passphrase: &[u8],
) -> Result<()> {
    writer.write_all(&passphrase_tag(passphrase))?;
    transform(reader, writer, passphrase)?;
    writer.flush()?;
    Ok(())
}

/// Decrypt a legacy stream, rejecting a wrong passphrase up front.
pub fn decrypt<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    passphrase: &[u8],
) -> Result<()> {
    let mut tag = [0u8; PASS_TAG_SIZE];
    reader.read_exact(&mut tag).map_err(|e| {
        if e.kind() == ErrorKind::UnexpectedEof {
            Error::MalformedStream("Truncated passphrase tag".to_string())
        } else {
            Error::Io(e)
        }
    })?;

    if tag.ct_eq(&passphrase_tag(passphrase)).unwrap_u8() != 1 {
        return Err(Error::WrongPassphrase);
    }

    transform(reader, writer, passphrase)?;
    writer.flush()?;
    Ok(())
}

fn transform<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    passphrase: &[u8],
) -> Result<()> {
    let key_bytes = keystream_key(passphrase);
    let key = Key::<U32>::from_slice(&key_bytes);
    let mut cipher = Rc4::new(key);

    let mut chunk = vec![0u8; CHUNK_SIZE];
    loop {
        let n = match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::Io(e)),
        };

        let block = &mut chunk[..n];
        cipher.apply_keystream(block);
        writer.write_all(block)?;
    }

    Ok(())
}
