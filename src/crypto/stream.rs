//! Streaming authenticated encryption
//!
//! AES-256-CTR provides confidentiality and HMAC-SHA512 authenticates the
//! result (encrypt-then-MAC). The frame layout is:
//!
//! ```text
//! [version: 1][IV: 16][ciphertext: n][tag: 64]
//! ```
//!
//! The MAC covers the IV and every ciphertext byte in stream order. Inputs
//! of any length are processed in fixed-size chunks, so memory use stays
//! constant no matter how large the payload is.

use crate::crypto::lookahead::Lookahead;
use crate::crypto::{CHUNK_SIZE, IV_SIZE, KEY_SIZE, MAC_SIZE, STREAM_VERSION};
use crate::error::{Error, Result};
use aes::cipher::{KeyIvInit, StreamCipher};
use aes::Aes256;
use ctr::Ctr128BE;
use rand::RngCore;
use ring::hmac;
use std::io::{ErrorKind, Read, Write};
use subtle::ConstantTimeEq;

type Aes256Ctr = Ctr128BE<Aes256>;

/// Encrypt `reader` into `writer`.
///
/// A fresh random IV is drawn for every call. The cipher key feeds the CTR
/// keystream and the auth key feeds the HMAC; they must be independent.
pub fn encrypt<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    cipher_key: &[u8; KEY_SIZE],
    auth_key: &[u8; KEY_SIZE],
) -> Result<()> {
    let mut iv = [0u8; IV_SIZE];
    rand::thread_rng().fill_bytes(&mut iv);

    writer.write_all(&[STREAM_VERSION])?;
    writer.write_all(&iv)?;

    let mac_key = hmac::Key::new(hmac::HMAC_SHA512, auth_key);
    let mut mac = hmac::Context::with_key(&mac_key);
    mac.update(&iv);

    let mut cipher = Aes256Ctr::new(cipher_key.into(), (&iv).into());

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
        mac.update(block);
        writer.write_all(block)?;
    }

    writer.write_all(mac.sign().as_ref())?;
    writer.flush()?;
    Ok(())
}

/// Decrypt a stream produced by [`encrypt`], verifying the trailing tag.
///
/// Plaintext is written to `writer` as it is recovered, before the final
/// tag comparison runs. A caller that must never expose unverified
/// plaintext has to stage the output and discard it unless this returns
/// `Ok(())`; the file layer does exactly that by deleting failed outputs.
pub fn decrypt<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    cipher_key: &[u8; KEY_SIZE],
    auth_key: &[u8; KEY_SIZE],
) -> Result<()> {
    let mut version = [0u8; 1];
    reader.read_exact(&mut version).map_err(map_header_eof)?;
    if version[0] != STREAM_VERSION {
        return Err(Error::MalformedStream(format!(
            "Unrecognized stream version: {:#04x}",
            version[0]
        )));
    }

    let mut iv = [0u8; IV_SIZE];
    reader.read_exact(&mut iv).map_err(map_header_eof)?;

    let mac_key = hmac::Key::new(hmac::HMAC_SHA512, auth_key);
    let mut mac = hmac::Context::with_key(&mac_key);
    mac.update(&iv);

    let mut cipher = Aes256Ctr::new(cipher_key.into(), (&iv).into());

    // Hold back MAC_SIZE bytes at all times: whatever remains once the
    // reader is drained is the tag, everything ahead of it is ciphertext.
    let mut lookahead = Lookahead::new(CHUNK_SIZE + MAC_SIZE);
    let mut tag = [0u8; MAC_SIZE];
    loop {
        let eof = lookahead.fill(reader)?;

        if eof && lookahead.len() < MAC_SIZE {
            return Err(Error::MalformedStream(
                "Stream too short to carry an authentication tag".to_string(),
            ));
        }

        let processable = lookahead.len() - MAC_SIZE;
        if processable > 0 {
            let block = &mut lookahead.buffered_mut()[..processable];
            mac.update(block);
            cipher.apply_keystream(block);
            writer.write_all(block)?;
            lookahead.consume(processable);
        }

        if eof {
            tag.copy_from_slice(lookahead.buffered());
            break;
        }
    }

    let computed = mac.sign();
    if computed.as_ref().ct_eq(&tag).unwrap_u8() != 1 {
        return Err(Error::IntegrityFailure);
    }

    writer.flush()?;
    Ok(())
}

fn map_header_eof(e: std::io::Error) -> Error {
    if e.kind() == ErrorKind::UnexpectedEof {
        Error::MalformedStream("Truncated stream header".to_string())
    } else {
        Error::Io(e)
    }
}
