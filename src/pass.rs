//! Random password and identifier generation

use rand::{Rng, RngCore};

const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &[u8] = b"0123456789";
const SYMBOLS: &[u8] = b"!@#$%^&*()-_=+";

/// Generate a random string over letters, optionally widened with digits
/// and symbols.
pub fn random_string(digits: bool, symbols: bool, length: usize) -> String {
    let mut charset = LETTERS.to_vec();
    if digits {
        charset.extend_from_slice(DIGITS);
    }
    if symbols {
        charset.extend_from_slice(SYMBOLS);
    }

    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| charset[rng.gen_range(0..charset.len())] as char)
        .collect()
}

/// Generate `length` random bytes.
pub fn random_bytes(length: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; length];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}
