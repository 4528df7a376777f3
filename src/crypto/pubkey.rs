//! RSA keypair handling and secret wrapping
//!
//! Envelope encryption wraps a short random secret under the recipient's
//! public key with RSA-OAEP (SHA-256). Keys travel as PEM: PKCS#8 for the
//! private key, SPKI for the public key.

use crate::error::{Error, Result};
use rsa::pkcs8::{
    DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding,
};
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use zeroize::Zeroizing;

/// Generate a fresh RSA keypair.
pub fn generate_keypair(bits: usize) -> Result<(RsaPrivateKey, RsaPublicKey)> {
    let mut rng = rand::thread_rng();
    let private = RsaPrivateKey::new(&mut rng, bits)
        .map_err(|e| Error::PublicKey(format!("Key generation failed: {}", e)))?;
    let public = RsaPublicKey::from(&private);
    Ok((private, public))
}

/// Wrap a file secret under the recipient's public key.
pub fn wrap_secret(secret: &[u8], public: &RsaPublicKey) -> Result<Vec<u8>> {
    let mut rng = rand::thread_rng();
    public
        .encrypt(&mut rng, Oaep::new::<Sha256>(), secret)
        .map_err(|e| Error::PublicKey(format!("Secret wrap failed: {}", e)))
}

/// Unwrap a file secret with the private key.
pub fn unwrap_secret(wrapped: &[u8], private: &RsaPrivateKey) -> Result<Zeroizing<Vec<u8>>> {
    private
        .decrypt(Oaep::new::<Sha256>(), wrapped)
        .map(Zeroizing::new)
        .map_err(|e| Error::PublicKey(format!("Secret unwrap failed: {}", e)))
}

/// Write a keypair to PEM files.
pub fn save_keypair(
    private: &RsaPrivateKey,
    public: &RsaPublicKey,
    private_path: &Path,
    public_path: &Path,
) -> Result<()> {
    let private_pem = private
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|e| Error::PublicKey(format!("Private key encoding failed: {}", e)))?;
    let public_pem = public
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| Error::PublicKey(format!("Public key encoding failed: {}", e)))?;

    fs::write(private_path, private_pem.as_bytes())?;
    fs::write(public_path, public_pem.as_bytes())?;
    Ok(())
}

/// Load a PKCS#8 PEM private key.
pub fn load_private_key(path: &Path) -> Result<RsaPrivateKey> {
    let pem = fs::read_to_string(path)?;
    RsaPrivateKey::from_pkcs8_pem(&pem)
        .map_err(|e| Error::PublicKey(format!("Private key parse failed: {}", e)))
}

/// Load an SPKI PEM public key.
pub fn load_public_key(path: &Path) -> Result<RsaPublicKey> {
    let pem = fs::read_to_string(path)?;
    RsaPublicKey::from_public_key_pem(&pem)
        .map_err(|e| Error::PublicKey(format!("Public key parse failed: {}", e)))
}

/// SHA-256 fingerprint of the public key's SPKI encoding, hex-encoded.
pub fn fingerprint(public: &RsaPublicKey) -> Result<String> {
    let der = public
        .to_public_key_der()
        .map_err(|e| Error::PublicKey(format!("Public key encoding failed: {}", e)))?;

    let mut hasher = Sha256::new();
    hasher.update(der.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Shared keypair for tests; RSA generation is slow in debug builds.
#[cfg(test)]
pub(crate) fn test_keypair() -> &'static (RsaPrivateKey, RsaPublicKey) {
    use std::sync::OnceLock;
    static KEYS: OnceLock<(RsaPrivateKey, RsaPublicKey)> = OnceLock::new();
    KEYS.get_or_init(|| generate_keypair(1024).unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_unwrap_round_trip() {
        let (private, public) = test_keypair();
        let secret = b"twenty-byte-secret!!";

        let wrapped = wrap_secret(secret, public).unwrap();
        // OAEP output is one modulus in size
        assert_eq!(wrapped.len(), 128);

        let unwrapped = unwrap_secret(&wrapped, private).unwrap();
        assert_eq!(unwrapped.as_slice(), secret);
    }

    #[test]
    fn test_unwrap_with_wrong_key_fails() {
        let (_, public) = test_keypair();
        let (other_private, _) = generate_keypair(1024).unwrap();

        let wrapped = wrap_secret(b"twenty-byte-secret!!", public).unwrap();
        let result = unwrap_secret(&wrapped, &other_private);
        assert!(matches!(result, Err(Error::PublicKey(_))));
    }

    #[test]
    fn test_pem_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let private_path = dir.path().join("private.pem");
        let public_path = dir.path().join("public.pem");

        let (private, public) = test_keypair();
        save_keypair(private, public, &private_path, &public_path).unwrap();

        let loaded_private = load_private_key(&private_path).unwrap();
        let loaded_public = load_public_key(&public_path).unwrap();
        assert_eq!(&loaded_private, private);
        assert_eq!(&loaded_public, public);
    }

    #[test]
    fn test_fingerprint_is_stable_hex() {
        let (_, public) = test_keypair();

        let a = fingerprint(public).unwrap();
        let b = fingerprint(public).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
