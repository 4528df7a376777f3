//! Container file operations
//!
//! Encrypted files carry a five-byte magic tag naming the suite that wrote
//! them, then the suite's stream:
//!
//! ```text
//! SLK 0x00 0x02   AES-256-CTR stream
//! SLK 0x01 0x02   RSA envelope (wrapped secret, then AES-256-CTR stream)
//! SLK 0x02 0x01   legacy RC4 stream
//! ```
//!
//! Containers take the source path plus a `.slk` extension; decryption
//! strips it again. An output under construction is deleted whenever the
//! operation fails, so a bad passphrase or a tampered stream never leaves a
//! partial file behind.

use crate::config::KdfConfig;
use crate::crypto::{pubkey, suite, Algorithm};
use crate::error::{Error, Result};
use crate::pass;
use rsa::{RsaPrivateKey, RsaPublicKey};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

/// Extension carried by encrypted containers.
pub const FILE_EXT: &str = "slk";

/// Magic tag for the AES-256-CTR stream format.
pub const MAGIC_AES: [u8; MAGIC_SIZE] = [0x53, 0x4C, 0x4B, 0x00, 0x02];

/// Magic tag for the RSA envelope format.
pub const MAGIC_RSA: [u8; MAGIC_SIZE] = [0x53, 0x4C, 0x4B, 0x01, 0x02];

/// Magic tag for the legacy RC4 format.
pub const MAGIC_RC4: [u8; MAGIC_SIZE] = [0x53, 0x4C, 0x4B, 0x02, 0x01];

const MAGIC_SIZE: usize = 5;

/// Size of the big-endian length field ahead of the wrapped secret.
const WRAP_LEN_SIZE: usize = 8;

/// Upper bound accepted for the wrapped secret length field.
const MAX_WRAP_SIZE: u64 = 8192;

/// Length of the random secret keying envelope bodies.
const ENVELOPE_SECRET_LEN: usize = 20;

/// Encrypt `path` into a sibling `.slk` container.
///
/// Paths already carrying the container extension are skipped with
/// `Ok(None)`. The source is removed only after the container is complete.
pub fn encrypt_file(
    path: &Path,
    passphrase: &[u8],
    algorithm: Algorithm,
    config: &KdfConfig,
    remove_source: bool,
) -> Result<Option<PathBuf>> {
    if has_container_ext(path) {
        debug!("Skipping already-encrypted file: {}", path.display());
        return Ok(None);
    }

    let dest = container_path(path);
    let magic = magic_for(algorithm)?;

    if let Err(e) = encrypt_into(path, &dest, &magic, passphrase, algorithm, config) {
        remove_partial(&dest);
        return Err(e);
    }

    if remove_source {
        fs::remove_file(path)?;
    }

    info!("Encrypted {} -> {}", path.display(), dest.display());
    Ok(Some(dest))
}

/// Decrypt a `.slk` container back to its original path.
///
/// Paths without the container extension are skipped with `Ok(None)`. The
/// magic must match `algorithm`, otherwise nothing is written and the call
/// fails with [`Error::VersionMismatch`].
pub fn decrypt_file(
    path: &Path,
    passphrase: &[u8],
    algorithm: Algorithm,
    config: &KdfConfig,
    remove_source: bool,
) -> Result<Option<PathBuf>> {
    if !has_container_ext(path) {
        debug!("Skipping file without container extension: {}", path.display());
        return Ok(None);
    }

    let dest = restored_path(path);
    let magic = magic_for(algorithm)?;

    if let Err(e) = decrypt_into(path, &dest, &magic, passphrase, algorithm, config) {
        remove_partial(&dest);
        return Err(e);
    }

    if remove_source {
        fs::remove_file(path)?;
    }

    info!("Decrypted {} -> {}", path.display(), dest.display());
    Ok(Some(dest))
}

/// Encrypt `path` for the holder of `public`'s private half.
///
/// A random secret keys the streamed body and rides along wrapped under
/// RSA-OAEP, so no passphrase is exchanged.
pub fn envelope_encrypt_file(
    path: &Path,
    public: &RsaPublicKey,
    config: &KdfConfig,
    remove_source: bool,
) -> Result<Option<PathBuf>> {
    if has_container_ext(path) {
        debug!("Skipping already-encrypted file: {}", path.display());
        return Ok(None);
    }

    let dest = container_path(path);

    if let Err(e) = envelope_encrypt_into(path, &dest, public, config) {
        remove_partial(&dest);
        return Err(e);
    }

    if remove_source {
        fs::remove_file(path)?;
    }

    info!("Encrypted {} -> {}", path.display(), dest.display());
    Ok(Some(dest))
}

/// Decrypt an envelope container with the recipient private key.
pub fn envelope_decrypt_file(
    path: &Path,
    private: &RsaPrivateKey,
    config: &KdfConfig,
    remove_source: bool,
) -> Result<Option<PathBuf>> {
    if !has_container_ext(path) {
        debug!("Skipping file without container extension: {}", path.display());
        return Ok(None);
    }

    let dest = restored_path(path);

    if let Err(e) = envelope_decrypt_into(path, &dest, private, config) {
        remove_partial(&dest);
        return Err(e);
    }

    if remove_source {
        fs::remove_file(path)?;
    }

    info!("Decrypted {} -> {}", path.display(), dest.display());
    Ok(Some(dest))
}

fn encrypt_into(
    src: &Path,
    dest: &Path,
    magic: &[u8; MAGIC_SIZE],
    passphrase: &[u8],
    algorithm: Algorithm,
    config: &KdfConfig,
) -> Result<()> {
    let mut reader = BufReader::new(File::open(src)?);
    let mut writer = BufWriter::new(File::create(dest)?);

    writer.write_all(magic)?;
    suite::stream_encrypt(&mut reader, &mut writer, passphrase, algorithm, config)?;
    writer.flush()?;
    Ok(())
}

fn decrypt_into(
    src: &Path,
    dest: &Path,
    magic: &[u8; MAGIC_SIZE],
    passphrase: &[u8],
    algorithm: Algorithm,
    config: &KdfConfig,
) -> Result<()> {
    let mut reader = BufReader::new(File::open(src)?);
    check_magic(&mut reader, magic)?;

    let mut writer = BufWriter::new(File::create(dest)?);
    suite::stream_decrypt(&mut reader, &mut writer, passphrase, algorithm, config)?;
    writer.flush()?;
    Ok(())
}

fn envelope_encrypt_into(
    src: &Path,
    dest: &Path,
    public: &RsaPublicKey,
    config: &KdfConfig,
) -> Result<()> {
    let secret = Zeroizing::new(pass::random_bytes(ENVELOPE_SECRET_LEN));
    let wrapped = pubkey::wrap_secret(&secret, public)?;

    let mut reader = BufReader::new(File::open(src)?);
    let mut writer = BufWriter::new(File::create(dest)?);

    writer.write_all(&MAGIC_RSA)?;
    writer.write_all(&(wrapped.len() as u64).to_be_bytes())?;
    writer.write_all(&wrapped)?;
    suite::stream_encrypt(&mut reader, &mut writer, &secret, Algorithm::Aes256Ctr, config)?;
    writer.flush()?;
    Ok(())
}

fn envelope_decrypt_into(
    src: &Path,
    dest: &Path,
    private: &RsaPrivateKey,
    config: &KdfConfig,
) -> Result<()> {
    let mut reader = BufReader::new(File::open(src)?);
    check_magic(&mut reader, &MAGIC_RSA)?;

    let mut size_bytes = [0u8; WRAP_LEN_SIZE];
    reader.read_exact(&mut size_bytes).map_err(map_header_eof)?;
    let size = u64::from_be_bytes(size_bytes);
    if size == 0 || size > MAX_WRAP_SIZE {
        return Err(Error::MalformedStream(format!(
            "Unreasonable wrapped secret length: {}",
            size
        )));
    }

    let mut wrapped = vec![0u8; size as usize];
    reader.read_exact(&mut wrapped).map_err(map_header_eof)?;

    // Fails before the body is touched, so a wrong key writes nothing
    let secret = pubkey::unwrap_secret(&wrapped, private)?;

    let mut writer = BufWriter::new(File::create(dest)?);
    suite::stream_decrypt(&mut reader, &mut writer, &secret, Algorithm::Aes256Ctr, config)?;
    writer.flush()?;
    Ok(())
}

fn magic_for(algorithm: Algorithm) -> Result<[u8; MAGIC_SIZE]> {
    match algorithm {
        Algorithm::Aes256Ctr => Ok(MAGIC_AES),
        Algorithm::Rc4 => Ok(MAGIC_RC4),
        Algorithm::Aes256Gcm => Err(Error::UnsupportedAlgorithm(format!(
            "{} cannot encrypt files",
            algorithm
        ))),
    }
}

fn check_magic<R: Read>(reader: &mut R, expected: &[u8; MAGIC_SIZE]) -> Result<()> {
    let mut magic = [0u8; MAGIC_SIZE];
    reader.read_exact(&mut magic).map_err(map_header_eof)?;
    if &magic != expected {
        return Err(Error::VersionMismatch(
            "Container does not match the requested algorithm".to_string(),
        ));
    }
    Ok(())
}

fn map_header_eof(e: std::io::Error) -> Error {
    if e.kind() == ErrorKind::UnexpectedEof {
        Error::MalformedStream("Truncated container header".to_string())
    } else {
        Error::Io(e)
    }
}

fn has_container_ext(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(FILE_EXT)
}

fn container_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(FILE_EXT);
    PathBuf::from(name)
}

fn restored_path(path: &Path) -> PathBuf {
    path.with_extension("")
}

fn remove_partial(dest: &Path) {
    if dest.exists() {
        if let Err(e) = fs::remove_file(dest) {
            warn!("Failed to remove partial output {}: {}", dest.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::pubkey::test_keypair;

    fn test_config() -> KdfConfig {
        KdfConfig {
            argon2_memory_kib: 1024,
            argon2_iterations: 1,
            argon2_parallelism: 1,
        }
    }

    fn write_source(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_aes_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config();
        let src = write_source(dir.path(), "notes.txt", b"rendezvous at nine");

        let container = encrypt_file(&src, b"pass", Algorithm::Aes256Ctr, &config, true)
            .unwrap()
            .unwrap();
        assert_eq!(container, dir.path().join("notes.txt.slk"));
        assert!(!src.exists());

        let raw = fs::read(&container).unwrap();
        assert_eq!(&raw[..MAGIC_SIZE], &MAGIC_AES);

        let restored = decrypt_file(&container, b"pass", Algorithm::Aes256Ctr, &config, true)
            .unwrap()
            .unwrap();
        assert_eq!(restored, src);
        assert!(!container.exists());
        assert_eq!(fs::read(&restored).unwrap(), b"rendezvous at nine");
    }

    #[test]
    fn test_empty_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config();
        let src = write_source(dir.path(), "empty.bin", b"");

        let container = encrypt_file(&src, b"pass", Algorithm::Aes256Ctr, &config, true)
            .unwrap()
            .unwrap();
        // magic + salt + version + IV + tag
        assert_eq!(fs::read(&container).unwrap().len(), 5 + 16 + 1 + 16 + 64);

        let restored = decrypt_file(&container, b"pass", Algorithm::Aes256Ctr, &config, true)
            .unwrap()
            .unwrap();
        assert_eq!(fs::read(&restored).unwrap(), b"");
    }

    #[test]
    fn test_rc4_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config();
        let src = write_source(dir.path(), "old.dat", b"legacy payload");

        let container = encrypt_file(&src, b"pass", Algorithm::Rc4, &config, true)
            .unwrap()
            .unwrap();
        let raw = fs::read(&container).unwrap();
        assert_eq!(&raw[..MAGIC_SIZE], &MAGIC_RC4);

        let restored = decrypt_file(&container, b"pass", Algorithm::Rc4, &config, true)
            .unwrap()
            .unwrap();
        assert_eq!(fs::read(&restored).unwrap(), b"legacy payload");
    }

    #[test]
    fn test_encrypt_skips_containers() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config();
        let src = write_source(dir.path(), "done.slk", b"whatever");

        let result = encrypt_file(&src, b"pass", Algorithm::Aes256Ctr, &config, false).unwrap();
        assert!(result.is_none());
        assert!(src.exists());
    }

    #[test]
    fn test_decrypt_skips_non_containers() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config();
        let src = write_source(dir.path(), "plain.txt", b"whatever");

        let result = decrypt_file(&src, b"pass", Algorithm::Aes256Ctr, &config, false).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_magic_mismatch_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config();
        let src = write_source(dir.path(), "notes.txt", b"content");

        let container = encrypt_file(&src, b"pass", Algorithm::Rc4, &config, true)
            .unwrap()
            .unwrap();

        let result = decrypt_file(&container, b"pass", Algorithm::Aes256Ctr, &config, false);
        assert!(matches!(result, Err(Error::VersionMismatch(_))));
        assert!(!dir.path().join("notes.txt").exists());
    }

    #[test]
    fn test_wrong_passphrase_removes_partial_output() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config();
        let src = write_source(dir.path(), "notes.txt", b"secret content here");

        let container = encrypt_file(&src, b"pass", Algorithm::Aes256Ctr, &config, true)
            .unwrap()
            .unwrap();

        let result = decrypt_file(&container, b"wrong", Algorithm::Aes256Ctr, &config, false);
        assert!(matches!(result, Err(Error::IntegrityFailure)));
        assert!(!dir.path().join("notes.txt").exists());
        assert!(container.exists());
    }

    #[test]
    fn test_tampered_container_removes_partial_output() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config();
        let src = write_source(dir.path(), "notes.txt", b"secret content here");

        let container = encrypt_file(&src, b"pass", Algorithm::Aes256Ctr, &config, true)
            .unwrap()
            .unwrap();

        let mut raw = fs::read(&container).unwrap();
        let mid = raw.len() / 2;
        raw[mid] ^= 0x01;
        fs::write(&container, &raw).unwrap();

        let result = decrypt_file(&container, b"pass", Algorithm::Aes256Ctr, &config, false);
        assert!(matches!(result, Err(Error::IntegrityFailure)));
        assert!(!dir.path().join("notes.txt").exists());
    }

    #[test]
    fn test_envelope_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config();
        let (private, public) = test_keypair();
        let src = write_source(dir.path(), "report.pdf", b"quarterly numbers");

        let container = envelope_encrypt_file(&src, public, &config, true)
            .unwrap()
            .unwrap();
        let raw = fs::read(&container).unwrap();
        assert_eq!(&raw[..MAGIC_SIZE], &MAGIC_RSA);
        // 1024-bit test key wraps to 128 bytes
        assert_eq!(
            u64::from_be_bytes(raw[MAGIC_SIZE..MAGIC_SIZE + 8].try_into().unwrap()),
            128
        );

        let restored = envelope_decrypt_file(&container, private, &config, true)
            .unwrap()
            .unwrap();
        assert_eq!(fs::read(&restored).unwrap(), b"quarterly numbers");
    }

    #[test]
    fn test_envelope_wrong_key_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config();
        let (_, public) = test_keypair();
        let (other_private, _) = crate::crypto::pubkey::generate_keypair(1024).unwrap();
        let src = write_source(dir.path(), "report.pdf", b"quarterly numbers");

        let container = envelope_encrypt_file(&src, public, &config, true)
            .unwrap()
            .unwrap();

        let result = envelope_decrypt_file(&container, &other_private, &config, false);
        assert!(matches!(result, Err(Error::PublicKey(_))));
        assert!(!dir.path().join("report.pdf").exists());
    }

    #[test]
    fn test_envelope_rejects_unreasonable_length_field() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config();
        let (private, public) = test_keypair();
        let src = write_source(dir.path(), "report.pdf", b"quarterly numbers");

        let container = envelope_encrypt_file(&src, public, &config, true)
            .unwrap()
            .unwrap();

        let mut raw = fs::read(&container).unwrap();
        for byte in &mut raw[MAGIC_SIZE..MAGIC_SIZE + WRAP_LEN_SIZE] {
            *byte = 0xFF;
        }
        fs::write(&container, &raw).unwrap();

        let result = envelope_decrypt_file(&container, private, &config, false);
        assert!(matches!(result, Err(Error::MalformedStream(_))));
    }

    #[test]
    fn test_container_path_helpers() {
        let path = Path::new("/tmp/archive.tar.gz");
        assert_eq!(
            container_path(path),
            PathBuf::from("/tmp/archive.tar.gz.slk")
        );
        assert_eq!(
            restored_path(Path::new("/tmp/archive.tar.gz.slk")),
            PathBuf::from("/tmp/archive.tar.gz")
        );
        assert!(has_container_ext(Path::new("/tmp/a.slk")));
        assert!(!has_container_ext(Path::new("/tmp/a.txt")));
    }
}
