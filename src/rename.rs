//! File name obfuscation
//!
//! `obfuscate` swaps a file name for a random identifier and parks the real
//! name, GCM-sealed and base64-encoded, in a ledger keyed by that
//! identifier. `reveal` reverses the swap and consumes the entry.
//!
//! Identifiers carry a fixed prefix so both operations can tell at a glance
//! which side of the swap a name is on and skip the other kind.

use crate::config::KdfConfig;
use crate::crypto::{suite, Algorithm};
use crate::error::{Error, Result};
use crate::pass;
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Prefix carried by every obfuscated file name.
pub const ID_PREFIX: &str = "SLKRNMV1";

/// Random letters following the prefix.
const ID_RANDOM_LEN: usize = 20;

/// Storage for obfuscated-name records.
pub trait NameLedger {
    /// Look up the sealed name stored under `id`.
    fn get(&self, id: &str) -> Result<Option<String>>;

    /// Store `value` under `id`, replacing any previous record.
    fn set(&self, id: &str, value: &str) -> Result<()>;

    /// Drop the record stored under `id`, if any.
    fn delete(&self, id: &str) -> Result<()>;
}

/// [`NameLedger`] backed by a sled database on disk.
pub struct SledLedger {
    db: sled::Db,
}

impl SledLedger {
    /// Open (or create) the ledger database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }
}

impl NameLedger for SledLedger {
    fn get(&self, id: &str) -> Result<Option<String>> {
        match self.db.get(id.as_bytes())? {
            Some(value) => {
                let text = String::from_utf8(value.to_vec())
                    .map_err(|_| Error::Encoding("Ledger value is not valid UTF-8".to_string()))?;
                Ok(Some(text))
            }
            None => Ok(None),
        }
    }

    fn set(&self, id: &str, value: &str) -> Result<()> {
        self.db.insert(id.as_bytes(), value.as_bytes())?;
        self.db.flush()?;
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<()> {
        self.db.remove(id.as_bytes())?;
        self.db.flush()?;
        Ok(())
    }
}

/// Rename `path` to a random identifier and record the sealed original name.
///
/// Names already carrying the identifier prefix are skipped with `Ok(None)`.
pub fn obfuscate<L: NameLedger>(
    path: &Path,
    passphrase: &[u8],
    config: &KdfConfig,
    ledger: &L,
) -> Result<Option<PathBuf>> {
    let name = file_name(path)?;
    if name.starts_with(ID_PREFIX) {
        debug!("Skipping already-obfuscated name: {}", name);
        return Ok(None);
    }

    let sealed = suite::block_encrypt(name.as_bytes(), passphrase, Algorithm::Aes256Gcm, config)?;
    let value = URL_SAFE.encode(&sealed);
    let id = format!(
        "{}{}",
        ID_PREFIX,
        pass::random_string(false, false, ID_RANDOM_LEN)
    );
    let dest = path.with_file_name(&id);

    // The entry lands before the rename so a crash in between never
    // strands a renamed file without a record.
    ledger.set(&id, &value)?;
    if let Err(e) = fs::rename(path, &dest) {
        if let Err(rollback) = ledger.delete(&id) {
            warn!("Failed to roll back ledger entry {}: {}", id, rollback);
        }
        return Err(Error::Io(e));
    }

    info!("Hid {} as {}", name, id);
    Ok(Some(dest))
}

/// Restore the original name of an obfuscated file and drop its record.
///
/// Names without the identifier prefix are skipped with `Ok(None)`.
pub fn reveal<L: NameLedger>(
    path: &Path,
    passphrase: &[u8],
    config: &KdfConfig,
    ledger: &L,
) -> Result<Option<PathBuf>> {
    let id = file_name(path)?;
    if !id.starts_with(ID_PREFIX) {
        debug!("Skipping name without identifier prefix: {}", id);
        return Ok(None);
    }

    let value = ledger
        .get(id)?
        .ok_or_else(|| Error::IdNotFound(id.to_string()))?;
    let sealed = URL_SAFE
        .decode(value.as_bytes())
        .map_err(|_| Error::Encoding("Ledger value is not valid base64".to_string()))?;
    let plain = suite::block_decrypt(&sealed, passphrase, Algorithm::Aes256Gcm, config)?;
    let original = String::from_utf8(plain)
        .map_err(|_| Error::Encoding("Decrypted name is not valid UTF-8".to_string()))?;

    let dest = path.with_file_name(&original);
    fs::rename(path, &dest)?;
    ledger.delete(id)?;

    info!("Restored {} as {}", id, original);
    Ok(Some(dest))
}

fn file_name(path: &Path) -> Result<&str> {
    path.file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::Encoding(format!("Path has no UTF-8 file name: {}", path.display())))
}
