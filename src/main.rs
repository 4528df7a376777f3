//! sealkit - Streaming authenticated file encryption toolkit
//!
//! Usage:
//!   sealkit aes enc <paths>    - Encrypt files with AES-256-CTR
//!   sealkit aes dec <paths>    - Decrypt AES containers
//!   sealkit rc4 enc <paths>    - Encrypt files with legacy RC4
//!   sealkit rsa keygen         - Generate an RSA keypair
//!   sealkit rsa enc <paths>    - Encrypt files for a public key
//!   sealkit rnm hide <paths>   - Hide file names behind random identifiers
//!   sealkit pss                - Generate a random password

use clap::{Parser, Subcommand};
use sealkit::{
    config::KdfConfig,
    crypto::{pubkey, Algorithm},
    pass,
    rename::{self, SledLedger},
    vault, Error, Result,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "sealkit")]
#[command(author = "sealkit Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Streaming authenticated file encryption toolkit")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "~/.config/sealkit/config.json")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// AES-256-CTR file encryption
    #[command(subcommand)]
    Aes(FileCommands),

    /// Legacy RC4 file encryption
    #[command(subcommand)]
    Rc4(FileCommands),

    /// RSA envelope encryption
    #[command(subcommand)]
    Rsa(RsaCommands),

    /// File name obfuscation
    #[command(subcommand)]
    Rnm(RnmCommands),

    /// Generate a random password
    Pss {
        /// Password length
        #[arg(default_value_t = 16)]
        length: usize,
    },
}

#[derive(Subcommand)]
enum FileCommands {
    /// Encrypt files or directories
    Enc {
        /// Files or directories to encrypt
        paths: Vec<PathBuf>,

        /// Remove source files after encryption
        #[arg(short, long)]
        remove: bool,
    },

    /// Decrypt containers back to their original files
    Dec {
        /// Files or directories to decrypt
        paths: Vec<PathBuf>,

        /// Remove containers after decryption
        #[arg(short, long)]
        remove: bool,
    },
}

#[derive(Subcommand)]
enum RsaCommands {
    /// Generate a new RSA keypair
    Keygen {
        /// Key size in bits
        #[arg(long, default_value_t = 4096)]
        bits: usize,

        /// Directory receiving private.pem and public.pem
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Encrypt files for the holder of a public key's private half
    Enc {
        /// Public key PEM file
        #[arg(short, long)]
        key: PathBuf,

        /// Files or directories to encrypt
        paths: Vec<PathBuf>,

        /// Remove source files after encryption
        #[arg(short, long)]
        remove: bool,
    },

    /// Decrypt envelope containers with a private key
    Dec {
        /// Private key PEM file
        #[arg(short, long)]
        key: PathBuf,

        /// Files or directories to decrypt
        paths: Vec<PathBuf>,

        /// Remove containers after decryption
        #[arg(short, long)]
        remove: bool,
    },
}

#[derive(Subcommand)]
enum RnmCommands {
    /// Replace file names with random identifiers
    Hide {
        /// Files or directories to rename
        paths: Vec<PathBuf>,
    },

    /// Restore original file names
    Show {
        /// Files or directories to restore
        paths: Vec<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");

    // Expand ~ in config path
    let config_path = expand_tilde(&cli.config);

    // Run the command
    if let Err(e) = run_command(cli.command, &config_path) {
        error!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run_command(command: Commands, config_path: &PathBuf) -> Result<()> {
    match command {
        Commands::Aes(file_cmd) => run_file_command(file_cmd, config_path, Algorithm::Aes256Ctr),

        Commands::Rc4(file_cmd) => run_file_command(file_cmd, config_path, Algorithm::Rc4),

        Commands::Rsa(rsa_cmd) => run_rsa_command(rsa_cmd, config_path),

        Commands::Rnm(rnm_cmd) => run_rnm_command(rnm_cmd, config_path),

        Commands::Pss { length } => cmd_pss(length),
    }
}

fn run_file_command(
    command: FileCommands,
    config_path: &PathBuf,
    algorithm: Algorithm,
) -> Result<()> {
    match command {
        FileCommands::Enc { paths, remove } => {
            cmd_file_encrypt(config_path, &paths, algorithm, remove)
        }
        FileCommands::Dec { paths, remove } => {
            cmd_file_decrypt(config_path, &paths, algorithm, remove)
        }
    }
}

fn run_rsa_command(command: RsaCommands, config_path: &PathBuf) -> Result<()> {
    match command {
        RsaCommands::Keygen { bits, out } => cmd_rsa_keygen(bits, out),
        RsaCommands::Enc { key, paths, remove } => {
            cmd_rsa_encrypt(config_path, &key, &paths, remove)
        }
        RsaCommands::Dec { key, paths, remove } => {
            cmd_rsa_decrypt(config_path, &key, &paths, remove)
        }
    }
}

fn run_rnm_command(command: RnmCommands, config_path: &PathBuf) -> Result<()> {
    match command {
        RnmCommands::Hide { paths } => cmd_rnm_hide(config_path, &paths),
        RnmCommands::Show { paths } => cmd_rnm_show(config_path, &paths),
    }
}

fn cmd_file_encrypt(
    config_path: &PathBuf,
    paths: &[PathBuf],
    algorithm: Algorithm,
    remove: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let passphrase = prompt_passphrase(true)?;
    let files = collect_files(paths)?;

    info!("Encrypting {} file(s) with {}...", files.len(), algorithm);

    for file in &files {
        vault::encrypt_file(file, passphrase.as_bytes(), algorithm, &config, remove)?;
    }

    Ok(())
}

fn cmd_file_decrypt(
    config_path: &PathBuf,
    paths: &[PathBuf],
    algorithm: Algorithm,
    remove: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let passphrase = prompt_passphrase(false)?;
    let files = collect_files(paths)?;

    info!("Decrypting {} file(s) with {}...", files.len(), algorithm);

    for file in &files {
        vault::decrypt_file(file, passphrase.as_bytes(), algorithm, &config, remove)?;
    }

    Ok(())
}

fn cmd_rsa_keygen(bits: usize, out: Option<PathBuf>) -> Result<()> {
    let out_dir = out.unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&out_dir)?;

    info!("Generating {}-bit RSA keypair...", bits);

    let (private, public) = pubkey::generate_keypair(bits)?;
    let private_path = out_dir.join("private.pem");
    let public_path = out_dir.join("public.pem");
    pubkey::save_keypair(&private, &public, &private_path, &public_path)?;

    println!("Private key: {}", private_path.display());
    println!("Public key:  {}", public_path.display());
    println!("Fingerprint: {}", pubkey::fingerprint(&public)?);

    Ok(())
}

fn cmd_rsa_encrypt(
    config_path: &PathBuf,
    key: &Path,
    paths: &[PathBuf],
    remove: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let public = pubkey::load_public_key(key)?;
    let files = collect_files(paths)?;

    info!(
        "Encrypting {} file(s) for key {}...",
        files.len(),
        pubkey::fingerprint(&public)?
    );

    for file in &files {
        vault::envelope_encrypt_file(file, &public, &config, remove)?;
    }

    Ok(())
}

fn cmd_rsa_decrypt(
    config_path: &PathBuf,
    key: &Path,
    paths: &[PathBuf],
    remove: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let private = pubkey::load_private_key(key)?;
    let files = collect_files(paths)?;

    info!("Decrypting {} file(s)...", files.len());

    for file in &files {
        vault::envelope_decrypt_file(file, &private, &config, remove)?;
    }

    Ok(())
}

fn cmd_rnm_hide(config_path: &PathBuf, paths: &[PathBuf]) -> Result<()> {
    let config = load_config(config_path)?;
    let passphrase = prompt_passphrase(true)?;
    let ledger = SledLedger::open(&default_ledger_path()?)?;
    let files = collect_files(paths)?;

    info!("Hiding {} file name(s)...", files.len());

    for file in &files {
        rename::obfuscate(file, passphrase.as_bytes(), &config, &ledger)?;
    }

    Ok(())
}

fn cmd_rnm_show(config_path: &PathBuf, paths: &[PathBuf]) -> Result<()> {
    let config = load_config(config_path)?;
    let passphrase = prompt_passphrase(false)?;
    let ledger = SledLedger::open(&default_ledger_path()?)?;
    let files = collect_files(paths)?;

    info!("Restoring {} file name(s)...", files.len());

    for file in &files {
        rename::reveal(file, passphrase.as_bytes(), &config, &ledger)?;
    }

    Ok(())
}

fn cmd_pss(length: usize) -> Result<()> {
    let password = pass::random_string(true, true, length);
    println!("Your new password is: {}", password);
    Ok(())
}

fn load_config(config_path: &Path) -> Result<KdfConfig> {
    if config_path.exists() {
        KdfConfig::load(config_path)
    } else {
        KdfConfig::from_env()
    }
}

/// Prompt for a passphrase, twice when a new one is being chosen
fn prompt_passphrase(confirm: bool) -> Result<String> {
    let passphrase = rpassword::prompt_password("Enter passphrase: ")?;

    if confirm {
        let again = rpassword::prompt_password("Confirm passphrase: ")?;
        if passphrase != again {
            return Err(Error::InvalidConfig(
                "Passphrases do not match".to_string(),
            ));
        }
    }

    Ok(passphrase)
}

/// Collect regular files under each path, walking directories recursively
fn collect_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        collect_into(path, &mut files)?;
    }
    Ok(files)
}

fn collect_into(path: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    // lstat: a symlink counts as a plain entry and is never descended
    if fs::symlink_metadata(path)?.is_dir() {
        for entry in fs::read_dir(path)? {
            collect_into(&entry?.path(), files)?;
        }
    } else {
        files.push(path.to_path_buf());
    }
    Ok(())
}

/// Ledger database location under the platform data directory
fn default_ledger_path() -> Result<PathBuf> {
    let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    let dir = base.join("sealkit");
    fs::create_dir_all(&dir)?;
    Ok(dir.join("rename.db"))
}

/// Expand ~ to home directory
fn expand_tilde(path: &PathBuf) -> PathBuf {
    if path.starts_with("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(path.strip_prefix("~").unwrap());
        }
    }
    path.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_collect_files_walks_directories() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), b"a").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/b.txt"), b"b").unwrap();

        let mut files = collect_files(&[dir.path().to_path_buf()]).unwrap();
        files.sort();
        assert_eq!(
            files,
            vec![dir.path().join("a.txt"), dir.path().join("sub/b.txt")]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_collect_files_does_not_descend_symlinks() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("real")).unwrap();
        fs::write(dir.path().join("real/inner.txt"), b"x").unwrap();
        // Symlink cycle back to the walk root
        std::os::unix::fs::symlink(dir.path(), dir.path().join("real/loop")).unwrap();

        let mut files = collect_files(&[dir.path().to_path_buf()]).unwrap();
        files.sort();
        assert_eq!(
            files,
            vec![
                dir.path().join("real/inner.txt"),
                dir.path().join("real/loop"),
            ]
        );
    }
}
