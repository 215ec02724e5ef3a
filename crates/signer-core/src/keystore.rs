//! On-disk keypair storage.
//!
//! Each keypair lives in `<dir>/<address>.json` as a JSON array of the 64
//! secret-key bytes (seed followed by public key), the format produced by
//! `solana-keygen`.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chain_sol::{is_valid_address, Keypair};
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::error::WalletError;

const KEYPAIR_EXTENSION: &str = "json";

/// Keypair files in a single directory, addressed by base58 public key.
#[derive(Debug, Clone)]
pub struct KeypairStore {
    dir: PathBuf,
}

impl KeypairStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path for `address`. Only valid Solana addresses are accepted, so
    /// the result never escapes the store directory. Surrounding whitespace
    /// is ignored.
    pub fn path_for(&self, address: &str) -> Result<PathBuf, WalletError> {
        let address = address.trim();
        if !is_valid_address(address) {
            return Err(WalletError::InvalidAddress(address.to_string()));
        }
        Ok(self.dir.join(format!("{address}.{KEYPAIR_EXTENSION}")))
    }

    pub fn exists(&self, address: &str) -> bool {
        self.path_for(address).map(|p| p.is_file()).unwrap_or(false)
    }

    /// Persist `keypair`, replacing any file of the same name.
    pub fn save(&self, keypair: &Keypair) -> Result<PathBuf, WalletError> {
        let address = keypair.address();
        let path = self.path_for(&address)?;
        fs::create_dir_all(&self.dir)?;

        let contents = keypair.to_json_bytes()?;
        let tmp_path = self.dir.join(format!(".{address}.{KEYPAIR_EXTENSION}.tmp"));

        let write_result = write_private(&tmp_path, contents.as_bytes())
            .and_then(|()| fs::rename(&tmp_path, &path));
        if let Err(e) = write_result {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        info!(address = %address, path = %path.display(), "Saved keypair");
        Ok(path)
    }

    /// Load the keypair stored under `address`.
    pub fn load(&self, address: &str) -> Result<Keypair, WalletError> {
        let address = address.trim();
        let path = self.path_for(address)?;

        let contents = match fs::read_to_string(&path) {
            Ok(s) => Zeroizing::new(s),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(WalletError::NotFound(address.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let keypair = Keypair::from_json_bytes(&contents)?;
        if keypair.address() != address {
            return Err(WalletError::InvalidPrivateKey(format!(
                "{} holds the key for {}",
                path.display(),
                keypair.address()
            )));
        }

        debug!(address, "Loaded keypair");
        Ok(keypair)
    }

    /// Generate a fresh keypair and save it.
    pub fn create(&self) -> Result<Keypair, WalletError> {
        let keypair = Keypair::generate();
        self.save(&keypair)?;
        Ok(keypair)
    }

    /// Addresses of every stored keypair, sorted.
    pub fn list(&self) -> Result<Vec<String>, WalletError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut addresses = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(KEYPAIR_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if is_valid_address(stem) {
                    addresses.push(stem.to_string());
                }
            }
        }
        addresses.sort();
        Ok(addresses)
    }
}

fn write_private(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}
