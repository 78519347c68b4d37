use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::models::FormRecord;

const RECORD_PREFIX: &str = "formulario_";
const RECORD_EXTENSION: &str = "json";

/// Error type for record store operations. Reads are fail-soft and only
/// surface lock contention; writes surface everything.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("contract number is empty after normalization")]
    InvalidContract,
    #[error("timeout waiting for file lock - another user may be editing: {0}")]
    LockTimeout(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Handles saving and loading per-contract form files with file locking
/// for rudimentary multi-user support. One JSON file per contract,
/// overwritten whole on every save, never deleted by the system.
pub struct FormStore {
    dir: PathBuf,
}

impl FormStore {
    /// Creates a store over the given data directory.
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Returns the store's data directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the record file for a normalized contract id.
    pub fn record_path(&self, contrato: &str) -> PathBuf {
        self.dir
            .join(format!("{RECORD_PREFIX}{contrato}.{RECORD_EXTENSION}"))
    }

    fn lock_path(record_path: &Path) -> PathBuf {
        record_path.with_extension("json.lock")
    }

    /// Acquire an exclusive lock for writing one contract's file.
    /// Returns the lock file handle which must be held during the write.
    fn acquire_write_lock(&self, lock_path: &Path) -> Result<File, StoreError> {
        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(lock_path)?;

        // Bounded retry rather than a blocking lock so a stuck writer
        // cannot hang the request forever
        let start = std::time::Instant::now();
        let timeout = Duration::from_secs(5);

        loop {
            match FileExt::try_lock_exclusive(&lock_file) {
                Ok(()) => return Ok(lock_file),
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    if start.elapsed() > timeout {
                        return Err(StoreError::LockTimeout(lock_path.to_path_buf()));
                    }
                    std::thread::sleep(Duration::from_millis(100));
                }
                Err(e) => return Err(StoreError::Io(e)),
            }
        }
    }

    /// Acquire a shared lock for reading, when a writer has ever touched
    /// this contract. Absent lock file means no coordination is needed.
    fn acquire_read_lock(&self, record_path: &Path) -> Result<Option<File>, StoreError> {
        let lock_path = Self::lock_path(record_path);
        if !lock_path.exists() {
            return Ok(None);
        }

        let lock_file = OpenOptions::new().read(true).open(&lock_path)?;

        let start = std::time::Instant::now();
        let timeout = Duration::from_secs(5);

        loop {
            match FileExt::try_lock_shared(&lock_file) {
                Ok(()) => return Ok(Some(lock_file)),
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    if start.elapsed() > timeout {
                        return Err(StoreError::LockTimeout(lock_path));
                    }
                    std::thread::sleep(Duration::from_millis(100));
                }
                Err(e) => return Err(StoreError::Io(e)),
            }
        }
    }

    /// Saves one contract's form, fully overwriting prior content.
    /// Writers for the same contract are serialized through the lock
    /// file; an empty contract id is rejected.
    pub fn save(&self, contrato: &str, record: &FormRecord) -> Result<(), StoreError> {
        if contrato.is_empty() {
            return Err(StoreError::InvalidContract);
        }

        let record_path = self.record_path(contrato);
        let lock_path = Self::lock_path(&record_path);
        let mut lock_file = self.acquire_write_lock(&lock_path)?;

        // Lock holder info, for debugging stuck locks
        let _ = writeln!(
            lock_file,
            "Locked by PID {} at {}",
            std::process::id(),
            chrono::Utc::now().to_rfc3339()
        );

        let json = serde_json::to_string_pretty(record)?;
        fs::write(&record_path, json)?;

        // Lock is released when lock_file is dropped
        Ok(())
    }

    /// Loads one contract's form. A missing file or unparsable content
    /// yields `None`; parse failures are logged, never propagated.
    pub fn load(&self, contrato: &str) -> Result<Option<FormRecord>, StoreError> {
        let record_path = self.record_path(contrato);
        if !record_path.exists() {
            return Ok(None);
        }

        let _lock = self.acquire_read_lock(&record_path)?;
        Ok(Self::read_record(&record_path))
    }

    /// Whether a form has ever been saved for this contract.
    pub fn exists(&self, contrato: &str) -> bool {
        self.record_path(contrato).exists()
    }

    /// Enumerates every stored form, sorted by file name so listing
    /// order does not depend on platform directory enumeration. Entries
    /// that fail to read or parse are skipped and logged.
    pub fn list_all(&self) -> Vec<FormRecord> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!("failed to read store directory {:?}: {e}", self.dir);
                }
                return Vec::new();
            }
        };

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| Self::is_record_file(path))
            .collect();
        paths.sort();

        paths
            .iter()
            .filter_map(|path| Self::read_record(path))
            .collect()
    }

    fn is_record_file(path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        name.starts_with(RECORD_PREFIX) && name.ends_with(&format!(".{RECORD_EXTENSION}"))
    }

    fn read_record(path: &Path) -> Option<FormRecord> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) => {
                tracing::warn!("failed to open record {path:?}: {e}");
                return None;
            }
        };
        match serde_json::from_reader(BufReader::new(file)) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("failed to parse record {path:?}: {e}");
                None
            }
        }
    }
}
