use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::HistoryError;

use super::record::HistoryRecord;

/// Records kept in a store; older ones are dropped on save.
pub const HISTORY_CAP: usize = 100;
/// Default page size for listings.
pub const DEFAULT_LIST_LIMIT: usize = 50;

/// Durable log of finished tests, newest first.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Prepends a record. A record with the same id replaces the old one.
    async fn save(&self, record: HistoryRecord) -> Result<(), HistoryError>;

    /// Returns up to `limit` records, newest first.
    async fn list(&self, limit: usize) -> Result<Vec<HistoryRecord>, HistoryError>;

    async fn get(&self, id: &str) -> Result<Option<HistoryRecord>, HistoryError>;
}

fn insert_newest(records: &mut Vec<HistoryRecord>, record: HistoryRecord) {
    records.retain(|existing| existing.id != record.id);
    records.insert(0, record);
    records.truncate(HISTORY_CAP);
}

/// In-process store, used when nothing should touch the disk.
#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    records: Mutex<Vec<HistoryRecord>>,
}

impl MemoryHistoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn save(&self, record: HistoryRecord) -> Result<(), HistoryError> {
        insert_newest(&mut *self.records.lock().await, record);
        Ok(())
    }

    async fn list(&self, limit: usize) -> Result<Vec<HistoryRecord>, HistoryError> {
        Ok(self.records.lock().await.iter().take(limit).cloned().collect())
    }

    async fn get(&self, id: &str) -> Result<Option<HistoryRecord>, HistoryError> {
        Ok(self
            .records
            .lock()
            .await
            .iter()
            .find(|record| record.id == id)
            .cloned())
    }
}

/// Single JSON array file shared by every process pointed at it.
///
/// A save holds an advisory lock on `<path>.lock` (flock on unix) across the
/// read-modify-write cycle and writes through a per-write temp file and a
/// rename, so readers never see a partial file.
#[derive(Debug)]
pub struct JsonFileHistoryStore {
    path: PathBuf,
    write_lock: Mutex<()>,
    writes: AtomicU64,
}

impl JsonFileHistoryStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
            writes: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Vec<HistoryRecord>, HistoryError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(HistoryError::Read {
                    path: self.path.clone(),
                    source: err,
                });
            }
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        serde_json::from_slice(&bytes).map_err(|err| HistoryError::Parse {
            path: self.path.clone(),
            source: err,
        })
    }

    async fn ensure_parent(&self) -> Result<(), HistoryError> {
        let Some(parent) = self.path.parent() else {
            return Ok(());
        };
        if parent.as_os_str().is_empty() {
            return Ok(());
        }
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|err| HistoryError::Write {
                path: parent.to_path_buf(),
                source: err,
            })
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(suffix);
        self.path.with_file_name(name)
    }

    async fn persist(&self, records: &[HistoryRecord]) -> Result<(), HistoryError> {
        let bytes =
            serde_json::to_vec_pretty(records).map_err(|err| HistoryError::Serialize { source: err })?;
        let write = self.writes.fetch_add(1, Ordering::Relaxed);
        let tmp = self.sibling(&format!(".{}.{}.tmp", std::process::id(), write));
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|err| HistoryError::Write {
                path: tmp.clone(),
                source: err,
            })?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|err| HistoryError::Write {
                path: self.path.clone(),
                source: err,
            })
    }
}

#[async_trait]
impl HistoryStore for JsonFileHistoryStore {
    async fn save(&self, record: HistoryRecord) -> Result<(), HistoryError> {
        let _guard = self.write_lock.lock().await;
        self.ensure_parent().await?;
        let _file_lock = FileLock::acquire(self.sibling(".lock")).await?;
        let mut records = self.load().await?;
        insert_newest(&mut records, record);
        self.persist(&records).await
    }

    async fn list(&self, limit: usize) -> Result<Vec<HistoryRecord>, HistoryError> {
        let mut records = self.load().await?;
        records.truncate(limit);
        Ok(records)
    }

    async fn get(&self, id: &str) -> Result<Option<HistoryRecord>, HistoryError> {
        Ok(self
            .load()
            .await?
            .into_iter()
            .find(|record| record.id == id))
    }
}

/// Exclusive advisory lock on a sidecar file, released when dropped.
#[derive(Debug)]
struct FileLock {
    _file: File,
}

impl FileLock {
    async fn acquire(path: PathBuf) -> Result<Self, HistoryError> {
        let lock_path = path.clone();
        tokio::task::spawn_blocking(move || Self::acquire_blocking(&path))
            .await
            .map_err(|err| HistoryError::Lock {
                path: lock_path,
                source: std::io::Error::other(err),
            })?
    }

    fn acquire_blocking(path: &Path) -> Result<Self, HistoryError> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)
            .map_err(|err| HistoryError::Lock {
                path: path.to_path_buf(),
                source: err,
            })?;
        lock_exclusive(&file).map_err(|err| HistoryError::Lock {
            path: path.to_path_buf(),
            source: err,
        })?;
        Ok(Self { _file: file })
    }
}

#[cfg(unix)]
fn lock_exclusive(file: &File) -> std::io::Result<()> {
    use std::os::unix::io::AsRawFd;

    loop {
        // SAFETY: flock(2) takes the descriptor of a file that stays open for
        // the whole call and touches no memory we own.
        let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX) };
        if rc == 0 {
            return Ok(());
        }
        let err = std::io::Error::last_os_error();
        if err.kind() != std::io::ErrorKind::Interrupted {
            return Err(err);
        }
    }
}

// Other platforms rely on the in-process lock and per-write temp files.
#[cfg(not(unix))]
const fn lock_exclusive(_file: &File) -> std::io::Result<()> {
    Ok(())
}
