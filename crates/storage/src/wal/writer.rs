//! Append side of the WAL

use super::durability::DurabilityMode;
use super::record::{WalRecord, MAX_PAYLOAD_SIZE};
use std::fs::{File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Appends records to one log file
///
/// Each append goes straight to the file (no user-space buffer), so once
/// `append` returns `Ok` the record is in the OS page cache. `fsync`
/// timing follows the [`DurabilityMode`].
///
/// A failed append truncates the file back to its previous length so a
/// half-written record never precedes later ones.
pub struct WalWriter {
    file: File,
    path: PathBuf,
    mode: DurabilityMode,
    /// Bytes of valid log
    len: u64,
    /// Records appended since the last fsync
    pending: usize,
    last_sync: Instant,
}

impl WalWriter {
    /// Open `path` for appending, positioned at `valid_len`
    ///
    /// Anything past `valid_len` is cut off first; recovery passes the end
    /// of the last good record here.
    pub fn open(path: impl AsRef<Path>, mode: DurabilityMode, valid_len: u64) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;
        Self::from_file(file, path, mode, valid_len)
    }

    pub(crate) fn from_file(
        mut file: File,
        path: PathBuf,
        mode: DurabilityMode,
        valid_len: u64,
    ) -> io::Result<Self> {
        let on_disk = file.metadata()?.len();
        if on_disk > valid_len {
            warn!(
                path = %path.display(),
                valid_len,
                dropped = on_disk - valid_len,
                "truncating WAL tail"
            );
            file.set_len(valid_len)?;
            file.sync_all()?;
        }
        file.seek(SeekFrom::Start(valid_len))?;
        Ok(Self {
            file,
            path,
            mode,
            len: valid_len,
            pending: 0,
            last_sync: Instant::now(),
        })
    }

    /// Append one record, syncing per the durability mode
    ///
    /// Records the reader would reject as too large are refused before
    /// anything is written.
    pub fn append(&mut self, record: &WalRecord) -> io::Result<()> {
        if record.payload_len() > MAX_PAYLOAD_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "record payload of {} bytes exceeds the {} byte limit",
                    record.payload_len(),
                    MAX_PAYLOAD_SIZE
                ),
            ));
        }

        let bytes = record.encode();
        let pending_before = self.pending;
        if let Err(e) = self.write_and_sync(&bytes) {
            self.rollback(pending_before);
            return Err(e);
        }
        self.len += bytes.len() as u64;
        Ok(())
    }

    /// fsync any pending records
    pub fn flush(&mut self) -> io::Result<()> {
        if self.pending > 0 {
            self.sync()?;
        }
        Ok(())
    }

    /// Length of the valid log in bytes
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Check if nothing has been logged
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Records written but not yet fsynced
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Log file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_and_sync(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.file.write_all(bytes)?;
        self.pending += 1;
        match self.mode {
            DurabilityMode::None => {}
            DurabilityMode::Strict => self.sync()?,
            DurabilityMode::Batched {
                interval_ms,
                batch_size,
            } => {
                if self.pending >= batch_size
                    || self.last_sync.elapsed() >= Duration::from_millis(interval_ms)
                {
                    self.sync()?;
                }
            }
        }
        Ok(())
    }

    fn sync(&mut self) -> io::Result<()> {
        self.file.sync_data()?;
        debug!(records = self.pending, "WAL synced");
        self.pending = 0;
        self.last_sync = Instant::now();
        Ok(())
    }

    fn rollback(&mut self, pending_before: usize) {
        // The failed record no longer counts as awaiting fsync
        self.pending = pending_before;
        let restored = self
            .file
            .set_len(self.len)
            .and_then(|_| self.file.seek(SeekFrom::Start(self.len)).map(|_| ()));
        if let Err(e) = restored {
            warn!(
                path = %self.path.display(),
                error = %e,
                "could not cut failed append from WAL; recovery will drop it"
            );
        }
    }
}

impl Drop for WalWriter {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            warn!(path = %self.path.display(), error = %e, "final WAL sync failed");
        }
    }
}

impl std::fmt::Debug for WalWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalWriter")
            .field("path", &self.path)
            .field("mode", &self.mode)
            .field("len", &self.len)
            .field("pending", &self.pending)
            .finish()
    }
}
