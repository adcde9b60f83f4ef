//! Replay side of the WAL

use super::record::{WalRecord, WalRecordError};
use std::io;
use std::path::Path;

/// Result of scanning a log
#[derive(Debug, Default)]
pub struct WalScan {
    /// Records in log order, up to the first bad one
    pub records: Vec<WalRecord>,
    /// Byte length of the valid prefix
    pub valid_len: u64,
    /// Total bytes on disk
    pub file_len: u64,
    /// Why the scan stopped early, if it did
    pub stopped_at: Option<WalRecordError>,
}

impl WalScan {
    /// Bytes past the valid prefix
    pub fn discarded_bytes(&self) -> u64 {
        self.file_len - self.valid_len
    }
}

/// Reads a whole log file
pub struct WalReader;

impl WalReader {
    /// Scan `path`, stopping at the first torn or corrupt record
    ///
    /// A missing file scans as empty. Corruption is not an error here:
    /// the caller decides what to do with `stopped_at`.
    pub fn scan(path: impl AsRef<Path>) -> io::Result<WalScan> {
        let bytes = match std::fs::read(path.as_ref()) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(WalScan::default()),
            Err(e) => return Err(e),
        };
        Ok(Self::scan_bytes(&bytes))
    }

    /// Scan an in-memory copy of a log
    pub fn scan_bytes(bytes: &[u8]) -> WalScan {
        let mut scan = WalScan {
            file_len: bytes.len() as u64,
            ..WalScan::default()
        };
        let mut offset = 0usize;

        while offset < bytes.len() {
            match WalRecord::decode(&bytes[offset..], offset as u64) {
                Ok((record, used)) => {
                    scan.records.push(record);
                    offset += used;
                }
                Err(e) => {
                    scan.stopped_at = Some(e);
                    break;
                }
            }
        }

        scan.valid_len = offset as u64;
        scan
    }
}
