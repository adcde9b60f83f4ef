//! WAL record format
//!
//! ```text
//! ┌──────────┬──────────┬───────────────────────────────────────────────┐
//! │ len: u32 │ crc: u32 │ payload (len bytes)                           │
//! └──────────┴──────────┴───────────────────────────────────────────────┘
//!
//! payload:
//! ┌──────────┬──────────────┬────────────┬─────────────────┬──────────────┬───────────┐
//! │ kind: u8 │ version: u64 │ value: i64 │ updated_at: i64 │ key_len: u32 │ key bytes │
//! └──────────┴──────────────┴────────────┴─────────────────┴──────────────┴───────────┘
//! ```
//!
//! All integers are little endian. `crc` is CRC32 over the payload only.
//! A record is the full post-image of one cell, so replay never needs the
//! previous state.

use byteorder::{ByteOrder, LittleEndian};
use highwater_core::{CellKey, CellRecord};
use thiserror::Error;

/// Size of `len` + `crc`
pub const RECORD_HEADER_SIZE: usize = 8;

/// Size of the payload without the key bytes
pub const PAYLOAD_FIXED_SIZE: usize = 1 + 8 + 8 + 8 + 4;

/// Largest payload accepted on decode
///
/// Anything larger is treated as a garbage length from a torn write.
pub const MAX_PAYLOAD_SIZE: usize = 16 * 1024 * 1024;

/// Longest key (in bytes) whose record still fits in [`MAX_PAYLOAD_SIZE`]
pub const MAX_KEY_LEN: usize = MAX_PAYLOAD_SIZE - PAYLOAD_FIXED_SIZE;

/// What produced a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RecordKind {
    /// Cell created by `try_initialize`
    Init = 1,
    /// Cell value changed by `atomic_update`
    Update = 2,
}

impl RecordKind {
    fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(RecordKind::Init),
            2 => Some(RecordKind::Update),
            _ => None,
        }
    }
}

/// One logged cell post-image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalRecord {
    /// Operation that produced the record
    pub kind: RecordKind,
    /// Cell key
    pub key: CellKey,
    /// Cell state after the operation
    pub record: CellRecord,
}

/// Record decoding failure
///
/// Every variant carries the byte offset of the record that failed, which
/// is also the length of the valid log prefix.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WalRecordError {
    /// Fewer bytes left than the header or declared payload needs
    #[error("truncated record at offset {offset}: need {needed} bytes, have {have}")]
    Truncated {
        /// Record offset
        offset: u64,
        /// Bytes required
        needed: usize,
        /// Bytes available
        have: usize,
    },

    /// Declared length is implausible
    #[error("record at offset {offset} declares an implausible length of {len} bytes")]
    TooLarge {
        /// Record offset
        offset: u64,
        /// Declared payload length
        len: usize,
    },

    /// Payload checksum does not match
    #[error("checksum mismatch at offset {offset}: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch {
        /// Record offset
        offset: u64,
        /// Stored checksum
        expected: u32,
        /// Computed checksum
        actual: u32,
    },

    /// Payload is structurally invalid
    #[error("malformed record at offset {offset}: {reason}")]
    Malformed {
        /// Record offset
        offset: u64,
        /// What is wrong
        reason: String,
    },
}

impl WalRecordError {
    /// Offset of the failed record
    pub fn offset(&self) -> u64 {
        match self {
            WalRecordError::Truncated { offset, .. }
            | WalRecordError::TooLarge { offset, .. }
            | WalRecordError::ChecksumMismatch { offset, .. }
            | WalRecordError::Malformed { offset, .. } => *offset,
        }
    }
}

impl WalRecord {
    /// Create a record
    pub fn new(kind: RecordKind, key: CellKey, record: CellRecord) -> Self {
        Self { kind, key, record }
    }

    /// Payload length this record encodes to
    pub fn payload_len(&self) -> usize {
        PAYLOAD_FIXED_SIZE + self.key.len()
    }

    /// Encode header + payload
    ///
    /// Callers must keep `payload_len() <= MAX_PAYLOAD_SIZE`; the decoder
    /// rejects anything larger.
    pub fn encode(&self) -> Vec<u8> {
        let key = self.key.as_str().as_bytes();
        let payload_len = self.payload_len();
        let mut buf = vec![0u8; RECORD_HEADER_SIZE + payload_len];

        {
            let payload = &mut buf[RECORD_HEADER_SIZE..];
            payload[0] = self.kind as u8;
            LittleEndian::write_u64(&mut payload[1..9], self.record.version);
            LittleEndian::write_i64(&mut payload[9..17], self.record.value);
            LittleEndian::write_i64(&mut payload[17..25], self.record.updated_at);
            LittleEndian::write_u32(&mut payload[25..29], key.len() as u32);
            payload[PAYLOAD_FIXED_SIZE..].copy_from_slice(key);
        }

        let crc = crc32fast::hash(&buf[RECORD_HEADER_SIZE..]);
        LittleEndian::write_u32(&mut buf[0..4], payload_len as u32);
        LittleEndian::write_u32(&mut buf[4..8], crc);
        buf
    }

    /// Decode one record from the start of `buf`
    ///
    /// `offset` is the position of `buf` in the log and is only used for
    /// error reporting. Returns the record and the number of bytes consumed.
    pub fn decode(buf: &[u8], offset: u64) -> Result<(Self, usize), WalRecordError> {
        if buf.len() < RECORD_HEADER_SIZE {
            return Err(WalRecordError::Truncated {
                offset,
                needed: RECORD_HEADER_SIZE,
                have: buf.len(),
            });
        }

        let len = LittleEndian::read_u32(&buf[0..4]) as usize;
        let expected = LittleEndian::read_u32(&buf[4..8]);

        if len > MAX_PAYLOAD_SIZE {
            return Err(WalRecordError::TooLarge { offset, len });
        }
        let total = RECORD_HEADER_SIZE + len;
        if buf.len() < total {
            return Err(WalRecordError::Truncated {
                offset,
                needed: total,
                have: buf.len(),
            });
        }

        let payload = &buf[RECORD_HEADER_SIZE..total];
        let actual = crc32fast::hash(payload);
        if actual != expected {
            return Err(WalRecordError::ChecksumMismatch {
                offset,
                expected,
                actual,
            });
        }

        if payload.len() < PAYLOAD_FIXED_SIZE {
            return Err(WalRecordError::Malformed {
                offset,
                reason: format!("payload of {} bytes is shorter than the fixed fields", len),
            });
        }

        let kind = RecordKind::from_byte(payload[0]).ok_or_else(|| WalRecordError::Malformed {
            offset,
            reason: format!("unknown record kind {}", payload[0]),
        })?;
        let version = LittleEndian::read_u64(&payload[1..9]);
        let value = LittleEndian::read_i64(&payload[9..17]);
        let updated_at = LittleEndian::read_i64(&payload[17..25]);
        let key_len = LittleEndian::read_u32(&payload[25..29]) as usize;

        if PAYLOAD_FIXED_SIZE + key_len != payload.len() {
            return Err(WalRecordError::Malformed {
                offset,
                reason: format!("key length {} does not match payload length {}", key_len, len),
            });
        }
        let key = std::str::from_utf8(&payload[PAYLOAD_FIXED_SIZE..]).map_err(|e| {
            WalRecordError::Malformed {
                offset,
                reason: format!("key is not UTF-8: {}", e),
            }
        })?;

        Ok((
            WalRecord {
                kind,
                key: CellKey::new(key),
                record: CellRecord::with_version(value, version, updated_at),
            },
            total,
        ))
    }
}
