//! Write-ahead log for cell records
//!
//! - `durability`: when records are fsynced
//! - `record`: on-disk record format with CRC32
//! - `writer`: append with rollback on failure
//! - `reader`: scan up to the first torn or corrupt record

pub mod durability;
pub mod reader;
pub mod record;
pub mod writer;

pub use durability::DurabilityMode;
pub use reader::{WalReader, WalScan};
pub use record::{RecordKind, WalRecord, WalRecordError, MAX_KEY_LEN, MAX_PAYLOAD_SIZE, RECORD_HEADER_SIZE};
pub use writer::WalWriter;

/// File name of the log inside a data directory
pub const WAL_FILENAME: &str = "cells.wal";
