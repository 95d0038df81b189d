use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{LedgerError, LedgerResult};
use crate::records::KeyModification;

/// One journaled key modification.
///
/// On-disk framing:
/// ```text
/// [4 bytes: payload length (little-endian u32)]
/// [4 bytes: CRC32 of payload (little-endian u32)]
/// [N bytes: payload (bincode-serialized JournalEntry)]
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub key: String,
    pub modification: KeyModification,
}

/// Flush/sync strategy for the journal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// `fsync` after every append.
    EveryWrite,
    /// Flush to the OS and rely on page-cache writeback.
    #[default]
    OsDefault,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct JournalConfig {
    #[serde(default)]
    pub sync_mode: SyncMode,
}

/// Length + CRC header.
const HEADER_SIZE: usize = 8;

struct JournalWriter {
    writer: BufWriter<File>,
    offset: u64,
}

/// Append-only, crash-tolerant log of key modifications.
///
/// Recovery reads the file front to back. Entries failing the CRC check are
/// skipped; a truncated tail (torn final write) ends recovery and is cut
/// off when the journal is reopened.
pub struct Journal {
    path: PathBuf,
    writer: Mutex<JournalWriter>,
    config: JournalConfig,
}

impl Journal {
    /// Open (or create) the journal file at `path`.
    pub fn open(path: &Path, config: JournalConfig) -> LedgerResult<Self> {
        Self::open_recovered(path, config).map(|(journal, _)| journal)
    }

    /// Open the journal and return its intact entries.
    ///
    /// A torn tail is cut off before the journal accepts appends, so new
    /// entries always follow the last intact frame.
    pub fn open_recovered(
        path: &Path,
        config: JournalConfig,
    ) -> LedgerResult<(Self, Vec<JournalEntry>)> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;
        let recovery = scan(path)?;
        let file_len = file.metadata()?.len();
        if recovery.valid_len < file_len {
            warn!(
                path = %path.display(),
                valid_len = recovery.valid_len,
                discarded = file_len - recovery.valid_len,
                "cutting torn journal tail"
            );
            file.set_len(recovery.valid_len)?;
            file.sync_all()?;
        }

        let journal = Self {
            path: path.to_path_buf(),
            writer: Mutex::new(JournalWriter {
                writer: BufWriter::new(file),
                offset: recovery.valid_len,
            }),
            config,
        };
        Ok((journal, recovery.entries))
    }

    /// Append one entry. Returns the byte offset it was written at.
    pub fn append(&self, entry: &JournalEntry) -> LedgerResult<u64> {
        let payload =
            bincode::serialize(entry).map_err(|e| LedgerError::Serialization(e.to_string()))?;
        let length = u32::try_from(payload.len())
            .map_err(|_| LedgerError::Serialization("journal entry exceeds 4 GiB".into()))?;
        let crc = crc32fast::hash(&payload);

        let mut w = self
            .writer
            .lock()
            .map_err(|_| LedgerError::LockPoisoned("journal"))?;
        let entry_offset = w.offset;

        w.writer.write_all(&length.to_le_bytes())?;
        w.writer.write_all(&crc.to_le_bytes())?;
        w.writer.write_all(&payload)?;
        w.writer.flush()?;
        if self.config.sync_mode == SyncMode::EveryWrite {
            w.writer.get_ref().sync_all()?;
        }

        w.offset += (HEADER_SIZE + payload.len()) as u64;

        debug!(offset = entry_offset, len = payload.len(), key = %entry.key, "journal append");
        Ok(entry_offset)
    }

    /// Read back every intact entry in append order.
    pub fn recover(&self) -> LedgerResult<Recovery> {
        scan(&self.path)
    }

    /// Current end-of-file offset.
    pub fn offset(&self) -> LedgerResult<u64> {
        self.writer
            .lock()
            .map(|w| w.offset)
            .map_err(|_| LedgerError::LockPoisoned("journal"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Point the writer at a read-only handle so every append fails.
    #[cfg(test)]
    pub(crate) fn make_unwritable(&self) {
        let file = OpenOptions::new().read(true).open(&self.path).unwrap();
        self.writer.lock().unwrap().writer = BufWriter::new(file);
    }
}

/// Result of reading a journal front to back.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Recovery {
    pub entries: Vec<JournalEntry>,
    /// Length of the well-framed prefix. Bytes past it are a torn tail.
    pub valid_len: u64,
}

fn scan(path: &Path) -> LedgerResult<Recovery> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut entries = Vec::new();
    let mut offset: u64 = 0;

    loop {
        let mut header = [0u8; HEADER_SIZE];
        match reader.read_exact(&mut header) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        }

        let length = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
        let expected_crc = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
        if length == 0 {
            warn!(offset, "zero-length journal entry; stopping recovery");
            break;
        }

        let mut payload = vec![0u8; length as usize];
        match reader.read_exact(&mut payload) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                warn!(offset, length, "truncated journal entry; stopping recovery");
                break;
            }
            Err(e) => return Err(e.into()),
        }

        let actual_crc = crc32fast::hash(&payload);
        if actual_crc != expected_crc {
            warn!(
                offset,
                expected = expected_crc,
                actual = actual_crc,
                "CRC mismatch; skipping journal entry"
            );
        } else {
            match bincode::deserialize::<JournalEntry>(&payload) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    warn!(offset, error = %e, "undecodable journal entry; skipping");
                }
            }
        }

        offset += (HEADER_SIZE + payload.len()) as u64;
    }

    debug!(recovered = entries.len(), valid_len = offset, "journal recovery complete");
    Ok(Recovery {
        entries,
        valid_len: offset,
    })
}

impl std::fmt::Debug for Journal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Journal")
            .field("path", &self.path)
            .field("offset", &self.offset().ok())
            .finish()
    }
}
