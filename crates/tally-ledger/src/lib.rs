//! Ledger boundary for Tally.
//!
//! This crate provides:
//! - The [`LedgerAccessor`] trait the chaincode consumes: point reads,
//!   writes, tombstoning deletes, and per-key history scans
//! - [`KeyModification`], one entry of a key's append-only change log
//! - [`LocalLedger`], a reference ledger for tests, the CLI and the HTTP host
//! - [`Journal`], the optional CRC-framed append-only file behind `LocalLedger`
//!
//! Ordering, consensus and replication belong to the real ledger runtime and
//! are not modelled here.

pub mod error;
pub mod journal;
pub mod memory;
pub mod records;
pub mod traits;

pub use error::{LedgerError, LedgerResult};
pub use journal::{Journal, JournalConfig, JournalEntry, Recovery, SyncMode};
pub use memory::{HistoryScan, LedgerTx, LocalLedger};
pub use records::KeyModification;
pub use traits::{HistoryIter, LedgerAccessor};
