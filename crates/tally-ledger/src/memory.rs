use std::collections::HashMap;
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tally_types::{LedgerTimestamp, TxId};
use tracing::{debug, info};

use crate::error::{LedgerError, LedgerResult};
use crate::journal::{Journal, JournalConfig, JournalEntry};
use crate::records::KeyModification;
use crate::traits::{HistoryIter, LedgerAccessor};

/// Reference ledger for tests, the CLI, and the HTTP host.
///
/// Holds world state and every key's modification log in memory behind a
/// single `RwLock`. When opened with a [`Journal`], each modification is
/// journaled before it is applied, and reopening replays the journal.
pub struct LocalLedger {
    inner: RwLock<LedgerState>,
    journal: Option<Journal>,
}

#[derive(Default)]
struct LedgerState {
    world: HashMap<String, Vec<u8>>,
    history: HashMap<String, Vec<KeyModification>>,
}

impl LedgerState {
    fn apply(&mut self, key: &str, modification: KeyModification) {
        match &modification.value {
            Some(value) if !modification.is_delete => {
                self.world.insert(key.to_string(), value.clone());
            }
            _ => {
                self.world.remove(key);
            }
        }
        self.history
            .entry(key.to_string())
            .or_default()
            .push(modification);
    }
}

impl LocalLedger {
    /// Empty, purely in-memory ledger.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(LedgerState::default()),
            journal: None,
        }
    }

    /// Open a journaled ledger, replaying any existing journal at `path`.
    pub fn open(path: &Path, config: JournalConfig) -> LedgerResult<Self> {
        let (journal, entries) = Journal::open_recovered(path, config)?;
        let mut state = LedgerState::default();
        let recovered = entries.len();
        for entry in entries {
            state.apply(&entry.key, entry.modification);
        }
        info!(
            path = %path.display(),
            recovered,
            live_keys = state.world.len(),
            "ledger journal recovered"
        );

        Ok(Self {
            inner: RwLock::new(state),
            journal: Some(journal),
        })
    }

    /// Open a transaction stub. Every write made through it carries the same
    /// transaction id and timestamp.
    pub fn begin(&self) -> LedgerTx<'_> {
        LedgerTx {
            ledger: self,
            tx_id: TxId::new(),
            timestamp: LedgerTimestamp::now(),
        }
    }

    /// Transaction stub with caller-chosen id and timestamp.
    pub fn begin_with(&self, tx_id: TxId, timestamp: LedgerTimestamp) -> LedgerTx<'_> {
        LedgerTx {
            ledger: self,
            tx_id,
            timestamp,
        }
    }

    /// Number of live (non-deleted) keys.
    pub fn len(&self) -> LedgerResult<usize> {
        Ok(self.read_state()?.world.len())
    }

    pub fn is_empty(&self) -> LedgerResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Sorted live keys.
    pub fn keys(&self) -> LedgerResult<Vec<String>> {
        let state = self.read_state()?;
        let mut keys: Vec<String> = state.world.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    /// Number of recorded modifications for `key`, tombstones included.
    pub fn history_len(&self, key: &str) -> LedgerResult<usize> {
        let state = self.read_state()?;
        Ok(state.history.get(key).map(Vec::len).unwrap_or(0))
    }

    pub fn journal(&self) -> Option<&Journal> {
        self.journal.as_ref()
    }

    fn read_state(&self) -> LedgerResult<RwLockReadGuard<'_, LedgerState>> {
        self.inner
            .read()
            .map_err(|_| LedgerError::LockPoisoned("ledger read"))
    }

    fn write_state(&self) -> LedgerResult<RwLockWriteGuard<'_, LedgerState>> {
        self.inner
            .write()
            .map_err(|_| LedgerError::LockPoisoned("ledger write"))
    }

    /// Journal first, then apply. A failed journal append leaves state as is.
    fn commit(
        &self,
        state: &mut LedgerState,
        key: &str,
        modification: KeyModification,
    ) -> LedgerResult<()> {
        if let Some(journal) = &self.journal {
            journal.append(&JournalEntry {
                key: key.to_string(),
                modification: modification.clone(),
            })?;
        }
        state.apply(key, modification);
        Ok(())
    }
}

impl Default for LocalLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LocalLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalLedger")
            .field("live_keys", &self.len().ok())
            .field("journal", &self.journal)
            .finish()
    }
}

/// One transaction's view of a [`LocalLedger`].
///
/// Writes are applied immediately; there is no read-your-writes isolation
/// or rollback beyond what the chaincode's one-mutation-per-operation
/// discipline already gives.
#[derive(Debug)]
pub struct LedgerTx<'a> {
    ledger: &'a LocalLedger,
    tx_id: TxId,
    timestamp: LedgerTimestamp,
}

impl LedgerTx<'_> {
    pub fn tx_id(&self) -> &TxId {
        &self.tx_id
    }

    pub fn timestamp(&self) -> LedgerTimestamp {
        self.timestamp
    }
}

impl LedgerAccessor for LedgerTx<'_> {
    fn get_state(&self, key: &str) -> LedgerResult<Option<Vec<u8>>> {
        if key.is_empty() {
            return Err(LedgerError::EmptyKey);
        }
        let state = self.ledger.read_state()?;
        Ok(state.world.get(key).cloned())
    }

    fn put_state(&self, key: &str, value: &[u8]) -> LedgerResult<()> {
        if key.is_empty() {
            return Err(LedgerError::EmptyKey);
        }
        let mut state = self.ledger.write_state()?;
        let modification = KeyModification::write(self.tx_id.clone(), value.to_vec(), self.timestamp);
        self.ledger.commit(&mut state, key, modification)?;
        debug!(tx = %self.tx_id.short_id(), key, len = value.len(), "put state");
        Ok(())
    }

    fn del_state(&self, key: &str) -> LedgerResult<()> {
        if key.is_empty() {
            return Err(LedgerError::EmptyKey);
        }
        let mut state = self.ledger.write_state()?;
        // Deleting an absent key records nothing.
        if !state.world.contains_key(key) {
            return Ok(());
        }
        let modification = KeyModification::tombstone(self.tx_id.clone(), self.timestamp);
        self.ledger.commit(&mut state, key, modification)?;
        debug!(tx = %self.tx_id.short_id(), key, "delete state");
        Ok(())
    }

    fn history_for_key(&self, key: &str) -> LedgerResult<HistoryIter<'_>> {
        if key.is_empty() {
            return Err(LedgerError::EmptyKey);
        }
        let guard = self.ledger.read_state()?;
        Ok(Box::new(HistoryScan {
            guard,
            key: key.to_string(),
            position: 0,
        }))
    }
}

/// Forward scan over one key's modification log.
///
/// Holds the ledger's read guard until dropped, so writers on the same
/// ledger block while a scan is alive. Drop the scan before writing from
/// the same thread.
pub struct HistoryScan<'a> {
    guard: RwLockReadGuard<'a, LedgerState>,
    key: String,
    position: usize,
}

impl Iterator for HistoryScan<'_> {
    type Item = LedgerResult<KeyModification>;

    fn next(&mut self) -> Option<Self::Item> {
        let modification = self.guard.history.get(&self.key)?.get(self.position)?.clone();
        self.position += 1;
        Some(Ok(modification))
    }
}

impl std::iter::FusedIterator for HistoryScan<'_> {}
