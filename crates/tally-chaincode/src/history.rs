use serde::{Serialize, Serializer};
use serde_json::value::RawValue;
use tally_ledger::{KeyModification, LedgerAccessor};
use tally_types::EntityKey;
use tracing::debug;

use crate::error::{ChaincodeError, ChaincodeResult};

/// Value recorded at one version of a key.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum HistoryValue {
    /// Stored bytes embedded as JSON.
    Json(Box<RawValue>),
    /// Stored bytes that are not valid JSON, embedded as a JSON string.
    Text(String),
}

impl HistoryValue {
    fn from_bytes(bytes: Vec<u8>) -> Self {
        let text = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => return Self::Text(String::from_utf8_lossy(e.as_bytes()).into_owned()),
        };
        match RawValue::from_string(text.clone()) {
            Ok(raw) => Self::Json(raw),
            Err(_) => Self::Text(text),
        }
    }
}

/// One element of a key's reconstructed timeline.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    #[serde(rename = "TxId")]
    pub tx_id: String,
    /// `None` (serialized as `null`) when this version is a delete.
    #[serde(rename = "Value")]
    pub value: Option<HistoryValue>,
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
    #[serde(rename = "IsDelete", serialize_with = "bool_as_string")]
    pub is_delete: bool,
}

impl From<KeyModification> for HistoryEntry {
    fn from(modification: KeyModification) -> Self {
        let value = if modification.is_delete {
            None
        } else {
            modification.value.map(HistoryValue::from_bytes)
        };
        Self {
            tx_id: modification.tx_id.to_string(),
            value,
            timestamp: modification.timestamp.to_string(),
            is_delete: modification.is_delete,
        }
    }
}

fn bool_as_string<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(if *value { "true" } else { "false" })
}

/// Replays a key's change log into an ordered timeline.
pub struct HistoryReconstructor;

impl HistoryReconstructor {
    /// Every recorded version of `key`, oldest first, in ledger order.
    ///
    /// The ledger scan is dropped on every return path, releasing whatever
    /// the backend holds for it. A failed item aborts the replay.
    pub fn entries<L>(ledger: &L, key: &EntityKey) -> ChaincodeResult<Vec<HistoryEntry>>
    where
        L: LedgerAccessor + ?Sized,
    {
        let ledger_key = key.as_ledger_key();
        debug!(key = %ledger_key, "start history");

        let scan = ledger
            .history_for_key(&ledger_key)
            .map_err(ChaincodeError::storage("read history", &ledger_key))?;

        let mut entries = Vec::new();
        for modification in scan {
            let modification =
                modification.map_err(ChaincodeError::storage("read history", &ledger_key))?;
            entries.push(HistoryEntry::from(modification));
        }

        debug!(key = %ledger_key, versions = entries.len(), "end history");
        Ok(entries)
    }

    /// The timeline as a JSON array.
    pub fn render<L>(ledger: &L, key: &EntityKey) -> ChaincodeResult<Vec<u8>>
    where
        L: LedgerAccessor + ?Sized,
    {
        let entries = Self::entries(ledger, key)?;
        serde_json::to_vec(&entries).map_err(|e| ChaincodeError::Codec {
            action: "encode history of",
            key: key.as_ledger_key(),
            reason: e.to_string(),
        })
    }
}
