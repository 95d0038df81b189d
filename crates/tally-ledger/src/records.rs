use serde::{Deserialize, Serialize};
use tally_types::{LedgerTimestamp, TxId};

/// One entry of a key's change log: either a write or a tombstone.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyModification {
    pub tx_id: TxId,
    /// Value written by the transaction; `None` for a delete.
    pub value: Option<Vec<u8>>,
    pub timestamp: LedgerTimestamp,
    pub is_delete: bool,
}

impl KeyModification {
    pub fn write(tx_id: TxId, value: Vec<u8>, timestamp: LedgerTimestamp) -> Self {
        Self {
            tx_id,
            value: Some(value),
            timestamp,
            is_delete: false,
        }
    }

    pub fn tombstone(tx_id: TxId, timestamp: LedgerTimestamp) -> Self {
        Self {
            tx_id,
            value: None,
            timestamp,
            is_delete: true,
        }
    }
}
