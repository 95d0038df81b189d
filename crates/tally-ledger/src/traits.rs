use crate::error::LedgerResult;
use crate::records::KeyModification;

/// Lazy, finite, forward-ordered scan over one key's modifications.
///
/// The scan is consumed by iteration and cannot be restarted. Backend
/// resources held by the scan are released when it is dropped, whether it
/// was drained, abandoned, or stopped on an error item.
pub type HistoryIter<'a> = Box<dyn Iterator<Item = LedgerResult<KeyModification>> + 'a>;

/// Per-transaction view of the ledger handed to every chaincode operation.
///
/// Implementations must satisfy:
/// - `get_state` returns `Ok(None)` for a key that was never written or whose
///   latest modification is a delete.
/// - `put_state` replaces the whole value at the key.
/// - `del_state` records a tombstone; the key then reads as absent.
/// - `history_for_key` yields modifications oldest to newest, one per write
///   or delete.
/// - Backend faults are returned as `Err`, never swallowed.
pub trait LedgerAccessor {
    fn get_state(&self, key: &str) -> LedgerResult<Option<Vec<u8>>>;

    fn put_state(&self, key: &str, value: &[u8]) -> LedgerResult<()>;

    fn del_state(&self, key: &str) -> LedgerResult<()>;

    fn history_for_key(&self, key: &str) -> LedgerResult<HistoryIter<'_>>;
}

impl<L: LedgerAccessor + ?Sized> LedgerAccessor for &L {
    fn get_state(&self, key: &str) -> LedgerResult<Option<Vec<u8>>> {
        (**self).get_state(key)
    }

    fn put_state(&self, key: &str, value: &[u8]) -> LedgerResult<()> {
        (**self).put_state(key, value)
    }

    fn del_state(&self, key: &str) -> LedgerResult<()> {
        (**self).del_state(key)
    }

    fn history_for_key(&self, key: &str) -> LedgerResult<HistoryIter<'_>> {
        (**self).history_for_key(key)
    }
}
