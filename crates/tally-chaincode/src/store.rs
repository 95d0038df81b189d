use std::marker::PhantomData;

use tally_ledger::LedgerAccessor;
use tally_types::{EntityKey, EntityKind};
use tracing::{debug, warn};

use crate::args;
use crate::error::{ArgPosition, ChaincodeError, ChaincodeResult};
use crate::shape::RecordShape;

/// Create / query / update / delete for one entity kind.
///
/// Every operation touches exactly one key and performs at most one ledger
/// mutation. The ledger is passed per call; the store holds no state.
#[derive(Debug, Clone, Copy)]
pub struct EntityStore<S> {
    kind: EntityKind,
    _shape: PhantomData<S>,
}

impl<S: RecordShape> EntityStore<S> {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            _shape: PhantomData,
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Key addressed by a (tenant id, local id) argument pair at positions
    /// 1 and 2. Both are used verbatim.
    pub fn key_for(&self, tenant_id: &str, local_id: &str) -> ChaincodeResult<EntityKey> {
        let tenant_id = args::require_non_empty(tenant_id, 1)?;
        let local_id = args::require_non_empty(local_id, 2)?;
        let key = EntityKey::new(tenant_id, local_id).map_err(|_| ChaincodeError::EmptyArgument {
            position: ArgPosition(2),
        })?;
        self.flag_ambiguous(&key);
        Ok(key)
    }

    /// Store `payload` verbatim under the key derived from its identity
    /// fields. Fails if any value is already present at that key.
    pub fn create<L>(&self, ledger: &L, payload: &str) -> ChaincodeResult<EntityKey>
    where
        L: LedgerAccessor + ?Sized,
    {
        debug!(kind = %self.kind, "start create");
        let payload = args::require_non_empty(payload, 1)?;
        let record: S::Record =
            serde_json::from_str(payload).map_err(|e| ChaincodeError::InvalidJson {
                payload: payload.to_string(),
                reason: e.to_string(),
            })?;
        let key = S::key_of(&record)?;
        self.flag_ambiguous(&key);
        let ledger_key = key.as_ledger_key();

        let existing = ledger
            .get_state(&ledger_key)
            .map_err(ChaincodeError::storage("get", &ledger_key))?;
        if existing.is_some() {
            return Err(ChaincodeError::AlreadyExists { key: ledger_key });
        }

        ledger
            .put_state(&ledger_key, payload.as_bytes())
            .map_err(ChaincodeError::storage("put", &ledger_key))?;

        debug!(kind = %self.kind, key = %ledger_key, "end create");
        Ok(key)
    }

    /// Raw stored bytes at the literal ledger key `key`.
    pub fn query<L>(&self, ledger: &L, key: &str) -> ChaincodeResult<Vec<u8>>
    where
        L: LedgerAccessor + ?Sized,
    {
        let key = args::require_non_empty(key, 1)?;
        let value = ledger
            .get_state(key)
            .map_err(ChaincodeError::storage("get", key))?
            .ok_or_else(|| ChaincodeError::NotFound {
                key: key.to_string(),
            })?;
        debug!(kind = %self.kind, key, len = value.len(), "query");
        Ok(value)
    }

    /// Replace the shape's mutable field on an existing record.
    ///
    /// The read and the write are not atomic with respect to other writers;
    /// conflict detection is left to the ledger runtime.
    pub fn update<L>(
        &self,
        ledger: &L,
        tenant_id: &str,
        local_id: &str,
        value: &str,
    ) -> ChaincodeResult<EntityKey>
    where
        L: LedgerAccessor + ?Sized,
    {
        debug!(kind = %self.kind, field = S::MUTABLE_FIELD, "start update");
        let key = self.key_for(tenant_id, local_id)?;
        let patch = S::parse_patch(value, 3)?;
        let ledger_key = key.as_ledger_key();

        let stored = ledger
            .get_state(&ledger_key)
            .map_err(ChaincodeError::storage("get", &ledger_key))?
            .ok_or_else(|| ChaincodeError::NotFound {
                key: ledger_key.clone(),
            })?;

        let mut record: S::Record =
            serde_json::from_slice(&stored).map_err(|e| ChaincodeError::Codec {
                action: "decode",
                key: ledger_key.clone(),
                reason: e.to_string(),
            })?;
        S::apply_patch(&mut record, patch);
        let encoded = serde_json::to_vec(&record).map_err(|e| ChaincodeError::Codec {
            action: "encode",
            key: ledger_key.clone(),
            reason: e.to_string(),
        })?;

        ledger
            .put_state(&ledger_key, &encoded)
            .map_err(ChaincodeError::storage("put", &ledger_key))?;

        debug!(kind = %self.kind, key = %ledger_key, "end update");
        Ok(key)
    }

    /// Tombstone an existing record. The stored value must still decode
    /// into the shape's record type.
    pub fn delete<L>(&self, ledger: &L, tenant_id: &str, local_id: &str) -> ChaincodeResult<EntityKey>
    where
        L: LedgerAccessor + ?Sized,
    {
        debug!(kind = %self.kind, "start delete");
        let key = self.key_for(tenant_id, local_id)?;
        let ledger_key = key.as_ledger_key();

        let stored = ledger
            .get_state(&ledger_key)
            .map_err(ChaincodeError::storage("get", &ledger_key))?
            .ok_or_else(|| ChaincodeError::NotFound {
                key: ledger_key.clone(),
            })?;

        serde_json::from_slice::<S::Record>(&stored).map_err(|e| ChaincodeError::CorruptState {
            key: ledger_key.clone(),
            reason: e.to_string(),
        })?;

        ledger
            .del_state(&ledger_key)
            .map_err(ChaincodeError::storage("delete", &ledger_key))?;

        debug!(kind = %self.kind, key = %ledger_key, "end delete");
        Ok(key)
    }

    fn flag_ambiguous(&self, key: &EntityKey) {
        if key.is_ambiguous() {
            warn!(
                kind = %self.kind,
                tenant = key.tenant_id(),
                local = key.local_id(),
                "key component contains the separator; ledger key may collide"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use tally_ledger::{HistoryIter, LedgerError, LedgerResult, LocalLedger};
    use tally_types::EntityKind;

    use super::*;
    use crate::error::ErrorKind;
    use crate::shape::{ItemShape, OrderShape};

    const ORDER: &str = r#"{"company_id":"acme","order_id":7,"tabno":"T1","client":"Globex","acc_time":1700000000,"items":[{"spec_id":3,"how":1,"money":12.5}]}"#;
    const ITEM: &str = r#"{"company_id":"acme","spec_id":"S1","how3":5}"#;

    fn orders() -> EntityStore<OrderShape> {
        EntityStore::new(EntityKind::Purchase)
    }

    fn items() -> EntityStore<ItemShape> {
        EntityStore::new(EntityKind::Store)
    }

    /// Ledger whose every call fails, counting mutation attempts.
    #[derive(Default)]
    struct BrokenLedger {
        mutations: Cell<usize>,
    }

    impl LedgerAccessor for BrokenLedger {
        fn get_state(&self, _key: &str) -> LedgerResult<Option<Vec<u8>>> {
            Err(LedgerError::Backend("disk on fire".into()))
        }

        fn put_state(&self, _key: &str, _value: &[u8]) -> LedgerResult<()> {
            self.mutations.set(self.mutations.get() + 1);
            Err(LedgerError::Backend("disk on fire".into()))
        }

        fn del_state(&self, _key: &str) -> LedgerResult<()> {
            self.mutations.set(self.mutations.get() + 1);
            Err(LedgerError::Backend("disk on fire".into()))
        }

        fn history_for_key(&self, _key: &str) -> LedgerResult<HistoryIter<'_>> {
            Err(LedgerError::Backend("disk on fire".into()))
        }
    }

    /// Reads pass through to the wrapped ledger; every mutation fails.
    struct ReadOnlyLedger<L>(L);

    impl<L: LedgerAccessor> LedgerAccessor for ReadOnlyLedger<L> {
        fn get_state(&self, key: &str) -> LedgerResult<Option<Vec<u8>>> {
            self.0.get_state(key)
        }

        fn put_state(&self, _key: &str, _value: &[u8]) -> LedgerResult<()> {
            Err(LedgerError::Backend("read-only".into()))
        }

        fn del_state(&self, _key: &str) -> LedgerResult<()> {
            Err(LedgerError::Backend("read-only".into()))
        }

        fn history_for_key(&self, key: &str) -> LedgerResult<HistoryIter<'_>> {
            self.0.history_for_key(key)
        }
    }

    #[test]
    fn failed_write_after_good_read_leaves_state_unchanged() {
        let ledger = LocalLedger::new();
        orders().create(&ledger.begin(), ORDER).unwrap();
        items().create(&ledger.begin(), ITEM).unwrap();

        let read_only = ReadOnlyLedger(ledger.begin());
        let error = orders().update(&read_only, "acme", "7", "Initech").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::StorageError);
        let error = items().update(&read_only, "acme", "S1", "9").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::StorageError);
        let error = orders().delete(&read_only, "acme", "7").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::StorageError);

        let tx = ledger.begin();
        assert_eq!(orders().query(&tx, "acme-7").unwrap(), ORDER.as_bytes());
        assert_eq!(items().query(&tx, "acme-S1").unwrap(), ITEM.as_bytes());
        assert_eq!(ledger.history_len("acme-7").unwrap(), 1);
        assert_eq!(ledger.history_len("acme-S1").unwrap(), 1);
    }

    #[test]
    fn create_stores_payload_verbatim() {
        let ledger = LocalLedger::new();
        let tx = ledger.begin();
        let key = orders().create(&tx, ORDER).unwrap();
        assert_eq!(key.as_ledger_key(), "acme-7");
        assert_eq!(orders().query(&tx, "acme-7").unwrap(), ORDER.as_bytes());
    }

    #[test]
    fn create_rejects_occupied_key() {
        let ledger = LocalLedger::new();
        let tx = ledger.begin();
        orders().create(&tx, ORDER).unwrap();

        let different = r#"{"company_id":"acme","order_id":7,"client":"Initech"}"#;
        let error = orders().create(&tx, different).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::AlreadyExists);
        assert_eq!(error.to_string(), "The key acme-7 has already existed!");
        assert_eq!(orders().query(&tx, "acme-7").unwrap(), ORDER.as_bytes());
    }

    #[test]
    fn create_rejects_bad_input() {
        let ledger = LocalLedger::new();
        let tx = ledger.begin();

        let error = orders().create(&tx, "").unwrap_err();
        assert_eq!(error.to_string(), "1st argument must be a non-empty string");

        let error = orders().create(&tx, "{not json").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidInput);
        assert!(error.to_string().starts_with("Invalid json format - {not json"));

        let error = orders().create(&tx, r#"{"order_id": 7}"#).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidInput);
        assert_eq!(error.to_string(), "company_id must be required");

        let error = orders().create(&tx, r#"{"company_id": "A"}"#).unwrap_err();
        assert_eq!(error.to_string(), "order_id must be required");

        let error = items().create(&tx, r#"{"company_id": "A"}"#).unwrap_err();
        assert_eq!(error.to_string(), "spec_id must be required");

        assert!(ledger.is_empty().unwrap());
    }

    #[test]
    fn query_errors() {
        let ledger = LocalLedger::new();
        let tx = ledger.begin();
        assert_eq!(orders().query(&tx, "").unwrap_err().kind(), ErrorKind::InvalidInput);

        let error = orders().query(&tx, "acme-1").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NotFound);
        assert!(error.to_string().contains("acme-1"));

        let broken = BrokenLedger::default();
        let error = orders().query(&broken, "acme-1").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::StorageError);
    }

    #[test]
    fn update_order_replaces_client_only() {
        let ledger = LocalLedger::new();
        let tx = ledger.begin();
        orders().create(&tx, ORDER).unwrap();

        orders().update(&tx, "acme", "7", "Initech").unwrap();

        let stored: serde_json::Value =
            serde_json::from_slice(&orders().query(&tx, "acme-7").unwrap()).unwrap();
        let original: serde_json::Value = serde_json::from_str(ORDER).unwrap();
        assert_eq!(stored["client"], "Initech");
        for field in ["company_id", "order_id", "tabno", "acc_time", "items"] {
            assert_eq!(stored[field], original[field], "{field} changed");
        }
    }

    #[test]
    fn update_item_replaces_quantity() {
        let ledger = LocalLedger::new();
        let tx = ledger.begin();
        items().create(&tx, ITEM).unwrap();

        items().update(&tx, "acme", "S1", "42").unwrap();
        let stored: serde_json::Value =
            serde_json::from_slice(&items().query(&tx, "acme-S1").unwrap()).unwrap();
        assert_eq!(stored["how3"], 42);
        assert_eq!(stored["spec_id"], "S1");
    }

    #[test]
    fn update_validates_arguments_before_reading() {
        let broken = BrokenLedger::default();

        let error = items().update(&broken, "acme", "S1", "lots").unwrap_err();
        assert_eq!(error.to_string(), "3rd argument must be a numeric string");

        let error = items().update(&broken, "", "S1", "1").unwrap_err();
        assert_eq!(error.to_string(), "1st argument must be a non-empty string");

        let error = orders().update(&broken, "acme", "7", "").unwrap_err();
        assert_eq!(error.to_string(), "3rd argument must be a non-empty string");

        let error = orders().update(&broken, "acme", "", "x").unwrap_err();
        assert_eq!(error.to_string(), "2nd argument must be a non-empty string");
    }

    #[test]
    fn update_missing_record_is_not_found() {
        let ledger = LocalLedger::new();
        let tx = ledger.begin();
        let error = items().update(&tx, "acme", "S9", "1").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NotFound);
        assert_eq!(ledger.history_len("acme-S9").unwrap(), 0);
    }

    #[test]
    fn update_of_misshapen_record_is_storage_error() {
        let ledger = LocalLedger::new();
        let tx = ledger.begin();
        tx.put_state("acme-S1", b"{\"how3\": \"many\"}").unwrap();

        let error = items().update(&tx, "acme", "S1", "1").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::StorageError);
        assert_eq!(tx.get_state("acme-S1").unwrap().unwrap(), b"{\"how3\": \"many\"}");
    }

    #[test]
    fn delete_tombstones_existing_record() {
        let ledger = LocalLedger::new();
        let tx = ledger.begin();
        orders().create(&tx, ORDER).unwrap();

        orders().delete(&tx, "acme", "7").unwrap();
        assert_eq!(orders().query(&tx, "acme-7").unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(ledger.history_len("acme-7").unwrap(), 2);
    }

    #[test]
    fn delete_errors() {
        let ledger = LocalLedger::new();
        let tx = ledger.begin();

        let error = orders().delete(&tx, "acme", "7").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NotFound);

        tx.put_state("acme-8", b"not json").unwrap();
        let error = orders().delete(&tx, "acme", "8").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::CorruptState);
        assert!(tx.get_state("acme-8").unwrap().is_some());

        let broken = BrokenLedger::default();
        let error = orders().delete(&broken, "acme", "7").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::StorageError);
        assert_eq!(broken.mutations.get(), 0);
    }

    #[test]
    fn storage_fault_on_create_read_skips_write() {
        let broken = BrokenLedger::default();
        let error = orders().create(&broken, ORDER).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::StorageError);
        assert_eq!(broken.mutations.get(), 0);
    }

    #[test]
    fn key_for_uses_arguments_verbatim() {
        assert_eq!(orders().key_for("acme", "0042").unwrap().as_ledger_key(), "acme-0042");
        assert_eq!(orders().key_for("acme", "PO-17").unwrap().as_ledger_key(), "acme-PO-17");
        assert_eq!(items().key_for("acme", "S1").unwrap().as_ledger_key(), "acme-S1");
        assert_eq!(
            orders().key_for("acme", "").unwrap_err().to_string(),
            "2nd argument must be a non-empty string"
        );
    }

    #[test]
    fn delete_of_non_numeric_order_id_is_not_found() {
        let ledger = LocalLedger::new();
        let tx = ledger.begin();
        let error = orders().delete(&tx, "acme", "PO-17").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NotFound);
        assert!(error.to_string().contains("acme-PO-17"));
    }
}
