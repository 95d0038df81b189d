//! Record-shape descriptors.
//!
//! The entity store is written once against [`RecordShape`]; each shape
//! names its record type, how the composite key is derived from a decoded
//! record, and which field an update replaces.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tally_types::EntityKey;

use crate::args;
use crate::error::{ChaincodeError, ChaincodeResult};
use crate::records::{ItemRecord, OrderRecord};

pub trait RecordShape {
    type Record: Serialize + DeserializeOwned;
    /// Validated replacement for the mutable field.
    type Patch;

    /// Field replaced by `update`.
    const MUTABLE_FIELD: &'static str;

    /// Key of a freshly decoded record, or the first missing identity field.
    fn key_of(record: &Self::Record) -> ChaincodeResult<EntityKey>;

    /// Validate the update value argument at `position`.
    fn parse_patch(arg: &str, position: usize) -> ChaincodeResult<Self::Patch>;

    fn apply_patch(record: &mut Self::Record, patch: Self::Patch);
}

/// Purchase orders and sales.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderShape;

impl RecordShape for OrderShape {
    type Record = OrderRecord;
    type Patch = String;

    const MUTABLE_FIELD: &'static str = "client";

    fn key_of(record: &OrderRecord) -> ChaincodeResult<EntityKey> {
        let company_id = record
            .company_id
            .as_deref()
            .ok_or(ChaincodeError::MissingField { field: "company_id" })?;
        let order_id = record
            .order_id
            .ok_or(ChaincodeError::MissingField { field: "order_id" })?;
        if company_id.is_empty() {
            return Err(ChaincodeError::EmptyField { field: "company_id" });
        }
        entity_key(company_id, order_id.to_string())
    }

    fn parse_patch(arg: &str, position: usize) -> ChaincodeResult<String> {
        args::require_non_empty(arg, position).map(str::to_string)
    }

    fn apply_patch(record: &mut OrderRecord, client: String) {
        record.client = client;
    }
}

/// Stock items.
#[derive(Debug, Clone, Copy, Default)]
pub struct ItemShape;

impl RecordShape for ItemShape {
    type Record = ItemRecord;
    type Patch = i64;

    const MUTABLE_FIELD: &'static str = "how3";

    fn key_of(record: &ItemRecord) -> ChaincodeResult<EntityKey> {
        let company_id = record
            .company_id
            .as_deref()
            .ok_or(ChaincodeError::MissingField { field: "company_id" })?;
        let spec_id = record
            .spec_id
            .as_deref()
            .ok_or(ChaincodeError::MissingField { field: "spec_id" })?;
        if company_id.is_empty() {
            return Err(ChaincodeError::EmptyField { field: "company_id" });
        }
        if spec_id.is_empty() {
            return Err(ChaincodeError::EmptyField { field: "spec_id" });
        }
        entity_key(company_id, spec_id)
    }

    fn parse_patch(arg: &str, position: usize) -> ChaincodeResult<i64> {
        args::parse_numeric(arg, position)
    }

    fn apply_patch(record: &mut ItemRecord, how3: i64) {
        record.how3 = how3;
    }
}

fn entity_key(tenant_id: &str, local_id: impl Into<String>) -> ChaincodeResult<EntityKey> {
    // Both components were checked non-empty by the caller.
    EntityKey::new(tenant_id, local_id).map_err(|_| ChaincodeError::EmptyField {
        field: "company_id",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(json: &str) -> OrderRecord {
        serde_json::from_str(json).unwrap()
    }

    fn item(json: &str) -> ItemRecord {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn order_key_uses_integer_order_id() {
        let key = OrderShape::key_of(&order(r#"{"company_id": "acme", "order_id": 42}"#)).unwrap();
        assert_eq!(key.as_ledger_key(), "acme-42");
    }

    #[test]
    fn order_key_names_missing_field() {
        let error = OrderShape::key_of(&order(r#"{"order_id": 7}"#)).unwrap_err();
        assert!(error.to_string().contains("company_id"));

        let error = OrderShape::key_of(&order(r#"{"company_id": "A"}"#)).unwrap_err();
        assert!(error.to_string().contains("order_id"));

        let error = OrderShape::key_of(&order(r#"{"company_id": "", "order_id": 1}"#)).unwrap_err();
        assert!(matches!(error, ChaincodeError::EmptyField { field: "company_id" }));
    }

    #[test]
    fn item_key_requires_both_components() {
        let key = ItemShape::key_of(&item(r#"{"company_id": "acme", "spec_id": "S-1"}"#)).unwrap();
        assert_eq!(key.as_ledger_key(), "acme-S-1");

        let error = ItemShape::key_of(&item(r#"{"spec_id": "S-1"}"#)).unwrap_err();
        assert!(matches!(error, ChaincodeError::MissingField { field: "company_id" }));

        let error = ItemShape::key_of(&item(r#"{"company_id": "acme"}"#)).unwrap_err();
        assert!(matches!(error, ChaincodeError::MissingField { field: "spec_id" }));

        let error = ItemShape::key_of(&item(r#"{"company_id": "acme", "spec_id": ""}"#)).unwrap_err();
        assert!(matches!(error, ChaincodeError::EmptyField { field: "spec_id" }));
    }

    #[test]
    fn patches_replace_only_the_mutable_field() {
        let mut record = order(r#"{"company_id": "A", "order_id": 1, "client": "old", "tabno": "9"}"#);
        OrderShape::apply_patch(&mut record, OrderShape::parse_patch("new", 3).unwrap());
        assert_eq!(record.client, "new");
        assert_eq!(record.tabno, "9");

        let mut record = item(r#"{"company_id": "A", "spec_id": "S", "how3": 1}"#);
        ItemShape::apply_patch(&mut record, ItemShape::parse_patch("12", 3).unwrap());
        assert_eq!(record.how3, 12);
        assert!(ItemShape::parse_patch("twelve", 3).is_err());
    }
}
