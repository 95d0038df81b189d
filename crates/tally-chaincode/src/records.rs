//! JSON record shapes stored on the ledger.
//!
//! Field names are the wire format shared with data already on the ledger.
//! Identity fields are `Option` so a missing value can be told apart from a
//! present one; display fields treat `null` like an absent field. Unknown
//! fields are carried through `extra` so an update never drops them.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// One line of a purchase order or sale.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default, deserialize_with = "null_as_default")]
    pub spec_id: i64,
    /// Discriminator code for how the line was fulfilled.
    #[serde(default, deserialize_with = "null_as_default")]
    pub how: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub money: f64,
}

/// Purchase order or sale.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub company_id: Option<String>,
    pub order_id: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tabno: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub client: String,
    /// Acceptance time, seconds since the epoch.
    #[serde(default, deserialize_with = "null_as_default")]
    pub acc_time: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<LineItem>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Stock item.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub company_id: Option<String>,
    pub spec_id: Option<String>,
    /// Quantity on hand.
    #[serde(default, deserialize_with = "null_as_default")]
    pub how3: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
