use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// The three record families hosted on the ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// Purchase order (order-like record).
    Purchase,
    /// Sale (order-like record).
    Sale,
    /// Stock item.
    Store,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [Self::Purchase, Self::Sale, Self::Store];

    /// Canonical lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Purchase => "purchase",
            Self::Sale => "sale",
            Self::Store => "store",
        }
    }

    /// Whether records of this kind use the order-like shape.
    pub fn is_order_like(&self) -> bool {
        matches!(self, Self::Purchase | Self::Sale)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EntityKind {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "purchase" => Ok(Self::Purchase),
            "sale" | "sell" | "selling" => Ok(Self::Sale),
            "store" | "item" | "stock" => Ok(Self::Store),
            _ => Err(TypeError::UnknownKind(s.to_string())),
        }
    }
}
