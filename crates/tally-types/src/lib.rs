//! Foundation types for Tally.
//!
//! Every other Tally crate depends on `tally-types`.
//!
//! # Key Types
//!
//! - [`EntityKey`]: Composite `"{tenant}-{local}"` ledger key
//! - [`EntityKind`]: Purchase order, sale, or stock item
//! - [`TxId`]: Time-ordered transaction identifier
//! - [`LedgerTimestamp`]: `(seconds, nanos)` commit timestamp

pub mod error;
pub mod key;
pub mod kind;
pub mod temporal;
pub mod tx;

pub use error::TypeError;
pub use key::{EntityKey, KEY_SEPARATOR};
pub use kind::EntityKind;
pub use temporal::LedgerTimestamp;
pub use tx::TxId;
