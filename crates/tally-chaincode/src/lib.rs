//! Entity state machine for Tally.
//!
//! One generic [`EntityStore`] serves every entity kind. A [`RecordShape`]
//! supplies the per-kind details: purchase orders and sales use
//! [`OrderShape`], stock items use [`ItemShape`]. [`Chaincode`] is the
//! entry point a host calls with a function name and positional string
//! arguments; it always answers with a [`Response`].
//!
//! The ledger is passed into every call as a [`tally_ledger::LedgerAccessor`].
//! Nothing here holds state between invocations.

pub mod args;
pub mod dispatch;
pub mod error;
pub mod history;
pub mod records;
pub mod response;
pub mod shape;
pub mod store;

pub use dispatch::{Chaincode, Invocation, Operation};
pub use error::{ArgPosition, ChaincodeError, ChaincodeResult, ErrorKind};
pub use history::{HistoryEntry, HistoryReconstructor, HistoryValue};
pub use records::{ItemRecord, LineItem, OrderRecord};
pub use response::{Response, ERROR, OK};
pub use shape::{ItemShape, OrderShape, RecordShape};
pub use store::EntityStore;
