use std::fmt;

use serde::{Deserialize, Serialize};
use tally_ledger::LedgerAccessor;
use tally_types::EntityKind;
use tracing::{debug, warn};

use crate::args::expect_arity;
use crate::error::{ChaincodeError, ChaincodeResult};
use crate::history::HistoryReconstructor;
use crate::response::Response;
use crate::shape::{ItemShape, OrderShape, RecordShape};
use crate::store::EntityStore;

/// Operations reachable through [`Chaincode::invoke`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Query,
    Update,
    Delete,
    GetHistory,
}

impl Operation {
    /// Resolve a function name for `kind`. Sales also answer to the legacy
    /// name `modifyClient`.
    pub fn resolve(kind: EntityKind, function: &str) -> Option<Self> {
        match function {
            "create" => Some(Self::Create),
            "query" => Some(Self::Query),
            "update" => Some(Self::Update),
            "modifyClient" if kind == EntityKind::Sale => Some(Self::Update),
            "delete" => Some(Self::Delete),
            "getHistory" => Some(Self::GetHistory),
            _ => None,
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            Self::Create | Self::Query => 1,
            Self::Delete | Self::GetHistory => 2,
            Self::Update => 3,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Query => "query",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::GetHistory => "getHistory",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Function name plus positional string arguments.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    pub function: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new<I, A>(function: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        Self {
            function: function.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

/// Routes invocations for one entity kind to its store and history replay.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Chaincode {
    kind: EntityKind,
}

impl Chaincode {
    pub fn new(kind: EntityKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Instantiation hook. Nothing to set up.
    pub fn init(&self) -> Response {
        debug!(kind = %self.kind, "init");
        Response::success(Vec::new())
    }

    pub fn invoke<L>(&self, ledger: &L, function: &str, args: &[String]) -> Response
    where
        L: LedgerAccessor + ?Sized,
    {
        debug!(kind = %self.kind, function, args = args.len(), "invoke is running");
        let result = self.route(ledger, function, args);
        if let Err(e) = &result {
            warn!(kind = %self.kind, function, error_kind = %e.kind(), error = %e, "invoke failed");
        }
        Response::from(result)
    }

    pub fn invoke_with<L>(&self, ledger: &L, invocation: &Invocation) -> Response
    where
        L: LedgerAccessor + ?Sized,
    {
        self.invoke(ledger, &invocation.function, &invocation.args)
    }

    fn route<L>(&self, ledger: &L, function: &str, args: &[String]) -> ChaincodeResult<Vec<u8>>
    where
        L: LedgerAccessor + ?Sized,
    {
        let operation =
            Operation::resolve(self.kind, function).ok_or_else(|| ChaincodeError::UnknownFunction {
                function: function.to_string(),
            })?;
        expect_arity(args, operation.arity())?;

        if self.kind.is_order_like() {
            run(EntityStore::<OrderShape>::new(self.kind), ledger, operation, args)
        } else {
            run(EntityStore::<ItemShape>::new(self.kind), ledger, operation, args)
        }
    }
}

/// Arity has already been checked against `operation`.
fn run<S, L>(
    store: EntityStore<S>,
    ledger: &L,
    operation: Operation,
    args: &[String],
) -> ChaincodeResult<Vec<u8>>
where
    S: RecordShape,
    L: LedgerAccessor + ?Sized,
{
    match operation {
        Operation::Create => store.create(ledger, &args[0]).map(|_| Vec::new()),
        Operation::Query => store.query(ledger, &args[0]),
        Operation::Update => store
            .update(ledger, &args[0], &args[1], &args[2])
            .map(|_| Vec::new()),
        Operation::Delete => store.delete(ledger, &args[0], &args[1]).map(|_| Vec::new()),
        Operation::GetHistory => {
            let key = store.key_for(&args[0], &args[1])?;
            HistoryReconstructor::render(ledger, &key)
        }
    }
}
