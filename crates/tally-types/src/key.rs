use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Separator between the tenant and local components of an [`EntityKey`].
pub const KEY_SEPARATOR: char = '-';

/// Composite ledger key for one entity record.
///
/// The key is the tenant id and the tenant-local id joined with
/// [`KEY_SEPARATOR`]. The components are not escaped, so the rendered form
/// matches keys already present in the ledger.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityKey {
    tenant_id: String,
    local_id: String,
}

impl EntityKey {
    /// Build a key from its two components. Both must be non-empty.
    pub fn new(tenant_id: impl Into<String>, local_id: impl Into<String>) -> Result<Self, TypeError> {
        let tenant_id = tenant_id.into();
        let local_id = local_id.into();
        if tenant_id.is_empty() {
            return Err(TypeError::EmptyComponent { field: "tenant id" });
        }
        if local_id.is_empty() {
            return Err(TypeError::EmptyComponent { field: "local id" });
        }
        Ok(Self { tenant_id, local_id })
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    pub fn local_id(&self) -> &str {
        &self.local_id
    }

    /// Rendered ledger key.
    pub fn as_ledger_key(&self) -> String {
        format!("{}{}{}", self.tenant_id, KEY_SEPARATOR, self.local_id)
    }

    /// Returns `true` if a component contains the separator, in which case
    /// another (tenant, local) pair may render to the same ledger key.
    pub fn is_ambiguous(&self) -> bool {
        self.tenant_id.contains(KEY_SEPARATOR) || self.local_id.contains(KEY_SEPARATOR)
    }
}

impl fmt::Debug for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityKey({})", self.as_ledger_key())
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.tenant_id, KEY_SEPARATOR, self.local_id)
    }
}
