//! Resolved zone/account scope of an export

use super::registry::Scope;
use anyhow::{bail, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Zone,
    Account,
}

/// The concrete zone or account a resource type is exported from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeRef {
    pub kind: ScopeKind,
    pub id: String,
}

impl ScopeRef {
    pub fn zone(id: impl Into<String>) -> Self {
        Self {
            kind: ScopeKind::Zone,
            id: id.into(),
        }
    }

    pub fn account(id: impl Into<String>) -> Self {
        Self {
            kind: ScopeKind::Account,
            id: id.into(),
        }
    }

    /// Pick the scope a resource type needs from the ids the user gave
    pub fn resolve(
        resource_type: &str,
        scope: Scope,
        zone_id: Option<&str>,
        account_id: Option<&str>,
    ) -> Result<Self> {
        match (scope, zone_id, account_id) {
            (Scope::Zone | Scope::Any, Some(zone), _) => Ok(Self::zone(zone)),
            (Scope::Account | Scope::Any, _, Some(account)) => Ok(Self::account(account)),
            (Scope::Zone, None, _) => {
                bail!("{} is a zone resource; pass --zone", resource_type)
            }
            (Scope::Account, _, None) => {
                bail!("{} is an account resource; pass --account", resource_type)
            }
            (Scope::Any, None, None) => {
                bail!("{} needs --zone or --account", resource_type)
            }
        }
    }

    /// Terraform attribute carrying the scope id
    pub fn attribute(&self) -> &'static str {
        match self.kind {
            ScopeKind::Zone => "zone_id",
            ScopeKind::Account => "account_id",
        }
    }

    pub fn kind_str(&self) -> &'static str {
        match self.kind {
            ScopeKind::Zone => "zone",
            ScopeKind::Account => "account",
        }
    }

    /// Value of a scope placeholder (`zone_id`, `account_id`, `scope_id`,
    /// `scope_kind`, `scope_path`), unencoded
    pub fn placeholder(&self, name: &str) -> Option<String> {
        match name {
            "zone_id" if self.kind == ScopeKind::Zone => Some(self.id.clone()),
            "account_id" if self.kind == ScopeKind::Account => Some(self.id.clone()),
            "scope_id" => Some(self.id.clone()),
            "scope_kind" => Some(self.kind_str().to_string()),
            "scope_path" => Some(format!("{}s/{}", self.kind_str(), self.id)),
            _ => None,
        }
    }
}
