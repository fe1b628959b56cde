// crates/ledger-query-core/src/core/permissions.rs
// ============================================================================
// Module: Ledger Query Permissions
// Description: Role-derived capability tags gating query execution.
// Purpose: Provide the closed permission set with stable labels and OWN/ANY pairs.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Accounts hold zero or more roles; each role grants a set of permissions.
//! Permissions come in OWN/ANY pairs for account-scoped queries ("may read my
//! own transactions" versus "may read anyone's transactions") plus a handful
//! of global singletons. Handlers compose the pairs as: ANY, or OWN when the
//! target account equals the caller. An ANY grant therefore authorizes a
//! strict superset of the matching OWN grant.
//!
//! Labels are stable wire/storage strings; they are also the only
//! human-readable rendering used in permission-denial error messages.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::RoleId;

// ============================================================================
// SECTION: Permission Tags
// ============================================================================

/// Capability tags derived from roles.
///
/// # Invariants
/// - Variants are stable for serialization and storage labels.
/// - `GetAll*` variants authorize a strict superset of the matching `GetMy*`
///   variant.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Read the caller's own account record.
    GetMyAccount,
    /// Read any account record.
    GetAllAccounts,
    /// Read the caller's own committed transactions.
    GetMyTransactions,
    /// Read any committed transaction.
    GetAllTransactions,
    /// Read transaction history of the caller's own account.
    GetMyAccountTransactions,
    /// Read transaction history of any account.
    GetAllAccountTransactions,
    /// Read asset transaction history of the caller's own account.
    GetMyAccountAssetTransactions,
    /// Read asset transaction history of any account.
    GetAllAccountAssetTransactions,
    /// Read asset balances of the caller's own account.
    GetMyAccountAssets,
    /// Read asset balances of any account.
    GetAllAccountAssets,
    /// Read key/value detail of the caller's own account.
    GetMyAccountDetail,
    /// Read key/value detail of any account.
    GetAllAccountDetail,
    /// Read signatories of the caller's own account.
    GetMySignatories,
    /// Read signatories of any account.
    GetAllSignatories,
    /// Read the caller's own pending (uncommitted) transactions.
    GetMyPendingTransactions,
    /// Read asset definitions.
    ReadAssets,
    /// Read committed blocks by height.
    GetBlocks,
    /// Read the role list and role permission sets.
    GetRoles,
    /// Read the peer list.
    GetPeers,
}

impl Permission {
    /// Returns the stable storage/wire label for the permission.
    ///
    /// Labels are the only rendering embedded in user-visible error
    /// messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::GetMyAccount => "can_get_my_account",
            Self::GetAllAccounts => "can_get_all_accounts",
            Self::GetMyTransactions => "can_get_my_txs",
            Self::GetAllTransactions => "can_get_all_txs",
            Self::GetMyAccountTransactions => "can_get_my_acc_txs",
            Self::GetAllAccountTransactions => "can_get_all_acc_txs",
            Self::GetMyAccountAssetTransactions => "can_get_my_acc_ast_txs",
            Self::GetAllAccountAssetTransactions => "can_get_all_acc_ast_txs",
            Self::GetMyAccountAssets => "can_get_my_acc_ast",
            Self::GetAllAccountAssets => "can_get_all_acc_ast",
            Self::GetMyAccountDetail => "can_get_my_acc_detail",
            Self::GetAllAccountDetail => "can_get_all_acc_detail",
            Self::GetMySignatories => "can_get_my_signatories",
            Self::GetAllSignatories => "can_get_all_signatories",
            Self::GetMyPendingTransactions => "can_get_pending_txs",
            Self::ReadAssets => "can_read_assets",
            Self::GetBlocks => "can_get_blocks",
            Self::GetRoles => "can_get_roles",
            Self::GetPeers => "can_get_peers",
        }
    }

    /// Parses a stable storage label back into a permission.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "can_get_my_account" => Some(Self::GetMyAccount),
            "can_get_all_accounts" => Some(Self::GetAllAccounts),
            "can_get_my_txs" => Some(Self::GetMyTransactions),
            "can_get_all_txs" => Some(Self::GetAllTransactions),
            "can_get_my_acc_txs" => Some(Self::GetMyAccountTransactions),
            "can_get_all_acc_txs" => Some(Self::GetAllAccountTransactions),
            "can_get_my_acc_ast_txs" => Some(Self::GetMyAccountAssetTransactions),
            "can_get_all_acc_ast_txs" => Some(Self::GetAllAccountAssetTransactions),
            "can_get_my_acc_ast" => Some(Self::GetMyAccountAssets),
            "can_get_all_acc_ast" => Some(Self::GetAllAccountAssets),
            "can_get_my_acc_detail" => Some(Self::GetMyAccountDetail),
            "can_get_all_acc_detail" => Some(Self::GetAllAccountDetail),
            "can_get_my_signatories" => Some(Self::GetMySignatories),
            "can_get_all_signatories" => Some(Self::GetAllSignatories),
            "can_get_pending_txs" => Some(Self::GetMyPendingTransactions),
            "can_read_assets" => Some(Self::ReadAssets),
            "can_get_blocks" => Some(Self::GetBlocks),
            "can_get_roles" => Some(Self::GetRoles),
            "can_get_peers" => Some(Self::GetPeers),
            _ => None,
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// SECTION: Roles
// ============================================================================

/// Role definition mapping a role identifier to its granted permissions.
///
/// # Invariants
/// - `permissions` is a set; duplicate grants collapse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Role identifier.
    pub role_id: RoleId,
    /// Permissions granted by the role.
    pub permissions: BTreeSet<Permission>,
}

impl Role {
    /// Creates a role from an identifier and permission list.
    #[must_use]
    pub fn new(role_id: RoleId, permissions: impl IntoIterator<Item = Permission>) -> Self {
        Self {
            role_id,
            permissions: permissions.into_iter().collect(),
        }
    }

    /// Returns whether the role grants the permission.
    #[must_use]
    pub fn grants(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }
}
