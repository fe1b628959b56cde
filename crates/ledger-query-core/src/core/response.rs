// crates/ledger-query-core/src/core/response.rs
// ============================================================================
// Module: Ledger Query Responses
// Description: Typed success and error responses for every query kind.
// Purpose: Provide the single construction surface for engine results.
// Dependencies: crate::core::{entities, hashing, identifiers, permissions}, serde, serde_json
// ============================================================================

//! ## Overview
//! Every `execute` call resolves to exactly one [`QueryResponse`]: a typed
//! success payload for the query kind, or an [`ErrorResponse`] carrying a
//! stable error type, a human-readable message, and a stable numeric code.
//! Never both, never neither. Handlers build responses only through the
//! constructors here, so all twelve query kinds produce the error taxonomy
//! identically.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::entities::Account;
use crate::core::entities::AccountAsset;
use crate::core::entities::AssetDefinition;
use crate::core::entities::Block;
use crate::core::entities::Peer;
use crate::core::entities::Signatory;
use crate::core::entities::Transaction;
use crate::core::hashing::TxHash;
use crate::core::identifiers::AssetId;
use crate::core::identifiers::RoleId;
use crate::core::permissions::Permission;

// ============================================================================
// SECTION: Error Taxonomy
// ============================================================================

/// Stable error kinds crossing the engine boundary.
///
/// # Invariants
/// - Variants and their codes are stable across releases for the same
///   conceptual failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryErrorType {
    /// Underlying relational-index or block-store operation failed.
    StatefulFailed,
    /// Permission predicate for the query kind evaluated false.
    NotEnoughPermissions,
    /// Supplied pagination cursor does not resolve in the candidate set.
    InvalidPagination,
    /// Target account does not exist.
    NoAccount,
    /// Target asset does not exist.
    NoAsset,
    /// Target role does not exist.
    NoRoles,
    /// Target account has no signatories.
    NoSignatories,
    /// No block exists at the requested height.
    NoBlock,
    /// No peers are known to the ledger.
    NoPeers,
}

impl QueryErrorType {
    /// Returns the stable numeric code for the error kind.
    ///
    /// Code 3 is reserved for the transport-level execution-context misuse
    /// error so ledger codes stay stable if it ever needs a wire form.
    #[must_use]
    pub const fn code(self) -> u32 {
        match self {
            Self::StatefulFailed => 1,
            Self::NotEnoughPermissions => 2,
            Self::InvalidPagination => 4,
            Self::NoAccount => 5,
            Self::NoAsset => 6,
            Self::NoRoles => 7,
            Self::NoSignatories => 8,
            Self::NoBlock => 9,
            Self::NoPeers => 10,
        }
    }

    /// Returns whether the error reflects a storage failure rather than an
    /// expected denial or not-found outcome.
    #[must_use]
    pub const fn is_storage_failure(self) -> bool {
        matches!(self, Self::StatefulFailed)
    }
}

impl fmt::Display for QueryErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::StatefulFailed => "stateful_failed",
            Self::NotEnoughPermissions => "not_enough_permissions",
            Self::InvalidPagination => "invalid_pagination",
            Self::NoAccount => "no_account",
            Self::NoAsset => "no_asset",
            Self::NoRoles => "no_roles",
            Self::NoSignatories => "no_signatories",
            Self::NoBlock => "no_block",
            Self::NoPeers => "no_peers",
        };
        f.write_str(label)
    }
}

/// Typed error response returned to the caller.
///
/// # Invariants
/// - `code` always equals `error_type.code()`.
/// - `message` never embeds raw storage internals beyond a generic failure
///   description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Stable error kind.
    pub error_type: QueryErrorType,
    /// Human-readable diagnostic message.
    pub message: String,
    /// Stable numeric code for programmatic handling.
    pub code: u32,
}

impl ErrorResponse {
    /// Creates an error response; the code is derived from the kind.
    #[must_use]
    pub fn new(error_type: QueryErrorType, message: impl Into<String>) -> Self {
        Self {
            error_type,
            message: message.into(),
            code: error_type.code(),
        }
    }
}

// ============================================================================
// SECTION: Success Payloads
// ============================================================================

/// Account payload with the roles granted to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountPayload {
    /// Account snapshot.
    pub account: Account,
    /// Roles granted to the account.
    pub roles: Vec<RoleId>,
}

/// Bounded page of committed transactions.
///
/// # Invariants
/// - `transactions.len()` never exceeds the effective page size.
/// - `next_tx_hash` is present iff more candidates remain, and equals the
///   hash of the last returned transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionsPagePayload {
    /// Transactions in canonical order (height, then intra-block index).
    pub transactions: Vec<Transaction>,
    /// Cursor for the next page, absent when the candidate set is exhausted.
    pub next_tx_hash: Option<TxHash>,
    /// Total number of transactions in the candidate set.
    pub all_transactions_size: u64,
}

/// Bounded page of account asset balances.
///
/// # Invariants
/// - `assets.len()` never exceeds the effective page size.
/// - `next_asset_id` is present iff more assets remain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountAssetsPayload {
    /// Asset balances ordered by asset identifier.
    pub assets: Vec<AccountAsset>,
    /// Cursor for the next page, absent when exhausted.
    pub next_asset_id: Option<AssetId>,
    /// Total number of assets held by the account.
    pub total_count: u64,
}

// ============================================================================
// SECTION: Response Union
// ============================================================================

/// The outcome of a query execution: exactly one success or error payload.
///
/// # Invariants
/// - Variants are stable for serialization; one success variant exists per
///   query kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryResponse {
    /// Success payload for `GetAccount`.
    Account(AccountPayload),
    /// Success payload for `GetBlock`.
    Block {
        /// Committed block.
        block: Block,
    },
    /// Success payload for `GetSignatories`.
    Signatories {
        /// Signatory keys of the account.
        keys: Vec<Signatory>,
    },
    /// Success payload for the paged transaction queries.
    TransactionsPage(TransactionsPagePayload),
    /// Success payload for `GetAccountAssets`.
    AccountAssets(AccountAssetsPayload),
    /// Success payload for `GetAccountDetail`.
    AccountDetail {
        /// Detail JSON after applying key/writer filters.
        detail: Value,
    },
    /// Success payload for `GetRoles`.
    Roles {
        /// All role identifiers known to the ledger.
        roles: Vec<RoleId>,
    },
    /// Success payload for `GetRolePermissions`.
    RolePermissions {
        /// Permissions granted by the role.
        permissions: BTreeSet<Permission>,
    },
    /// Success payload for `GetAssetInfo`.
    Asset {
        /// Asset definition.
        asset: AssetDefinition,
    },
    /// Success payload for `GetPendingTransactions`.
    PendingTransactions {
        /// Pending transactions created by the caller.
        transactions: Vec<Transaction>,
    },
    /// Success payload for `GetPeers`.
    Peers {
        /// Known peers.
        peers: Vec<Peer>,
    },
    /// Typed error response for any query kind.
    Error(ErrorResponse),
}

impl QueryResponse {
    /// Returns the error response when this is an error outcome.
    #[must_use]
    pub const fn as_error(&self) -> Option<&ErrorResponse> {
        match self {
            Self::Error(error) => Some(error),
            _ => None,
        }
    }

    /// Returns whether this is an error outcome.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}
