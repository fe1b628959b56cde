// crates/ledger-query-core/src/core/query.rs
// ============================================================================
// Module: Ledger Query Variants
// Description: The closed set of query kinds accepted by the engine.
// Purpose: Provide the tagged query union and pagination request types.
// Dependencies: crate::core::{hashing, identifiers}, serde
// ============================================================================

//! ## Overview
//! Queries form a closed, tagged union; dispatch over them is an exhaustive
//! match, so adding a new kind is a compile-time-detectable gap in every
//! handler site. Query values are immutable once constructed and are
//! consumed exactly once; upstream transport has already validated
//! signatures and freshness before a value reaches the engine.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::hashing::TxHash;
use crate::core::identifiers::AccountId;
use crate::core::identifiers::AssetId;
use crate::core::identifiers::BlockHeight;
use crate::core::identifiers::RoleId;

// ============================================================================
// SECTION: Pagination Requests
// ============================================================================

/// Maximum page size honored by the engine; larger requests clamp to this.
pub const MAX_PAGE_SIZE: u32 = 256;

/// Page request for transaction listings.
///
/// # Invariants
/// - `page_size` is positive; values above [`MAX_PAGE_SIZE`] are clamped.
/// - A supplied `first_tx_hash` is an exclusive cursor: the page starts
///   strictly after that transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxPageRequest {
    /// Exclusive starting cursor, absent for the first page.
    pub first_tx_hash: Option<TxHash>,
    /// Requested page size.
    pub page_size: u32,
}

impl TxPageRequest {
    /// Creates a page request.
    #[must_use]
    pub const fn new(first_tx_hash: Option<TxHash>, page_size: u32) -> Self {
        Self {
            first_tx_hash,
            page_size,
        }
    }

    /// Returns the effective page size after clamping to `1..=MAX_PAGE_SIZE`.
    #[must_use]
    pub const fn effective_page_size(&self) -> u32 {
        if self.page_size == 0 {
            1
        } else if self.page_size > MAX_PAGE_SIZE {
            MAX_PAGE_SIZE
        } else {
            self.page_size
        }
    }
}

/// Page request for account asset listings.
///
/// # Invariants
/// - `page_size` is positive; values above [`MAX_PAGE_SIZE`] are clamped.
/// - A supplied `first_asset_id` is an exclusive cursor by asset identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetPageRequest {
    /// Exclusive starting cursor, absent for the first page.
    pub first_asset_id: Option<AssetId>,
    /// Requested page size.
    pub page_size: u32,
}

impl AssetPageRequest {
    /// Creates a page request.
    #[must_use]
    pub const fn new(first_asset_id: Option<AssetId>, page_size: u32) -> Self {
        Self {
            first_asset_id,
            page_size,
        }
    }

    /// Returns the effective page size after clamping to `1..=MAX_PAGE_SIZE`.
    #[must_use]
    pub const fn effective_page_size(&self) -> u32 {
        if self.page_size == 0 {
            1
        } else if self.page_size > MAX_PAGE_SIZE {
            MAX_PAGE_SIZE
        } else {
            self.page_size
        }
    }
}

// ============================================================================
// SECTION: Query Union
// ============================================================================

/// The closed set of query kinds accepted by [`execute`].
///
/// # Invariants
/// - Variants are stable for serialization and dispatch; handlers match
///   exhaustively so a new variant fails compilation until handled.
///
/// [`execute`]: crate::runtime::QueryEngine::execute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Query {
    /// Read an account record with its granted roles.
    GetAccount {
        /// Target account identifier.
        account_id: AccountId,
    },
    /// Read a committed block by height.
    GetBlock {
        /// Requested block height.
        height: BlockHeight,
    },
    /// Read the signatories of an account.
    GetSignatories {
        /// Target account identifier.
        account_id: AccountId,
    },
    /// Page through the transactions involving an account.
    GetAccountTransactions {
        /// Target account identifier.
        account_id: AccountId,
        /// Pagination request.
        page: TxPageRequest,
    },
    /// Page through the transactions involving an account and asset.
    GetAccountAssetTransactions {
        /// Target account identifier.
        account_id: AccountId,
        /// Target asset identifier.
        asset_id: AssetId,
        /// Pagination request.
        page: TxPageRequest,
    },
    /// Page through committed transactions visible to the caller.
    GetTransactions {
        /// Pagination request.
        page: TxPageRequest,
    },
    /// Page through the asset balances of an account.
    GetAccountAssets {
        /// Target account identifier.
        account_id: AccountId,
        /// Pagination request.
        page: AssetPageRequest,
    },
    /// Read key/value detail of an account, optionally filtered.
    GetAccountDetail {
        /// Target account identifier.
        account_id: AccountId,
        /// Optional detail key filter.
        key: Option<String>,
        /// Optional writer account filter.
        writer: Option<AccountId>,
    },
    /// Read the list of all role identifiers.
    GetRoles,
    /// Read the permission set granted by a role.
    GetRolePermissions {
        /// Target role identifier.
        role_id: RoleId,
    },
    /// Read an asset definition.
    GetAssetInfo {
        /// Target asset identifier.
        asset_id: AssetId,
    },
    /// Read the caller's pending (uncommitted) transactions.
    GetPendingTransactions,
    /// Read the peer list.
    GetPeers,
}
