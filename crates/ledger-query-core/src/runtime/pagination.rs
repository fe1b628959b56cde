// crates/ledger-query-core/src/runtime/pagination.rs
// ============================================================================
// Module: Transaction Pagination Engine
// Description: Cursor-based paging over candidate transaction and asset sets.
// Purpose: Resolve page requests into bounded, deterministic result windows.
// Dependencies: crate::core, crate::interfaces, thiserror
// ============================================================================

//! ## Overview
//! Pagination operates on an already-ordered candidate set (block height
//! ascending, then intra-block index ascending; later is newer). A supplied
//! cursor is exclusive: the page starts strictly after the identified entry.
//! A cursor that does not resolve within the candidate set is an error, never
//! a silent restart from the beginning or an empty page.
//!
//! Transaction bodies are hydrated from the block store afterwards; the
//! candidate refs carry only index metadata.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use thiserror::Error;

use crate::core::entities::AccountAsset;
use crate::core::entities::Block;
use crate::core::entities::Transaction;
use crate::core::entities::TxRef;
use crate::core::hashing::TxHash;
use crate::core::identifiers::AssetId;
use crate::core::identifiers::BlockHeight;
use crate::core::query::AssetPageRequest;
use crate::core::query::TxPageRequest;
use crate::interfaces::BlockStore;
use crate::interfaces::BlockStoreError;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Pagination resolution errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaginationError {
    /// The supplied cursor does not resolve within the candidate set.
    #[error("pagination cursor not found: {0}")]
    InvalidCursor(String),
}

/// Body hydration errors.
///
/// Any of these reflects an inconsistency between the relational index and
/// the block store, or a store failure; callers surface them as a generic
/// stateful failure.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum HydrationError {
    /// Block store read failed.
    #[error("block store failure: {0}")]
    Store(#[from] BlockStoreError),
    /// The index references a height the block store does not have.
    #[error("indexed block missing from store: height {0}")]
    MissingBlock(BlockHeight),
    /// The index references an intra-block position that does not exist.
    #[error("indexed transaction missing from block: height {height} index {index}")]
    MissingTransaction {
        /// Height of the addressed block.
        height: BlockHeight,
        /// Addressed intra-block position.
        index: u32,
    },
}

// ============================================================================
// SECTION: Transaction Pages
// ============================================================================

/// Resolved window over a candidate transaction set.
///
/// # Invariants
/// - `refs.len()` never exceeds the request's effective page size.
/// - `next_tx_hash` is set iff candidates remain past the window, and then
///   equals the hash of the last ref in the window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxRefPage {
    /// Candidate refs inside the window, in canonical order.
    pub refs: Vec<TxRef>,
    /// Cursor for the next page, absent when exhausted.
    pub next_tx_hash: Option<TxHash>,
    /// Total size of the candidate set.
    pub total: u64,
}

/// Resolves a page request against an ordered candidate set.
///
/// # Errors
///
/// Returns [`PaginationError::InvalidCursor`] when the request carries a
/// cursor hash that is not present in `candidates`, regardless of whether
/// the candidate set is empty.
pub fn paginate_transactions(
    candidates: &[TxRef],
    page: &TxPageRequest,
) -> Result<TxRefPage, PaginationError> {
    let total = u64::try_from(candidates.len()).unwrap_or(u64::MAX);
    let start = match &page.first_tx_hash {
        None => 0,
        Some(cursor) => {
            let position = candidates
                .iter()
                .position(|candidate| candidate.hash == *cursor)
                .ok_or_else(|| PaginationError::InvalidCursor(cursor.to_string()))?;
            position + 1
        }
    };
    let size = usize::try_from(page.effective_page_size()).unwrap_or(usize::MAX);
    let end = start.saturating_add(size).min(candidates.len());
    let refs: Vec<TxRef> = candidates.get(start..end).unwrap_or_default().to_vec();
    let next_tx_hash = if end < candidates.len() {
        refs.last().map(|last| last.hash.clone())
    } else {
        None
    };
    Ok(TxRefPage {
        refs,
        next_tx_hash,
        total,
    })
}

// ============================================================================
// SECTION: Asset Pages
// ============================================================================

/// Resolved window over an account's asset balances.
///
/// # Invariants
/// - `assets.len()` never exceeds the request's effective page size.
/// - `next_asset_id` is set iff assets remain past the window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPage {
    /// Balances inside the window, ordered by asset identifier.
    pub assets: Vec<AccountAsset>,
    /// Cursor for the next page, absent when exhausted.
    pub next_asset_id: Option<AssetId>,
    /// Total number of assets held by the account.
    pub total: u64,
}

/// Resolves an asset page request against an ordered balance list.
///
/// # Errors
///
/// Returns [`PaginationError::InvalidCursor`] when the request carries a
/// starting asset id that the account does not hold.
pub fn paginate_assets(
    balances: &[AccountAsset],
    page: &AssetPageRequest,
) -> Result<AssetPage, PaginationError> {
    let total = u64::try_from(balances.len()).unwrap_or(u64::MAX);
    let start = match &page.first_asset_id {
        None => 0,
        Some(cursor) => {
            let position = balances
                .iter()
                .position(|balance| balance.asset_id == *cursor)
                .ok_or_else(|| PaginationError::InvalidCursor(cursor.to_string()))?;
            position + 1
        }
    };
    let size = usize::try_from(page.effective_page_size()).unwrap_or(usize::MAX);
    let end = start.saturating_add(size).min(balances.len());
    let assets: Vec<AccountAsset> = balances.get(start..end).unwrap_or_default().to_vec();
    let next_asset_id = if end < balances.len() {
        assets.last().map(|last| last.asset_id.clone())
    } else {
        None
    };
    Ok(AssetPage {
        assets,
        next_asset_id,
        total,
    })
}

// ============================================================================
// SECTION: Body Hydration
// ============================================================================

/// Hydrates transaction bodies for a page of candidate refs.
///
/// Blocks are fetched at most once per height within a call; the index holds
/// only positions, so every body read goes through the block store.
///
/// # Errors
///
/// Returns [`HydrationError`] when the store fails or a ref points at a
/// height or position the store does not have.
pub fn hydrate_transactions(
    store: &dyn BlockStore,
    refs: &[TxRef],
) -> Result<Vec<Transaction>, HydrationError> {
    let mut cache: BTreeMap<BlockHeight, Block> = BTreeMap::new();
    let mut transactions = Vec::with_capacity(refs.len());
    for tx_ref in refs {
        let height = tx_ref.location.height;
        if !cache.contains_key(&height) {
            let block = store
                .block(height)?
                .ok_or(HydrationError::MissingBlock(height))?;
            cache.insert(height, block);
        }
        let block = cache
            .get(&height)
            .ok_or(HydrationError::MissingBlock(height))?;
        let index = usize::try_from(tx_ref.location.index).unwrap_or(usize::MAX);
        let transaction =
            block
                .transactions
                .get(index)
                .ok_or(HydrationError::MissingTransaction {
                    height,
                    index: tx_ref.location.index,
                })?;
        transactions.push(transaction.clone());
    }
    Ok(transactions)
}
