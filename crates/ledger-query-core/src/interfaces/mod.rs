// crates/ledger-query-core/src/interfaces/mod.rs
// ============================================================================
// Module: Ledger Query Interfaces
// Description: Backend-agnostic interfaces for the index, block store, pool, and log sink.
// Purpose: Define the contract surfaces borrowed by the query engine.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! Interfaces define how the query engine reads ledger state without
//! embedding backend-specific details. The engine borrows implementations
//! for the duration of one call and never issues writes through them.
//! Implementations must fail closed on missing or invalid data.
//!
//! Consistency note: the engine may perform several reads per call (for
//! example a transaction scan followed by an existence fallback check).
//! Presenting those reads with snapshot consistency is the implementation's
//! contract; the engine adds no isolation of its own.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::entities::Account;
use crate::core::entities::AccountAsset;
use crate::core::entities::AssetDefinition;
use crate::core::entities::Block;
use crate::core::entities::Peer;
use crate::core::entities::Signatory;
use crate::core::entities::Transaction;
use crate::core::entities::TxRef;
use crate::core::hashing::QueryHash;
use crate::core::identifiers::AccountId;
use crate::core::identifiers::AssetId;
use crate::core::identifiers::BlockHeight;
use crate::core::identifiers::RoleId;
use crate::core::permissions::Role;

// ============================================================================
// SECTION: Relational Index
// ============================================================================

/// Relational index errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - Messages avoid embedding row payloads.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Index I/O error.
    #[error("state index io error: {0}")]
    Io(String),
    /// Index returned a malformed row.
    #[error("state index malformed row: {0}")]
    Malformed(String),
}

/// Candidate transaction scope for history scans.
///
/// # Invariants
/// - Variants are stable; each maps to one relational predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxScope {
    /// Transactions involving the account (as creator or command target).
    Account(AccountId),
    /// Transactions involving the account and touching the asset.
    AccountAsset(AccountId, AssetId),
    /// Transactions created by the account.
    Creator(AccountId),
    /// All committed transactions.
    All,
}

/// Read-only session over the relational index of ledger state.
///
/// Lookups are typed per entity kind; absence is `Ok(None)` (or an empty
/// list), never an error. Scans return lightweight [`TxRef`] metadata in
/// canonical order; bodies are hydrated from the block store.
pub trait StateIndex {
    /// Loads an account snapshot by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError`] when the read fails.
    fn account(&self, account_id: &AccountId) -> Result<Option<Account>, IndexError>;

    /// Returns whether an account exists.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError`] when the read fails.
    fn account_exists(&self, account_id: &AccountId) -> Result<bool, IndexError> {
        Ok(self.account(account_id)?.is_some())
    }

    /// Loads an asset definition by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError`] when the read fails.
    fn asset_definition(&self, asset_id: &AssetId) -> Result<Option<AssetDefinition>, IndexError>;

    /// Returns the roles granted to an account.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError`] when the read fails.
    fn roles_of(&self, account_id: &AccountId) -> Result<Vec<RoleId>, IndexError>;

    /// Loads a role definition with its permission set.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError`] when the read fails.
    fn role(&self, role_id: &RoleId) -> Result<Option<Role>, IndexError>;

    /// Returns all role identifiers known to the ledger.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError`] when the read fails.
    fn all_roles(&self) -> Result<Vec<RoleId>, IndexError>;

    /// Returns the signatories of an account.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError`] when the read fails.
    fn signatories_of(&self, account_id: &AccountId) -> Result<Vec<Signatory>, IndexError>;

    /// Returns the asset balances of an account, ordered by asset id.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError`] when the read fails.
    fn account_assets(&self, account_id: &AccountId) -> Result<Vec<AccountAsset>, IndexError>;

    /// Returns all known peers.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError`] when the read fails.
    fn peers(&self) -> Result<Vec<Peer>, IndexError>;

    /// Returns the candidate transactions for a scope, ordered by block
    /// height ascending then intra-block index ascending.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError`] when the scan fails.
    fn related_transactions(&self, scope: &TxScope) -> Result<Vec<TxRef>, IndexError>;
}

// ============================================================================
// SECTION: Block Store
// ============================================================================

/// Block store errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum BlockStoreError {
    /// Block store I/O error.
    #[error("block store io error: {0}")]
    Io(String),
    /// Stored block fails integrity verification.
    #[error("block store corruption: {0}")]
    Corrupt(String),
    /// A block is already stored at the height (the store is append-only).
    #[error("block already stored at height {0}")]
    Duplicate(BlockHeight),
}

/// Append-only, height-addressed store of committed blocks.
pub trait BlockStore {
    /// Loads the block at the given height; `None` when no such height
    /// exists.
    ///
    /// # Errors
    ///
    /// Returns [`BlockStoreError`] when the read fails or the stored block
    /// is corrupt.
    fn block(&self, height: BlockHeight) -> Result<Option<Block>, BlockStoreError>;
}

// ============================================================================
// SECTION: Pending Pool
// ============================================================================

/// Pending pool errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum PendingPoolError {
    /// Pending pool reported an error.
    #[error("pending pool error: {0}")]
    Pool(String),
}

/// Pool of submitted transactions not yet committed to a block.
pub trait PendingPool {
    /// Returns the pending transactions created by the account.
    ///
    /// # Errors
    ///
    /// Returns [`PendingPoolError`] when the pool read fails.
    fn pending_for(&self, account_id: &AccountId) -> Result<Vec<Transaction>, PendingPoolError>;
}

// ============================================================================
// SECTION: Log Sink
// ============================================================================

/// Structured sink for query denial and failure events.
///
/// Denials and not-found outcomes are expected and frequent; storage
/// failures are not. The split entry points let implementations route the
/// two at different severities. Every event carries the correlation hash of
/// the active query invocation.
pub trait QueryLogSink {
    /// Records an expected low-severity event (denial or not-found).
    fn denied(&self, correlation: &QueryHash, message: &str);

    /// Records a high-severity storage failure with its underlying cause.
    fn storage_failure(&self, correlation: &QueryHash, message: &str, cause: &str);
}
