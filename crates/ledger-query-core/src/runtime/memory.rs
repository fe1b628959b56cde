// crates/ledger-query-core/src/runtime/memory.rs
// ============================================================================
// Module: In-Memory Collaborators
// Description: Reference implementations of the engine's borrowed interfaces.
// Purpose: Back core tests and light embedders without a database.
// Dependencies: crate::core, crate::interfaces, std
// ============================================================================

//! ## Overview
//! These implementations keep ledger state in ordered maps behind mutexes.
//! They honor the same contracts as the durable stores: canonical
//! transaction ordering, append-only blocks, absence as `None`, and
//! snapshot-consistent reads within one call (a single lock acquisition).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Mutex;

use crate::core::entities::Account;
use crate::core::entities::AccountAsset;
use crate::core::entities::AssetDefinition;
use crate::core::entities::Block;
use crate::core::entities::Peer;
use crate::core::entities::Signatory;
use crate::core::entities::Transaction;
use crate::core::entities::TxLocation;
use crate::core::entities::TxRef;
use crate::core::hashing::QueryHash;
use crate::core::identifiers::AccountId;
use crate::core::identifiers::AssetId;
use crate::core::identifiers::BlockHeight;
use crate::core::identifiers::RoleId;
use crate::core::permissions::Role;
use crate::interfaces::BlockStore;
use crate::interfaces::BlockStoreError;
use crate::interfaces::IndexError;
use crate::interfaces::PendingPool;
use crate::interfaces::PendingPoolError;
use crate::interfaces::QueryLogSink;
use crate::interfaces::StateIndex;
use crate::interfaces::TxScope;

// ============================================================================
// SECTION: In-Memory State Index
// ============================================================================

/// Indexed transaction row with the entities it involves.
///
/// # Invariants
/// - `involved_accounts` includes the creator.
#[derive(Debug, Clone)]
struct TxRecord {
    /// Lightweight transaction metadata.
    tx_ref: TxRef,
    /// Accounts the transaction involves (creator or command target).
    involved_accounts: BTreeSet<AccountId>,
    /// Assets the transaction touches.
    involved_assets: BTreeSet<AssetId>,
}

/// Mutable index state guarded by the store mutex.
#[derive(Debug, Default)]
struct IndexData {
    /// Account snapshots by identifier.
    accounts: BTreeMap<AccountId, Account>,
    /// Granted roles by account.
    account_roles: BTreeMap<AccountId, Vec<RoleId>>,
    /// Role definitions by identifier.
    roles: BTreeMap<RoleId, Role>,
    /// Signatory keys by account.
    signatories: BTreeMap<AccountId, Vec<Signatory>>,
    /// Asset definitions by identifier.
    assets: BTreeMap<AssetId, AssetDefinition>,
    /// Asset balances by (account, asset).
    balances: BTreeMap<(AccountId, AssetId), AccountAsset>,
    /// Known peers in insertion order.
    peers: Vec<Peer>,
    /// Indexed transactions in canonical (height, index) order.
    transactions: BTreeMap<TxLocation, TxRecord>,
}

/// In-memory relational index of ledger state.
///
/// # Invariants
/// - All reads within one trait call happen under a single lock, so a scan
///   plus a fallback check observe one consistent snapshot.
#[derive(Debug, Default)]
pub struct InMemoryStateIndex {
    /// Guarded index state.
    inner: Mutex<IndexData>,
}

impl InMemoryStateIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs a closure over the locked index state.
    fn with<T>(&self, read: impl FnOnce(&mut IndexData) -> T) -> Result<T, IndexError> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| IndexError::Io("index mutex poisoned".to_string()))?;
        Ok(read(&mut guard))
    }

    /// Inserts or replaces an account snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError`] when the index lock is poisoned.
    pub fn put_account(&self, account: Account) -> Result<(), IndexError> {
        self.with(|data| {
            data.accounts.insert(account.account_id.clone(), account);
        })
    }

    /// Inserts or replaces a role definition.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError`] when the index lock is poisoned.
    pub fn define_role(&self, role: Role) -> Result<(), IndexError> {
        self.with(|data| {
            data.roles.insert(role.role_id.clone(), role);
        })
    }

    /// Grants a role to an account.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError`] when the index lock is poisoned.
    pub fn grant_role(&self, account_id: AccountId, role_id: RoleId) -> Result<(), IndexError> {
        self.with(|data| {
            data.account_roles.entry(account_id).or_default().push(role_id);
        })
    }

    /// Adds a signatory key to an account.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError`] when the index lock is poisoned.
    pub fn put_signatory(
        &self,
        account_id: AccountId,
        signatory: Signatory,
    ) -> Result<(), IndexError> {
        self.with(|data| {
            data.signatories.entry(account_id).or_default().push(signatory);
        })
    }

    /// Inserts or replaces an asset definition.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError`] when the index lock is poisoned.
    pub fn put_asset_definition(&self, asset: AssetDefinition) -> Result<(), IndexError> {
        self.with(|data| {
            data.assets.insert(asset.asset_id.clone(), asset);
        })
    }

    /// Inserts or replaces an account's balance in one asset.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError`] when the index lock is poisoned.
    pub fn put_account_asset(&self, balance: AccountAsset) -> Result<(), IndexError> {
        self.with(|data| {
            let key = (balance.account_id.clone(), balance.asset_id.clone());
            data.balances.insert(key, balance);
        })
    }

    /// Adds a peer.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError`] when the index lock is poisoned.
    pub fn put_peer(&self, peer: Peer) -> Result<(), IndexError> {
        self.with(|data| {
            data.peers.push(peer);
        })
    }

    /// Indexes a committed transaction with the entities it involves.
    ///
    /// The creator is always recorded as involved.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError`] when the index lock is poisoned.
    pub fn index_transaction(
        &self,
        tx_ref: TxRef,
        involved_accounts: impl IntoIterator<Item = AccountId>,
        involved_assets: impl IntoIterator<Item = AssetId>,
    ) -> Result<(), IndexError> {
        self.with(|data| {
            let mut accounts: BTreeSet<AccountId> = involved_accounts.into_iter().collect();
            accounts.insert(tx_ref.creator_id.clone());
            let record = TxRecord {
                involved_accounts: accounts,
                involved_assets: involved_assets.into_iter().collect(),
                tx_ref,
            };
            data.transactions.insert(record.tx_ref.location, record);
        })
    }
}

impl StateIndex for InMemoryStateIndex {
    fn account(&self, account_id: &AccountId) -> Result<Option<Account>, IndexError> {
        self.with(|data| data.accounts.get(account_id).cloned())
    }

    fn asset_definition(&self, asset_id: &AssetId) -> Result<Option<AssetDefinition>, IndexError> {
        self.with(|data| data.assets.get(asset_id).cloned())
    }

    fn roles_of(&self, account_id: &AccountId) -> Result<Vec<RoleId>, IndexError> {
        self.with(|data| data.account_roles.get(account_id).cloned().unwrap_or_default())
    }

    fn role(&self, role_id: &RoleId) -> Result<Option<Role>, IndexError> {
        self.with(|data| data.roles.get(role_id).cloned())
    }

    fn all_roles(&self) -> Result<Vec<RoleId>, IndexError> {
        self.with(|data| data.roles.keys().cloned().collect())
    }

    fn signatories_of(&self, account_id: &AccountId) -> Result<Vec<Signatory>, IndexError> {
        self.with(|data| data.signatories.get(account_id).cloned().unwrap_or_default())
    }

    fn account_assets(&self, account_id: &AccountId) -> Result<Vec<AccountAsset>, IndexError> {
        self.with(|data| {
            data.balances
                .iter()
                .filter(|((owner, _), _)| owner == account_id)
                .map(|(_, balance)| balance.clone())
                .collect()
        })
    }

    fn peers(&self) -> Result<Vec<Peer>, IndexError> {
        self.with(|data| data.peers.clone())
    }

    fn related_transactions(&self, scope: &TxScope) -> Result<Vec<TxRef>, IndexError> {
        self.with(|data| {
            data.transactions
                .values()
                .filter(|record| match scope {
                    TxScope::Account(account_id) => {
                        record.involved_accounts.contains(account_id)
                    }
                    TxScope::AccountAsset(account_id, asset_id) => {
                        record.involved_accounts.contains(account_id)
                            && record.involved_assets.contains(asset_id)
                    }
                    TxScope::Creator(account_id) => record.tx_ref.creator_id == *account_id,
                    TxScope::All => true,
                })
                .map(|record| record.tx_ref.clone())
                .collect()
        })
    }
}

// ============================================================================
// SECTION: In-Memory Block Store
// ============================================================================

/// In-memory append-only block store addressed by height.
///
/// # Invariants
/// - Heights are unique; a second write at a height is rejected.
#[derive(Debug, Default)]
pub struct InMemoryBlockStore {
    /// Blocks by height.
    blocks: Mutex<BTreeMap<BlockHeight, Block>>,
}

impl InMemoryBlockStore {
    /// Creates an empty block store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a block at its height.
    ///
    /// # Errors
    ///
    /// Returns [`BlockStoreError::Duplicate`] when the height is already
    /// occupied, or an I/O error when the store lock is poisoned.
    pub fn put_block(&self, block: Block) -> Result<(), BlockStoreError> {
        let mut guard = self
            .blocks
            .lock()
            .map_err(|_| BlockStoreError::Io("block store mutex poisoned".to_string()))?;
        if guard.contains_key(&block.height) {
            return Err(BlockStoreError::Duplicate(block.height));
        }
        guard.insert(block.height, block);
        Ok(())
    }
}

impl BlockStore for InMemoryBlockStore {
    fn block(&self, height: BlockHeight) -> Result<Option<Block>, BlockStoreError> {
        let guard = self
            .blocks
            .lock()
            .map_err(|_| BlockStoreError::Io("block store mutex poisoned".to_string()))?;
        Ok(guard.get(&height).cloned())
    }
}

// ============================================================================
// SECTION: In-Memory Pending Pool
// ============================================================================

/// In-memory pool of uncommitted transactions scoped by creator.
#[derive(Debug, Default)]
pub struct InMemoryPendingPool {
    /// Pending transactions by creator, in submission order.
    pending: Mutex<BTreeMap<AccountId, Vec<Transaction>>>,
}

impl InMemoryPendingPool {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a pending transaction under its creator.
    ///
    /// # Errors
    ///
    /// Returns [`PendingPoolError`] when the pool lock is poisoned.
    pub fn add(&self, transaction: Transaction) -> Result<(), PendingPoolError> {
        let mut guard = self
            .pending
            .lock()
            .map_err(|_| PendingPoolError::Pool("pending pool mutex poisoned".to_string()))?;
        guard
            .entry(transaction.creator_id.clone())
            .or_default()
            .push(transaction);
        Ok(())
    }
}

impl PendingPool for InMemoryPendingPool {
    fn pending_for(&self, account_id: &AccountId) -> Result<Vec<Transaction>, PendingPoolError> {
        let guard = self
            .pending
            .lock()
            .map_err(|_| PendingPoolError::Pool("pending pool mutex poisoned".to_string()))?;
        Ok(guard.get(account_id).cloned().unwrap_or_default())
    }
}

// ============================================================================
// SECTION: Log Sinks
// ============================================================================

/// Severity classes recorded by [`MemoryLogSink`].
///
/// # Invariants
/// - Variants are stable for assertions in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSeverity {
    /// Expected rejection: denial, not-found, or invalid pagination.
    Rejection,
    /// Storage failure.
    Failure,
}

/// Captured log event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    /// Severity class of the event.
    pub severity: LogSeverity,
    /// Correlation hash of the query invocation.
    pub correlation: QueryHash,
    /// User-visible message.
    pub message: String,
    /// Underlying cause, present only for storage failures.
    pub cause: Option<String>,
}

/// Log sink capturing events in memory for assertions.
#[derive(Debug, Default)]
pub struct MemoryLogSink {
    /// Captured events in emission order.
    events: Mutex<Vec<LogEvent>>,
}

impl MemoryLogSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the captured events.
    #[must_use]
    pub fn events(&self) -> Vec<LogEvent> {
        self.events.lock().map(|guard| guard.clone()).unwrap_or_default()
    }

    /// Appends an event, ignoring a poisoned lock.
    fn push(&self, event: LogEvent) {
        if let Ok(mut guard) = self.events.lock() {
            guard.push(event);
        }
    }
}

impl QueryLogSink for MemoryLogSink {
    fn denied(&self, correlation: &QueryHash, message: &str) {
        self.push(LogEvent {
            severity: LogSeverity::Rejection,
            correlation: correlation.clone(),
            message: message.to_string(),
            cause: None,
        });
    }

    fn storage_failure(&self, correlation: &QueryHash, message: &str, cause: &str) {
        self.push(LogEvent {
            severity: LogSeverity::Failure,
            correlation: correlation.clone(),
            message: message.to_string(),
            cause: Some(cause.to_string()),
        });
    }
}

/// Log sink that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLogSink;

impl QueryLogSink for NullLogSink {
    fn denied(&self, _correlation: &QueryHash, _message: &str) {}

    fn storage_failure(&self, _correlation: &QueryHash, _message: &str, _cause: &str) {}
}
