// crates/ledger-query-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Ledger Stores
// Description: Durable StateIndex and BlockStore backed by SQLite WAL.
// Purpose: Persist ledger state rows and canonical block bodies for the query engine.
// Dependencies: bigdecimal, ledger-query-core, rusqlite, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! This module implements the query engine's storage interfaces over
//! `SQLite`. The relational index keeps entity rows and lightweight
//! transaction positions; the block store keeps canonical JSON block bodies
//! in an append-only height-keyed table. Block loads verify integrity via
//! stored hashes and fail closed on corruption.
//!
//! Security posture: database contents are untrusted; every row is decoded
//! and validated before it crosses into the core types.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Mutex;

use bigdecimal::BigDecimal;
use ledger_query_core::Account;
use ledger_query_core::AccountAsset;
use ledger_query_core::AccountId;
use ledger_query_core::AssetDefinition;
use ledger_query_core::AssetId;
use ledger_query_core::Block;
use ledger_query_core::BlockHeight;
use ledger_query_core::DomainId;
use ledger_query_core::Peer;
use ledger_query_core::PeerAddress;
use ledger_query_core::Permission;
use ledger_query_core::PublicKey;
use ledger_query_core::Role;
use ledger_query_core::RoleId;
use ledger_query_core::Signatory;
use ledger_query_core::TxHash;
use ledger_query_core::TxLocation;
use ledger_query_core::TxRef;
use ledger_query_core::hashing::DEFAULT_HASH_ALGORITHM;
use ledger_query_core::hashing::canonical_json_bytes;
use ledger_query_core::hashing::hash_bytes;
use ledger_query_core::interfaces::BlockStore;
use ledger_query_core::interfaces::BlockStoreError;
use ledger_query_core::interfaces::IndexError;
use ledger_query_core::interfaces::StateIndex;
use ledger_query_core::interfaces::TxScope;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::params;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the relational index.
const INDEX_SCHEMA_VERSION: i64 = 1;
/// `SQLite` schema version for the block store.
const BLOCK_SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteJournalMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteJournalMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration shared by the `SQLite`-backed stores.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `busy_timeout_ms` is interpreted as milliseconds.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteJournalMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteStoreConfig {
    /// Creates a config with default pragmas for the given path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteJournalMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Returns the default busy timeout in milliseconds.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
///
/// # Invariants
/// - Error messages avoid embedding row payloads.
#[derive(Debug, Error, Clone)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Store corruption or hash mismatch.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid store data.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
    /// A block is already stored at the height.
    #[error("block already stored at height {0}")]
    Duplicate(BlockHeight),
}

impl From<SqliteStoreError> for IndexError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) | SqliteStoreError::Db(message) => Self::Io(message),
            SqliteStoreError::Corrupt(message)
            | SqliteStoreError::VersionMismatch(message)
            | SqliteStoreError::Invalid(message) => Self::Malformed(message),
            SqliteStoreError::Duplicate(height) => {
                Self::Malformed(format!("duplicate block height {height}"))
            }
        }
    }
}

impl From<SqliteStoreError> for BlockStoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) | SqliteStoreError::Db(message) => Self::Io(message),
            SqliteStoreError::Corrupt(message)
            | SqliteStoreError::VersionMismatch(message)
            | SqliteStoreError::Invalid(message) => Self::Corrupt(message),
            SqliteStoreError::Duplicate(height) => Self::Duplicate(height),
        }
    }
}

// ============================================================================
// SECTION: Relational Index Store
// ============================================================================

/// `SQLite`-backed relational index of ledger state.
///
/// # Invariants
/// - Connection access is serialized through a mutex, so a scan plus a
///   fallback check within one engine call observe one consistent snapshot.
/// - Transaction positions are unique per `(height, tx_index)`.
pub struct SqliteStateIndex {
    /// Shared connection guarded by a mutex.
    connection: Mutex<Connection>,
}

impl SqliteStateIndex {
    /// Opens an `SQLite`-backed relational index.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// initialized.
    pub fn new(config: &SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(config)?;
        initialize_index_schema(&mut connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    /// Runs a closure over the locked connection.
    fn with_connection<T>(
        &self,
        op: impl FnOnce(&mut Connection) -> Result<T, SqliteStoreError>,
    ) -> Result<T, SqliteStoreError> {
        let mut guard = self
            .connection
            .lock()
            .map_err(|_| SqliteStoreError::Io("index mutex poisoned".to_string()))?;
        op(&mut guard)
    }

    /// Inserts or replaces an account snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when serialization or the write fails.
    pub fn put_account(&self, account: &Account) -> Result<(), SqliteStoreError> {
        let detail_json = serde_json::to_string(&account.detail)
            .map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
        self.with_connection(|connection| {
            connection
                .execute(
                    "INSERT OR REPLACE INTO accounts (account_id, domain_id, quorum, detail_json)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![
                        account.account_id.as_str(),
                        account.domain_id.as_str(),
                        i64::from(account.quorum),
                        detail_json
                    ],
                )
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            Ok(())
        })
    }

    /// Inserts or replaces a role definition with its permission set.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the write fails.
    pub fn define_role(&self, role: &Role) -> Result<(), SqliteStoreError> {
        self.with_connection(|connection| {
            let tx = connection
                .transaction()
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            tx.execute(
                "INSERT OR REPLACE INTO roles (role_id) VALUES (?1)",
                params![role.role_id.as_str()],
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            tx.execute(
                "DELETE FROM role_permissions WHERE role_id = ?1",
                params![role.role_id.as_str()],
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            for permission in &role.permissions {
                tx.execute(
                    "INSERT INTO role_permissions (role_id, permission) VALUES (?1, ?2)",
                    params![role.role_id.as_str(), permission.label()],
                )
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            }
            tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))
        })
    }

    /// Grants a role to an account.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the write fails.
    pub fn grant_role(
        &self,
        account_id: &AccountId,
        role_id: &RoleId,
    ) -> Result<(), SqliteStoreError> {
        self.with_connection(|connection| {
            connection
                .execute(
                    "INSERT OR REPLACE INTO account_roles (account_id, role_id) VALUES (?1, ?2)",
                    params![account_id.as_str(), role_id.as_str()],
                )
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            Ok(())
        })
    }

    /// Adds a signatory key to an account.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the write fails.
    pub fn put_signatory(
        &self,
        account_id: &AccountId,
        signatory: &Signatory,
    ) -> Result<(), SqliteStoreError> {
        self.with_connection(|connection| {
            connection
                .execute(
                    "INSERT OR REPLACE INTO signatories (account_id, public_key) VALUES (?1, ?2)",
                    params![account_id.as_str(), signatory.0.as_str()],
                )
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            Ok(())
        })
    }

    /// Inserts or replaces an asset definition.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the write fails.
    pub fn put_asset_definition(&self, asset: &AssetDefinition) -> Result<(), SqliteStoreError> {
        self.with_connection(|connection| {
            connection
                .execute(
                    "INSERT OR REPLACE INTO asset_definitions (asset_id, domain_id, precision)
                     VALUES (?1, ?2, ?3)",
                    params![
                        asset.asset_id.as_str(),
                        asset.domain_id.as_str(),
                        i64::from(asset.precision)
                    ],
                )
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            Ok(())
        })
    }

    /// Inserts or replaces an account's balance in one asset.
    ///
    /// Balances are stored as decimal strings to preserve precision.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the write fails.
    pub fn put_account_asset(&self, balance: &AccountAsset) -> Result<(), SqliteStoreError> {
        self.with_connection(|connection| {
            connection
                .execute(
                    "INSERT OR REPLACE INTO account_assets (account_id, asset_id, balance)
                     VALUES (?1, ?2, ?3)",
                    params![
                        balance.account_id.as_str(),
                        balance.asset_id.as_str(),
                        balance.balance.to_string()
                    ],
                )
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            Ok(())
        })
    }

    /// Adds a peer keyed by its public key.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the write fails.
    pub fn put_peer(&self, peer: &Peer) -> Result<(), SqliteStoreError> {
        self.with_connection(|connection| {
            connection
                .execute(
                    "INSERT OR REPLACE INTO peers (public_key, address) VALUES (?1, ?2)",
                    params![peer.public_key.as_str(), peer.address.as_str()],
                )
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            Ok(())
        })
    }

    /// Indexes a committed transaction with the entities it involves.
    ///
    /// The creator is always recorded as involved.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the write fails or the height
    /// exceeds the storage range.
    pub fn index_transaction(
        &self,
        tx_ref: &TxRef,
        involved_accounts: impl IntoIterator<Item = AccountId>,
        involved_assets: impl IntoIterator<Item = AssetId>,
    ) -> Result<(), SqliteStoreError> {
        let height = height_to_row(tx_ref.location.height)?;
        let mut accounts: Vec<AccountId> = involved_accounts.into_iter().collect();
        accounts.push(tx_ref.creator_id.clone());
        let assets: Vec<AssetId> = involved_assets.into_iter().collect();
        self.with_connection(|connection| {
            let tx = connection
                .transaction()
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            tx.execute(
                "INSERT OR REPLACE INTO tx_positions (hash, creator_id, height, tx_index)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    tx_ref.hash.as_str(),
                    tx_ref.creator_id.as_str(),
                    height,
                    i64::from(tx_ref.location.index)
                ],
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            for account_id in &accounts {
                tx.execute(
                    "INSERT OR REPLACE INTO tx_involved_accounts (hash, account_id)
                     VALUES (?1, ?2)",
                    params![tx_ref.hash.as_str(), account_id.as_str()],
                )
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            }
            for asset_id in &assets {
                tx.execute(
                    "INSERT OR REPLACE INTO tx_involved_assets (hash, asset_id) VALUES (?1, ?2)",
                    params![tx_ref.hash.as_str(), asset_id.as_str()],
                )
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            }
            tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))
        })
    }

    /// Runs a transaction-position query and decodes the rows.
    fn query_tx_refs(
        &self,
        sql: &str,
        bind: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<TxRef>, SqliteStoreError> {
        self.with_connection(|connection| {
            let mut statement =
                connection.prepare(sql).map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            let rows = statement
                .query_map(bind, |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, i64>(3)?,
                    ))
                })
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            let mut refs = Vec::new();
            for row in rows {
                let (hash, creator_id, height, index) =
                    row.map_err(|err| SqliteStoreError::Db(err.to_string()))?;
                refs.push(TxRef {
                    hash: TxHash::new(hash),
                    creator_id: AccountId::new(creator_id),
                    location: TxLocation {
                        height: height_from_row(height)?,
                        index: index_from_row(index)?,
                    },
                });
            }
            Ok(refs)
        })
    }
}

impl StateIndex for SqliteStateIndex {
    fn account(&self, account_id: &AccountId) -> Result<Option<Account>, IndexError> {
        let row = self.with_connection(|connection| {
            connection
                .query_row(
                    "SELECT domain_id, quorum, detail_json FROM accounts WHERE account_id = ?1",
                    params![account_id.as_str()],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, i64>(1)?,
                            row.get::<_, String>(2)?,
                        ))
                    },
                )
                .optional()
                .map_err(|err| SqliteStoreError::Db(err.to_string()))
        })?;
        let Some((domain_id, quorum, detail_json)) = row else {
            return Ok(None);
        };
        let quorum = u32::try_from(quorum)
            .map_err(|_| IndexError::Malformed("account quorum out of range".to_string()))?;
        let detail = serde_json::from_str(&detail_json)
            .map_err(|err| IndexError::Malformed(format!("account detail: {err}")))?;
        Ok(Some(Account {
            account_id: account_id.clone(),
            domain_id: DomainId::new(domain_id),
            quorum,
            detail,
        }))
    }

    fn asset_definition(&self, asset_id: &AssetId) -> Result<Option<AssetDefinition>, IndexError> {
        let row = self.with_connection(|connection| {
            connection
                .query_row(
                    "SELECT domain_id, precision FROM asset_definitions WHERE asset_id = ?1",
                    params![asset_id.as_str()],
                    |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
                )
                .optional()
                .map_err(|err| SqliteStoreError::Db(err.to_string()))
        })?;
        let Some((domain_id, precision)) = row else {
            return Ok(None);
        };
        let precision = u32::try_from(precision)
            .map_err(|_| IndexError::Malformed("asset precision out of range".to_string()))?;
        Ok(Some(AssetDefinition {
            asset_id: asset_id.clone(),
            domain_id: DomainId::new(domain_id),
            precision,
        }))
    }

    fn roles_of(&self, account_id: &AccountId) -> Result<Vec<RoleId>, IndexError> {
        let ids = self.with_connection(|connection| {
            let mut statement = connection
                .prepare(
                    "SELECT role_id FROM account_roles WHERE account_id = ?1 ORDER BY role_id",
                )
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            let rows = statement
                .query_map(params![account_id.as_str()], |row| row.get::<_, String>(0))
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            let mut ids = Vec::new();
            for row in rows {
                ids.push(RoleId::new(
                    row.map_err(|err| SqliteStoreError::Db(err.to_string()))?,
                ));
            }
            Ok(ids)
        })?;
        Ok(ids)
    }

    fn role(&self, role_id: &RoleId) -> Result<Option<Role>, IndexError> {
        let labels = self.with_connection(|connection| {
            let known: Option<String> = connection
                .query_row(
                    "SELECT role_id FROM roles WHERE role_id = ?1",
                    params![role_id.as_str()],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            if known.is_none() {
                return Ok(None);
            }
            let mut statement = connection
                .prepare(
                    "SELECT permission FROM role_permissions WHERE role_id = ?1 ORDER BY permission",
                )
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            let rows = statement
                .query_map(params![role_id.as_str()], |row| row.get::<_, String>(0))
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            let mut labels = Vec::new();
            for row in rows {
                labels.push(row.map_err(|err| SqliteStoreError::Db(err.to_string()))?);
            }
            Ok(Some(labels))
        })?;
        let Some(labels) = labels else {
            return Ok(None);
        };
        let mut permissions = Vec::with_capacity(labels.len());
        for label in labels {
            let permission = Permission::from_label(&label).ok_or_else(|| {
                IndexError::Malformed(format!("unknown permission label: {label}"))
            })?;
            permissions.push(permission);
        }
        Ok(Some(Role::new(role_id.clone(), permissions)))
    }

    fn all_roles(&self) -> Result<Vec<RoleId>, IndexError> {
        let ids = self.with_connection(|connection| {
            let mut statement = connection
                .prepare("SELECT role_id FROM roles ORDER BY role_id")
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            let rows = statement
                .query_map(params![], |row| row.get::<_, String>(0))
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            let mut ids = Vec::new();
            for row in rows {
                ids.push(RoleId::new(
                    row.map_err(|err| SqliteStoreError::Db(err.to_string()))?,
                ));
            }
            Ok(ids)
        })?;
        Ok(ids)
    }

    fn signatories_of(&self, account_id: &AccountId) -> Result<Vec<Signatory>, IndexError> {
        let keys = self.with_connection(|connection| {
            let mut statement = connection
                .prepare(
                    "SELECT public_key FROM signatories WHERE account_id = ?1 ORDER BY public_key",
                )
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            let rows = statement
                .query_map(params![account_id.as_str()], |row| row.get::<_, String>(0))
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            let mut keys = Vec::new();
            for row in rows {
                keys.push(Signatory(PublicKey::new(
                    row.map_err(|err| SqliteStoreError::Db(err.to_string()))?,
                )));
            }
            Ok(keys)
        })?;
        Ok(keys)
    }

    fn account_assets(&self, account_id: &AccountId) -> Result<Vec<AccountAsset>, IndexError> {
        let rows = self.with_connection(|connection| {
            let mut statement = connection
                .prepare(
                    "SELECT asset_id, balance FROM account_assets WHERE account_id = ?1
                     ORDER BY asset_id",
                )
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            let rows = statement
                .query_map(params![account_id.as_str()], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            let mut decoded = Vec::new();
            for row in rows {
                decoded.push(row.map_err(|err| SqliteStoreError::Db(err.to_string()))?);
            }
            Ok(decoded)
        })?;
        let mut assets = Vec::with_capacity(rows.len());
        for (asset_id, balance) in rows {
            let balance = BigDecimal::from_str(&balance)
                .map_err(|err| IndexError::Malformed(format!("balance: {err}")))?;
            assets.push(AccountAsset {
                account_id: account_id.clone(),
                asset_id: AssetId::new(asset_id),
                balance,
            });
        }
        Ok(assets)
    }

    fn peers(&self) -> Result<Vec<Peer>, IndexError> {
        let peers = self.with_connection(|connection| {
            let mut statement = connection
                .prepare("SELECT address, public_key FROM peers ORDER BY public_key")
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            let rows = statement
                .query_map(params![], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            let mut peers = Vec::new();
            for row in rows {
                let (address, public_key) =
                    row.map_err(|err| SqliteStoreError::Db(err.to_string()))?;
                peers.push(Peer {
                    address: PeerAddress::new(address),
                    public_key: PublicKey::new(public_key),
                });
            }
            Ok(peers)
        })?;
        Ok(peers)
    }

    fn related_transactions(&self, scope: &TxScope) -> Result<Vec<TxRef>, IndexError> {
        let refs = match scope {
            TxScope::Account(account_id) => self.query_tx_refs(
                "SELECT p.hash, p.creator_id, p.height, p.tx_index
                 FROM tx_positions p
                 JOIN tx_involved_accounts a ON a.hash = p.hash
                 WHERE a.account_id = ?1
                 ORDER BY p.height, p.tx_index",
                &[&account_id.as_str()],
            )?,
            TxScope::AccountAsset(account_id, asset_id) => self.query_tx_refs(
                "SELECT p.hash, p.creator_id, p.height, p.tx_index
                 FROM tx_positions p
                 JOIN tx_involved_accounts a ON a.hash = p.hash
                 JOIN tx_involved_assets s ON s.hash = p.hash
                 WHERE a.account_id = ?1 AND s.asset_id = ?2
                 ORDER BY p.height, p.tx_index",
                &[&account_id.as_str(), &asset_id.as_str()],
            )?,
            TxScope::Creator(account_id) => self.query_tx_refs(
                "SELECT hash, creator_id, height, tx_index
                 FROM tx_positions
                 WHERE creator_id = ?1
                 ORDER BY height, tx_index",
                &[&account_id.as_str()],
            )?,
            TxScope::All => self.query_tx_refs(
                "SELECT hash, creator_id, height, tx_index
                 FROM tx_positions
                 ORDER BY height, tx_index",
                &[],
            )?,
        };
        Ok(refs)
    }
}

// ============================================================================
// SECTION: Block Store
// ============================================================================

/// `SQLite`-backed append-only block store addressed by height.
///
/// # Invariants
/// - Block bodies are stored as canonical JSON with their hash; loads
///   re-verify the hash before deserialization and fail closed.
/// - Heights are unique; a second write at a height is rejected.
pub struct SqliteBlockStore {
    /// Shared connection guarded by a mutex.
    connection: Mutex<Connection>,
}

impl SqliteBlockStore {
    /// Opens an `SQLite`-backed block store.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// initialized.
    pub fn new(config: &SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(config)?;
        initialize_block_schema(&mut connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    /// Runs a closure over the locked connection.
    fn with_connection<T>(
        &self,
        op: impl FnOnce(&mut Connection) -> Result<T, SqliteStoreError>,
    ) -> Result<T, SqliteStoreError> {
        let mut guard = self
            .connection
            .lock()
            .map_err(|_| SqliteStoreError::Io("block store mutex poisoned".to_string()))?;
        op(&mut guard)
    }

    /// Appends a block at its height.
    ///
    /// The canonical JSON body is hashed on write; the hash is re-verified
    /// on every load.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::Duplicate`] when the height is already
    /// occupied, or another [`SqliteStoreError`] when serialization or the
    /// write fails.
    pub fn put_block(&self, block: &Block) -> Result<(), SqliteStoreError> {
        let height = height_to_row(block.height)?;
        let body_json = canonical_json_bytes(block)
            .map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
        let body_hash = hash_bytes(DEFAULT_HASH_ALGORITHM, &body_json);
        self.with_connection(|connection| {
            let tx = connection
                .transaction()
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            let occupied: Option<i64> = tx
                .query_row(
                    "SELECT height FROM blocks WHERE height = ?1",
                    params![height],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            if occupied.is_some() {
                return Err(SqliteStoreError::Duplicate(block.height));
            }
            tx.execute(
                "INSERT INTO blocks (height, body_json, body_hash, hash_algorithm)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    height,
                    body_json,
                    body_hash.as_str(),
                    DEFAULT_HASH_ALGORITHM.label()
                ],
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))
        })
    }

    /// Loads and verifies the stored block row at a height.
    fn load_block(&self, height: BlockHeight) -> Result<Option<Block>, SqliteStoreError> {
        let row = self.with_connection(|connection| {
            connection
                .query_row(
                    "SELECT body_json, body_hash, hash_algorithm FROM blocks WHERE height = ?1",
                    params![height_to_row(height)?],
                    |row| {
                        Ok((
                            row.get::<_, Vec<u8>>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                        ))
                    },
                )
                .optional()
                .map_err(|err| SqliteStoreError::Db(err.to_string()))
        })?;
        let Some((body_json, body_hash, hash_algorithm)) = row else {
            return Ok(None);
        };
        if hash_algorithm != DEFAULT_HASH_ALGORITHM.label() {
            return Err(SqliteStoreError::Corrupt(format!(
                "unsupported hash algorithm: {hash_algorithm}"
            )));
        }
        let recomputed = hash_bytes(DEFAULT_HASH_ALGORITHM, &body_json);
        if recomputed.as_str() != body_hash {
            return Err(SqliteStoreError::Corrupt(format!(
                "block body hash mismatch at height {height}"
            )));
        }
        let block: Block = serde_json::from_slice(&body_json)
            .map_err(|err| SqliteStoreError::Corrupt(format!("block body: {err}")))?;
        if block.height != height {
            return Err(SqliteStoreError::Corrupt(format!(
                "stored block height {} does not match row height {height}",
                block.height
            )));
        }
        Ok(Some(block))
    }
}

impl BlockStore for SqliteBlockStore {
    fn block(&self, height: BlockHeight) -> Result<Option<Block>, BlockStoreError> {
        Ok(self.load_block(height)?)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    if path.as_os_str().is_empty() {
        return Err(SqliteStoreError::Invalid("store path must not be empty".to_string()));
    }
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.exists() && path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with secure defaults.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags)
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies `SQLite` pragmas required for durability.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection
        .execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}

/// Initializes the relational-index schema or validates existing version.
fn initialize_index_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS index_meta (version INTEGER NOT NULL);")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM index_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    match version {
        None => {
            tx.execute(
                "INSERT INTO index_meta (version) VALUES (?1)",
                params![INDEX_SCHEMA_VERSION],
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS accounts (
                    account_id TEXT PRIMARY KEY,
                    domain_id TEXT NOT NULL,
                    quorum INTEGER NOT NULL,
                    detail_json TEXT NOT NULL
                );
                CREATE TABLE IF NOT EXISTS roles (
                    role_id TEXT PRIMARY KEY
                );
                CREATE TABLE IF NOT EXISTS role_permissions (
                    role_id TEXT NOT NULL,
                    permission TEXT NOT NULL,
                    PRIMARY KEY (role_id, permission),
                    FOREIGN KEY (role_id) REFERENCES roles(role_id) ON DELETE CASCADE
                );
                CREATE TABLE IF NOT EXISTS account_roles (
                    account_id TEXT NOT NULL,
                    role_id TEXT NOT NULL,
                    PRIMARY KEY (account_id, role_id)
                );
                CREATE TABLE IF NOT EXISTS signatories (
                    account_id TEXT NOT NULL,
                    public_key TEXT NOT NULL,
                    PRIMARY KEY (account_id, public_key)
                );
                CREATE TABLE IF NOT EXISTS asset_definitions (
                    asset_id TEXT PRIMARY KEY,
                    domain_id TEXT NOT NULL,
                    precision INTEGER NOT NULL
                );
                CREATE TABLE IF NOT EXISTS account_assets (
                    account_id TEXT NOT NULL,
                    asset_id TEXT NOT NULL,
                    balance TEXT NOT NULL,
                    PRIMARY KEY (account_id, asset_id)
                );
                CREATE TABLE IF NOT EXISTS peers (
                    public_key TEXT PRIMARY KEY,
                    address TEXT NOT NULL
                );
                CREATE TABLE IF NOT EXISTS tx_positions (
                    hash TEXT PRIMARY KEY,
                    creator_id TEXT NOT NULL,
                    height INTEGER NOT NULL,
                    tx_index INTEGER NOT NULL,
                    UNIQUE (height, tx_index)
                );
                CREATE TABLE IF NOT EXISTS tx_involved_accounts (
                    hash TEXT NOT NULL,
                    account_id TEXT NOT NULL,
                    PRIMARY KEY (hash, account_id),
                    FOREIGN KEY (hash) REFERENCES tx_positions(hash) ON DELETE CASCADE
                );
                CREATE TABLE IF NOT EXISTS tx_involved_assets (
                    hash TEXT NOT NULL,
                    asset_id TEXT NOT NULL,
                    PRIMARY KEY (hash, asset_id),
                    FOREIGN KEY (hash) REFERENCES tx_positions(hash) ON DELETE CASCADE
                );
                CREATE INDEX IF NOT EXISTS idx_tx_positions_order
                    ON tx_positions (height, tx_index);
                CREATE INDEX IF NOT EXISTS idx_tx_positions_creator
                    ON tx_positions (creator_id, height, tx_index);",
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        }
        Some(value) if value == INDEX_SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "unsupported index schema version: {value}"
            )));
        }
    }
    tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}

/// Initializes the block-store schema or validates existing version.
fn initialize_block_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS block_meta (version INTEGER NOT NULL);")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM block_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    match version {
        None => {
            tx.execute(
                "INSERT INTO block_meta (version) VALUES (?1)",
                params![BLOCK_SCHEMA_VERSION],
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS blocks (
                    height INTEGER PRIMARY KEY,
                    body_json BLOB NOT NULL,
                    body_hash TEXT NOT NULL,
                    hash_algorithm TEXT NOT NULL
                );",
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        }
        Some(value) if value == BLOCK_SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "unsupported block schema version: {value}"
            )));
        }
    }
    tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}

/// Converts a block height into its row representation.
fn height_to_row(height: BlockHeight) -> Result<i64, SqliteStoreError> {
    i64::try_from(height.get())
        .map_err(|_| SqliteStoreError::Invalid("block height exceeds storage range".to_string()))
}

/// Converts a stored row height back into a block height.
fn height_from_row(row: i64) -> Result<BlockHeight, SqliteStoreError> {
    let raw = u64::try_from(row)
        .map_err(|_| SqliteStoreError::Corrupt("negative block height".to_string()))?;
    BlockHeight::from_raw(raw)
        .ok_or_else(|| SqliteStoreError::Corrupt("zero block height".to_string()))
}

/// Converts a stored intra-block index back into its typed form.
fn index_from_row(row: i64) -> Result<u32, SqliteStoreError> {
    u32::try_from(row)
        .map_err(|_| SqliteStoreError::Corrupt("transaction index out of range".to_string()))
}
