// crates/ledger-query-store-sqlite/src/lib.rs
// ============================================================================
// Module: Ledger Query SQLite Store
// Description: Durable StateIndex and BlockStore backed by SQLite.
// Purpose: Persist ledger state and block bodies for the query engine.
// Dependencies: bigdecimal, ledger-query-core, rusqlite, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! `ledger-query-store-sqlite` provides durable implementations of the
//! query engine's storage interfaces: a relational index of ledger state
//! and an append-only block store with hash-verified bodies. Both serialize
//! connection access through a mutex and fail closed on corrupt rows.

pub mod store;

pub use store::SqliteBlockStore;
pub use store::SqliteJournalMode;
pub use store::SqliteStateIndex;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteSyncMode;
