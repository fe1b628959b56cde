// crates/ledger-query-core/src/lib.rs
// ============================================================================
// Module: Ledger Query Core
// Description: Read-query engine for a permissioned distributed ledger.
// Purpose: Permission-checked dispatch of a closed query set over ledger state.
// Dependencies: bigdecimal, serde, serde_jcs, serde_json, sha2, thiserror, time
// ============================================================================

//! ## Overview
//! `ledger-query-core` implements the read path of a permissioned ledger:
//! a stateless [`QueryEngine`](runtime::QueryEngine) dispatches a closed set
//! of query kinds, enforces role-derived permissions per kind (with OWN/ANY
//! account scoping), pages transaction history with exclusive cursors, and
//! returns exactly one typed success or error response per call.
//!
//! Storage is borrowed through the [`interfaces`] traits: a relational
//! [`StateIndex`](interfaces::StateIndex) holding materialized ledger state
//! and lightweight transaction positions, an append-only
//! [`BlockStore`](interfaces::BlockStore) holding full bodies, and a
//! [`PendingPool`](interfaces::PendingPool) of uncommitted transactions.
//! The engine is synchronous and call-scoped; concurrency and pooling of the
//! borrowed sessions belong to the embedder.

pub mod core;
pub mod interfaces;
pub mod runtime;

pub use self::core::entities::Account;
pub use self::core::entities::AccountAsset;
pub use self::core::entities::AssetDefinition;
pub use self::core::entities::Block;
pub use self::core::entities::Peer;
pub use self::core::entities::Signatory;
pub use self::core::entities::Transaction;
pub use self::core::entities::TxLocation;
pub use self::core::entities::TxRef;
pub use self::core::hashing;
pub use self::core::hashing::HashDigest;
pub use self::core::hashing::QueryHash;
pub use self::core::hashing::TxHash;
pub use self::core::identifiers::AccountId;
pub use self::core::identifiers::AssetId;
pub use self::core::identifiers::BlockHeight;
pub use self::core::identifiers::DomainId;
pub use self::core::identifiers::PeerAddress;
pub use self::core::identifiers::PublicKey;
pub use self::core::identifiers::RoleId;
pub use self::core::permissions::Permission;
pub use self::core::permissions::Role;
pub use self::core::query::AssetPageRequest;
pub use self::core::query::MAX_PAGE_SIZE;
pub use self::core::query::Query;
pub use self::core::query::TxPageRequest;
pub use self::core::response::AccountAssetsPayload;
pub use self::core::response::AccountPayload;
pub use self::core::response::ErrorResponse;
pub use self::core::response::QueryErrorType;
pub use self::core::response::QueryResponse;
pub use self::core::response::TransactionsPagePayload;
pub use self::core::time::Timestamp;
