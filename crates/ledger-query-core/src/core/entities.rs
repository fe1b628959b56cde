// crates/ledger-query-core/src/core/entities.rs
// ============================================================================
// Module: Ledger Query Entities
// Description: Read-only snapshots of ledger state returned by query handlers.
// Purpose: Capture the entity shapes retrieved from the relational index and block store.
// Dependencies: crate::core::{hashing, identifiers, time}, bigdecimal, serde, serde_json
// ============================================================================

//! ## Overview
//! Entities are transient snapshots assembled for a single query response.
//! The engine never mutates ledger state; every type here is constructed
//! from index rows or block payloads and handed to the caller.
//!
//! The relational index holds only lightweight transaction metadata
//! ([`TxLocation`]); full transaction bodies live exclusively in the block
//! store and are hydrated by height on demand.

// ============================================================================
// SECTION: Imports
// ============================================================================

use bigdecimal::BigDecimal;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::hashing::HashDigest;
use crate::core::hashing::TxHash;
use crate::core::identifiers::AccountId;
use crate::core::identifiers::AssetId;
use crate::core::identifiers::BlockHeight;
use crate::core::identifiers::DomainId;
use crate::core::identifiers::PeerAddress;
use crate::core::identifiers::PublicKey;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Account State
// ============================================================================

/// Account snapshot from the relational index.
///
/// # Invariants
/// - `detail` is a JSON object keyed by writer account, then detail key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account identifier.
    pub account_id: AccountId,
    /// Domain the account belongs to.
    pub domain_id: DomainId,
    /// Signature quorum required for the account's transactions.
    pub quorum: u32,
    /// Key/value detail attached to the account, keyed by writer.
    pub detail: Value,
}

/// Signatory public key attached to an account.
///
/// # Invariants
/// - Keys are opaque; uniqueness per account is an index responsibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signatory(pub PublicKey);

// ============================================================================
// SECTION: Assets
// ============================================================================

/// Asset definition snapshot.
///
/// # Invariants
/// - `precision` bounds the fractional digits of balances in this asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetDefinition {
    /// Asset identifier.
    pub asset_id: AssetId,
    /// Domain the asset belongs to.
    pub domain_id: DomainId,
    /// Number of fractional digits allowed in balances.
    pub precision: u32,
}

/// Asset balance held by an account.
///
/// # Invariants
/// - `balance` is non-negative; enforcement happens at command execution,
///   not in this read path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountAsset {
    /// Owning account identifier.
    pub account_id: AccountId,
    /// Asset identifier.
    pub asset_id: AssetId,
    /// Current balance.
    pub balance: BigDecimal,
}

// ============================================================================
// SECTION: Peers
// ============================================================================

/// Peer participating in the network.
///
/// # Invariants
/// - `public_key` uniquely identifies the peer across address changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
    /// Network address of the peer.
    pub address: PeerAddress,
    /// Public key of the peer.
    pub public_key: PublicKey,
}

// ============================================================================
// SECTION: Transactions
// ============================================================================

/// Committed or pending transaction snapshot.
///
/// # Invariants
/// - `hash` identifies the transaction body; equal hashes mean equal bodies.
/// - `location` is present only for committed transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction hash.
    pub hash: TxHash,
    /// Account that created the transaction.
    pub creator_id: AccountId,
    /// Commit location, absent for pending transactions.
    pub location: Option<TxLocation>,
    /// Opaque transaction payload (commands), not interpreted by the engine.
    pub payload: Value,
}

/// Position of a committed transaction in the chain.
///
/// # Invariants
/// - `(height, index)` is unique across the ledger; ordering by height then
///   index is the canonical transaction order ("later is newer").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TxLocation {
    /// Height of the containing block.
    pub height: BlockHeight,
    /// Zero-based position within the block.
    pub index: u32,
}

/// Lightweight transaction metadata held by the relational index.
///
/// # Invariants
/// - The index never stores transaction bodies; `location` is the pointer
///   used to hydrate the body from the block store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxRef {
    /// Transaction hash.
    pub hash: TxHash,
    /// Account that created the transaction.
    pub creator_id: AccountId,
    /// Commit location.
    pub location: TxLocation,
}

// ============================================================================
// SECTION: Blocks
// ============================================================================

/// Committed block snapshot from the block store.
///
/// # Invariants
/// - Immutable once written; `hash` covers the canonical block body.
/// - `transactions` are ordered by their intra-block index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Block height.
    pub height: BlockHeight,
    /// Hash of the canonical block body.
    pub hash: HashDigest,
    /// Hash of the previous block, absent for the genesis block.
    pub prev_hash: Option<HashDigest>,
    /// Commit timestamp assigned by block production.
    pub created_at: Timestamp,
    /// Transactions committed in this block, in index order.
    pub transactions: Vec<Transaction>,
}
