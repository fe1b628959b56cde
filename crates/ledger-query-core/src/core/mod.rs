// crates/ledger-query-core/src/core/mod.rs
// ============================================================================
// Module: Ledger Query Core Model
// Description: Data model shared by the engine and its collaborators.
// Purpose: Group identifiers, entities, permissions, queries, and responses.
// Dependencies: crate submodules
// ============================================================================

//! ## Overview
//! The core model is pure data: identifiers, entity snapshots, the closed
//! query and response unions, the permission set, and hashing primitives.
//! No I/O happens here.

pub mod entities;
pub mod hashing;
pub mod identifiers;
pub mod permissions;
pub mod query;
pub mod response;
pub mod time;
