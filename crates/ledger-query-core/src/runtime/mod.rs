// crates/ledger-query-core/src/runtime/mod.rs
// ============================================================================
// Module: Ledger Query Runtime
// Description: Query engine, execution context, pagination, and reference stores.
// Purpose: Group the executable pieces built on the core model and interfaces.
// Dependencies: crate submodules
// ============================================================================

//! ## Overview
//! The runtime hosts the query engine and the pieces it composes: the
//! explicit execution context, the pagination engine, and in-memory
//! reference implementations of the borrowed interfaces.

pub mod context;
pub mod engine;
pub mod memory;
pub mod pagination;

pub use context::ContextError;
pub use context::ExecutionContext;
pub use context::ExecutionContextBuilder;
pub use engine::QueryEngine;
pub use memory::InMemoryBlockStore;
pub use memory::InMemoryPendingPool;
pub use memory::InMemoryStateIndex;
pub use memory::LogEvent;
pub use memory::LogSeverity;
pub use memory::MemoryLogSink;
pub use memory::NullLogSink;
pub use pagination::AssetPage;
pub use pagination::HydrationError;
pub use pagination::PaginationError;
pub use pagination::TxRefPage;
pub use pagination::hydrate_transactions;
pub use pagination::paginate_assets;
pub use pagination::paginate_transactions;
