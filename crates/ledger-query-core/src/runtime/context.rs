// crates/ledger-query-core/src/runtime/context.rs
// ============================================================================
// Module: Ledger Query Execution Context
// Description: Per-call caller identity and correlation hash.
// Purpose: Thread caller state through one query execution without engine mutation.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! An [`ExecutionContext`] carries the authenticated caller identity and the
//! correlation hash for exactly one `execute` invocation. It is an explicit
//! parameter, never engine state, so one engine instance is safe to share
//! across concurrent calls. The builder surfaces missing fields as a
//! [`ContextError`] at the transport boundary instead of letting a
//! half-initialized context reach the engine.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::hashing::QueryHash;
use crate::core::identifiers::AccountId;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Execution-context construction errors.
///
/// These are programming errors at the transport boundary, not user-facing
/// ledger errors; they never become an [`ErrorResponse`].
///
/// # Invariants
/// - Variants are stable for programmatic handling.
///
/// [`ErrorResponse`]: crate::core::response::ErrorResponse
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContextError {
    /// The creator account id was never set.
    #[error("execution context is missing the creator account id")]
    MissingCreator,
    /// The query correlation hash was never set.
    #[error("execution context is missing the query hash")]
    MissingQueryHash,
}

// ============================================================================
// SECTION: Execution Context
// ============================================================================

/// Per-call execution state: caller identity plus correlation hash.
///
/// # Invariants
/// - Immutable; applies to exactly one `execute` invocation.
/// - Never shared or reused across concurrent calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionContext {
    /// Authenticated caller account identifier.
    pub creator_id: AccountId,
    /// Correlation hash tagging this invocation in logs and errors.
    pub query_hash: QueryHash,
}

impl ExecutionContext {
    /// Creates a context from a caller identity and correlation hash.
    #[must_use]
    pub const fn new(creator_id: AccountId, query_hash: QueryHash) -> Self {
        Self {
            creator_id,
            query_hash,
        }
    }

    /// Starts an incremental builder for transports that receive the two
    /// fields separately.
    #[must_use]
    pub const fn builder() -> ExecutionContextBuilder {
        ExecutionContextBuilder {
            creator_id: None,
            query_hash: None,
        }
    }
}

/// Incremental builder for [`ExecutionContext`].
///
/// # Invariants
/// - `build` fails fast when either field is unset.
#[derive(Debug, Default)]
pub struct ExecutionContextBuilder {
    /// Caller account identifier, once supplied.
    creator_id: Option<AccountId>,
    /// Correlation hash, once supplied.
    query_hash: Option<QueryHash>,
}

impl ExecutionContextBuilder {
    /// Sets the caller account identifier.
    #[must_use]
    pub fn creator_id(mut self, creator_id: AccountId) -> Self {
        self.creator_id = Some(creator_id);
        self
    }

    /// Sets the query correlation hash.
    #[must_use]
    pub fn query_hash(mut self, query_hash: QueryHash) -> Self {
        self.query_hash = Some(query_hash);
        self
    }

    /// Builds the context, failing fast on missing fields.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError`] when a field was never set.
    pub fn build(self) -> Result<ExecutionContext, ContextError> {
        let creator_id = self.creator_id.ok_or(ContextError::MissingCreator)?;
        let query_hash = self.query_hash.ok_or(ContextError::MissingQueryHash)?;
        Ok(ExecutionContext {
            creator_id,
            query_hash,
        })
    }
}
