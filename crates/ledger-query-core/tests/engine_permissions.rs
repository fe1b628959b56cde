// crates/ledger-query-core/tests/engine_permissions.rs
// ============================================================================
// Module: Engine Permission Tests
// Description: Validate OWN/ANY permission composition across query kinds.
// Purpose: Ensure denials are deterministic and storage failures stay generic.
// Dependencies: ledger-query-core, serde_json
// ============================================================================

//! ## Overview
//! Permission tests for the query engine:
//! - OWN grants authorize only the caller's own account as target
//! - ANY grants authorize any target account
//! - No grant denies even self-reads
//! - Denials and storage failures route to the log sink at split severities

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use ledger_query_core::Account;
use ledger_query_core::AccountId;
use ledger_query_core::DomainId;
use ledger_query_core::Permission;
use ledger_query_core::Query;
use ledger_query_core::QueryErrorType;
use ledger_query_core::QueryHash;
use ledger_query_core::Role;
use ledger_query_core::RoleId;
use ledger_query_core::interfaces::IndexError;
use ledger_query_core::interfaces::StateIndex;
use ledger_query_core::interfaces::TxScope;
use ledger_query_core::runtime::ContextError;
use ledger_query_core::runtime::ExecutionContext;
use ledger_query_core::runtime::InMemoryBlockStore;
use ledger_query_core::runtime::InMemoryPendingPool;
use ledger_query_core::runtime::InMemoryStateIndex;
use ledger_query_core::runtime::LogSeverity;
use ledger_query_core::runtime::MemoryLogSink;
use ledger_query_core::runtime::QueryEngine;
use serde_json::json;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn context_for(creator: &str) -> ExecutionContext {
    ExecutionContext::new(AccountId::new(creator), QueryHash::new("00ff00ff"))
}

fn sample_account(id: &str) -> Account {
    Account {
        account_id: AccountId::new(id),
        domain_id: DomainId::new("wonderland"),
        quorum: 1,
        detail: json!({}),
    }
}

fn grant(
    index: &InMemoryStateIndex,
    account: &str,
    role: &str,
    permissions: &[Permission],
) -> Result<(), IndexError> {
    index.define_role(Role::new(RoleId::new(role), permissions.iter().copied()))?;
    index.grant_role(AccountId::new(account), RoleId::new(role))
}

/// Index stub whose every read fails, for storage-failure paths.
struct FailingIndex;

impl StateIndex for FailingIndex {
    fn account(
        &self,
        _account_id: &AccountId,
    ) -> Result<Option<ledger_query_core::Account>, IndexError> {
        Err(IndexError::Io("query session lost".to_string()))
    }

    fn asset_definition(
        &self,
        _asset_id: &ledger_query_core::AssetId,
    ) -> Result<Option<ledger_query_core::AssetDefinition>, IndexError> {
        Err(IndexError::Io("query session lost".to_string()))
    }

    fn roles_of(&self, _account_id: &AccountId) -> Result<Vec<RoleId>, IndexError> {
        Err(IndexError::Io("query session lost".to_string()))
    }

    fn role(&self, _role_id: &RoleId) -> Result<Option<Role>, IndexError> {
        Err(IndexError::Io("query session lost".to_string()))
    }

    fn all_roles(&self) -> Result<Vec<RoleId>, IndexError> {
        Err(IndexError::Io("query session lost".to_string()))
    }

    fn signatories_of(
        &self,
        _account_id: &AccountId,
    ) -> Result<Vec<ledger_query_core::Signatory>, IndexError> {
        Err(IndexError::Io("query session lost".to_string()))
    }

    fn account_assets(
        &self,
        _account_id: &AccountId,
    ) -> Result<Vec<ledger_query_core::AccountAsset>, IndexError> {
        Err(IndexError::Io("query session lost".to_string()))
    }

    fn peers(&self) -> Result<Vec<ledger_query_core::Peer>, IndexError> {
        Err(IndexError::Io("query session lost".to_string()))
    }

    fn related_transactions(
        &self,
        _scope: &TxScope,
    ) -> Result<Vec<ledger_query_core::TxRef>, IndexError> {
        Err(IndexError::Io("query session lost".to_string()))
    }
}

// ============================================================================
// SECTION: OWN / ANY Composition
// ============================================================================

#[test]
fn own_grant_allows_self_read_only() -> Result<(), Box<dyn std::error::Error>> {
    let index = InMemoryStateIndex::new();
    let blocks = InMemoryBlockStore::new();
    let pending = InMemoryPendingPool::new();
    let log = MemoryLogSink::new();
    index.put_account(sample_account("alice@wonderland"))?;
    index.put_account(sample_account("bob@wonderland"))?;
    grant(&index, "alice@wonderland", "observer", &[Permission::GetMyAccount])?;
    let engine = QueryEngine::new(&index, &blocks, &pending, &log);
    let ctx = context_for("alice@wonderland");

    let own = engine.execute(
        &ctx,
        &Query::GetAccount {
            account_id: AccountId::new("alice@wonderland"),
        },
    );
    assert!(!own.is_error(), "self read under OWN grant must succeed");

    let other = engine.execute(
        &ctx,
        &Query::GetAccount {
            account_id: AccountId::new("bob@wonderland"),
        },
    );
    let error = other.as_error().expect("cross read under OWN grant must be denied");
    assert_eq!(error.error_type, QueryErrorType::NotEnoughPermissions);
    assert_eq!(error.code, 2);
    Ok(())
}

#[test]
fn any_grant_allows_cross_read() -> Result<(), Box<dyn std::error::Error>> {
    let index = InMemoryStateIndex::new();
    let blocks = InMemoryBlockStore::new();
    let pending = InMemoryPendingPool::new();
    let log = MemoryLogSink::new();
    index.put_account(sample_account("alice@wonderland"))?;
    index.put_account(sample_account("bob@wonderland"))?;
    grant(&index, "alice@wonderland", "auditor", &[Permission::GetAllAccounts])?;
    let engine = QueryEngine::new(&index, &blocks, &pending, &log);
    let ctx = context_for("alice@wonderland");

    let other = engine.execute(
        &ctx,
        &Query::GetAccount {
            account_id: AccountId::new("bob@wonderland"),
        },
    );
    assert!(!other.is_error(), "cross read under ANY grant must succeed");

    let own = engine.execute(
        &ctx,
        &Query::GetAccount {
            account_id: AccountId::new("alice@wonderland"),
        },
    );
    assert!(!own.is_error(), "ANY grant covers the caller's own account too");
    Ok(())
}

#[test]
fn no_grant_denies_even_self_read() -> Result<(), Box<dyn std::error::Error>> {
    let index = InMemoryStateIndex::new();
    let blocks = InMemoryBlockStore::new();
    let pending = InMemoryPendingPool::new();
    let log = MemoryLogSink::new();
    index.put_account(sample_account("alice@wonderland"))?;
    let engine = QueryEngine::new(&index, &blocks, &pending, &log);
    let ctx = context_for("alice@wonderland");

    let response = engine.execute(
        &ctx,
        &Query::GetAccount {
            account_id: AccountId::new("alice@wonderland"),
        },
    );
    let error = response.as_error().expect("self read without any grant must be denied");
    assert_eq!(error.error_type, QueryErrorType::NotEnoughPermissions);
    assert!(
        error.message.contains("alice@wonderland"),
        "denial names the creator: {}",
        error.message
    );
    Ok(())
}

#[test]
fn permission_check_runs_before_retrieval() -> Result<(), Box<dyn std::error::Error>> {
    let index = InMemoryStateIndex::new();
    let blocks = InMemoryBlockStore::new();
    let pending = InMemoryPendingPool::new();
    let log = MemoryLogSink::new();
    let engine = QueryEngine::new(&index, &blocks, &pending, &log);
    let ctx = context_for("alice@wonderland");

    // The target account is missing, but without the grant the denial wins.
    let response = engine.execute(
        &ctx,
        &Query::GetAccount {
            account_id: AccountId::new("ghost@wonderland"),
        },
    );
    let error = response.as_error().expect("denial expected");
    assert_eq!(error.error_type, QueryErrorType::NotEnoughPermissions);
    Ok(())
}

#[test]
fn standalone_role_permission_check() -> Result<(), Box<dyn std::error::Error>> {
    let index = InMemoryStateIndex::new();
    let blocks = InMemoryBlockStore::new();
    let pending = InMemoryPendingPool::new();
    let log = MemoryLogSink::new();
    index.put_account(sample_account("alice@wonderland"))?;
    grant(&index, "alice@wonderland", "observer", &[Permission::GetBlocks])?;
    let engine = QueryEngine::new(&index, &blocks, &pending, &log);

    let alice = AccountId::new("alice@wonderland");
    assert!(engine.has_role_permission(&alice, Permission::GetBlocks)?);
    assert!(!engine.has_role_permission(&alice, Permission::GetPeers)?);
    let stranger = AccountId::new("nobody@wonderland");
    assert!(!engine.has_role_permission(&stranger, Permission::GetBlocks)?);
    Ok(())
}

// ============================================================================
// SECTION: Log Sink Routing
// ============================================================================

#[test]
fn denial_logs_at_rejection_severity_with_correlation() {
    let index = InMemoryStateIndex::new();
    let blocks = InMemoryBlockStore::new();
    let pending = InMemoryPendingPool::new();
    let log = MemoryLogSink::new();
    let engine = QueryEngine::new(&index, &blocks, &pending, &log);
    let ctx = context_for("alice@wonderland");

    let response = engine.execute(&ctx, &Query::GetPeers);
    assert!(response.is_error());

    let events = log.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].severity, LogSeverity::Rejection);
    assert_eq!(events[0].correlation, ctx.query_hash);
    assert!(events[0].cause.is_none());
}

#[test]
fn storage_failure_logs_cause_but_keeps_message_generic() {
    let index = FailingIndex;
    let blocks = InMemoryBlockStore::new();
    let pending = InMemoryPendingPool::new();
    let log = MemoryLogSink::new();
    let engine = QueryEngine::new(&index, &blocks, &pending, &log);
    let ctx = context_for("alice@wonderland");

    let response = engine.execute(
        &ctx,
        &Query::GetAccount {
            account_id: AccountId::new("alice@wonderland"),
        },
    );
    let error = response.as_error().expect("storage failure expected");
    assert_eq!(error.error_type, QueryErrorType::StatefulFailed);
    assert_eq!(error.code, 1);
    assert!(
        !error.message.contains("query session lost"),
        "the storage cause must never reach the caller"
    );

    let events = log.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].severity, LogSeverity::Failure);
    assert_eq!(events[0].correlation, ctx.query_hash);
    let cause = events[0].cause.as_deref().expect("failure event carries the cause");
    assert!(cause.contains("query session lost"));
}

// ============================================================================
// SECTION: Execution Context
// ============================================================================

#[test]
fn context_builder_fails_fast_on_missing_fields() {
    let missing_creator = ExecutionContext::builder().query_hash(QueryHash::new("00ff")).build();
    assert_eq!(missing_creator.unwrap_err(), ContextError::MissingCreator);

    let missing_hash =
        ExecutionContext::builder().creator_id(AccountId::new("alice@wonderland")).build();
    assert_eq!(missing_hash.unwrap_err(), ContextError::MissingQueryHash);

    let complete = ExecutionContext::builder()
        .creator_id(AccountId::new("alice@wonderland"))
        .query_hash(QueryHash::new("00ff"))
        .build();
    assert!(complete.is_ok());
}
