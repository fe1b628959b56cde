// crates/ledger-query-core/tests/engine_queries.rs
// ============================================================================
// Module: Engine Entity Query Tests
// Description: Validate the entity, chain, and registry query handlers.
// Purpose: Ensure typed success payloads and not-found errors per query kind.
// Dependencies: bigdecimal, ledger-query-core, serde_json
// ============================================================================

//! ## Overview
//! Handler tests for the non-paged query kinds:
//! - Account reads with role lists and detail filtering
//! - Asset balance pages with cursors and existence fallback
//! - Block reads by height, role registry reads, peer listing
//! - Repeated execution of the same read is idempotent

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

use bigdecimal::BigDecimal;
use ledger_query_core::Account;
use ledger_query_core::AccountAsset;
use ledger_query_core::AccountId;
use ledger_query_core::AssetDefinition;
use ledger_query_core::AssetId;
use ledger_query_core::AssetPageRequest;
use ledger_query_core::Block;
use ledger_query_core::BlockHeight;
use ledger_query_core::DomainId;
use ledger_query_core::HashDigest;
use ledger_query_core::Peer;
use ledger_query_core::PeerAddress;
use ledger_query_core::Permission;
use ledger_query_core::PublicKey;
use ledger_query_core::Query;
use ledger_query_core::QueryErrorType;
use ledger_query_core::QueryHash;
use ledger_query_core::QueryResponse;
use ledger_query_core::Role;
use ledger_query_core::RoleId;
use ledger_query_core::Signatory;
use ledger_query_core::Timestamp;
use ledger_query_core::runtime::ExecutionContext;
use ledger_query_core::runtime::InMemoryBlockStore;
use ledger_query_core::runtime::InMemoryPendingPool;
use ledger_query_core::runtime::InMemoryStateIndex;
use ledger_query_core::runtime::MemoryLogSink;
use ledger_query_core::runtime::QueryEngine;
use serde_json::json;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn context_for(creator: &str) -> ExecutionContext {
    ExecutionContext::new(AccountId::new(creator), QueryHash::new("ab12cd34"))
}

/// Fixture holding the shared collaborators for one test.
struct Fixture {
    index: InMemoryStateIndex,
    blocks: InMemoryBlockStore,
    pending: InMemoryPendingPool,
    log: MemoryLogSink,
}

impl Fixture {
    fn engine(&self) -> QueryEngine<'_> {
        QueryEngine::new(&self.index, &self.blocks, &self.pending, &self.log)
    }
}

/// One account with broad read grants, an asset, and a committed block.
fn populated_ledger() -> Result<Fixture, Box<dyn std::error::Error>> {
    let fixture = Fixture {
        index: InMemoryStateIndex::new(),
        blocks: InMemoryBlockStore::new(),
        pending: InMemoryPendingPool::new(),
        log: MemoryLogSink::new(),
    };
    fixture.index.put_account(Account {
        account_id: AccountId::new("alice@wonderland"),
        domain_id: DomainId::new("wonderland"),
        quorum: 2,
        detail: json!({
            "alice@wonderland": { "nickname": "al", "color": "white" },
            "bob@wonderland": { "nickname": "allie" }
        }),
    })?;
    fixture.index.define_role(Role::new(
        RoleId::new("reader"),
        [
            Permission::GetMyAccount,
            Permission::GetMyAccountDetail,
            Permission::GetMyAccountAssets,
            Permission::GetMySignatories,
            Permission::ReadAssets,
            Permission::GetBlocks,
            Permission::GetRoles,
            Permission::GetPeers,
        ],
    ))?;
    fixture.index.grant_role(AccountId::new("alice@wonderland"), RoleId::new("reader"))?;
    fixture.index.put_asset_definition(AssetDefinition {
        asset_id: AssetId::new("rose#wonderland"),
        domain_id: DomainId::new("wonderland"),
        precision: 2,
    })?;
    fixture.blocks.put_block(Block {
        height: BlockHeight::from_raw(7).expect("nonzero height"),
        hash: HashDigest::new("block-7"),
        prev_hash: Some(HashDigest::new("block-6")),
        created_at: Timestamp::from_unix_millis(1_700_000_000_000),
        transactions: Vec::new(),
    })?;
    Ok(fixture)
}

// ============================================================================
// SECTION: Account Reads
// ============================================================================

#[test]
fn account_read_includes_granted_roles() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = populated_ledger()?;
    let engine = fixture.engine();
    let ctx = context_for("alice@wonderland");

    let response = engine.execute(
        &ctx,
        &Query::GetAccount {
            account_id: AccountId::new("alice@wonderland"),
        },
    );
    let QueryResponse::Account(payload) = response else {
        panic!("expected an account payload, got {response:?}");
    };
    assert_eq!(payload.account.quorum, 2);
    assert_eq!(payload.roles, vec![RoleId::new("reader")]);
    Ok(())
}

#[test]
fn signatories_read_and_empty_case() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = populated_ledger()?;
    let engine = fixture.engine();
    let ctx = context_for("alice@wonderland");

    let empty = engine.execute(
        &ctx,
        &Query::GetSignatories {
            account_id: AccountId::new("alice@wonderland"),
        },
    );
    let error = empty.as_error().expect("no signatories must be reported");
    assert_eq!(error.error_type, QueryErrorType::NoSignatories);
    assert_eq!(error.code, 8);

    fixture
        .index
        .put_signatory(AccountId::new("alice@wonderland"), Signatory(PublicKey::new("ed0120aa")))?;
    let populated = engine.execute(
        &ctx,
        &Query::GetSignatories {
            account_id: AccountId::new("alice@wonderland"),
        },
    );
    let QueryResponse::Signatories { keys } = populated else {
        panic!("expected signatories, got {populated:?}");
    };
    assert_eq!(keys, vec![Signatory(PublicKey::new("ed0120aa"))]);
    Ok(())
}

#[test]
fn detail_filters_by_writer_and_key() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = populated_ledger()?;
    let engine = fixture.engine();
    let ctx = context_for("alice@wonderland");
    let target = AccountId::new("alice@wonderland");

    let unfiltered = engine.execute(
        &ctx,
        &Query::GetAccountDetail {
            account_id: target.clone(),
            key: None,
            writer: None,
        },
    );
    let QueryResponse::AccountDetail { detail } = unfiltered else {
        panic!("expected detail");
    };
    assert_eq!(
        detail,
        json!({
            "alice@wonderland": { "nickname": "al", "color": "white" },
            "bob@wonderland": { "nickname": "allie" }
        })
    );

    let by_writer = engine.execute(
        &ctx,
        &Query::GetAccountDetail {
            account_id: target.clone(),
            key: None,
            writer: Some(AccountId::new("bob@wonderland")),
        },
    );
    let QueryResponse::AccountDetail { detail } = by_writer else {
        panic!("expected detail");
    };
    assert_eq!(detail, json!({ "bob@wonderland": { "nickname": "allie" } }));

    let by_key = engine.execute(
        &ctx,
        &Query::GetAccountDetail {
            account_id: target.clone(),
            key: Some("color".to_string()),
            writer: None,
        },
    );
    let QueryResponse::AccountDetail { detail } = by_key else {
        panic!("expected detail");
    };
    assert_eq!(detail, json!({ "alice@wonderland": { "color": "white" } }));

    let no_match = engine.execute(
        &ctx,
        &Query::GetAccountDetail {
            account_id: target,
            key: Some("color".to_string()),
            writer: Some(AccountId::new("bob@wonderland")),
        },
    );
    let QueryResponse::AccountDetail { detail } = no_match else {
        panic!("expected detail");
    };
    assert_eq!(detail, json!({}), "writers with no surviving entries are dropped");
    Ok(())
}

// ============================================================================
// SECTION: Asset Balances
// ============================================================================

#[test]
fn asset_balances_page_with_cursor() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = populated_ledger()?;
    for asset in ["lily#wonderland", "rose#wonderland", "tulip#wonderland"] {
        fixture.index.put_account_asset(AccountAsset {
            account_id: AccountId::new("alice@wonderland"),
            asset_id: AssetId::new(asset),
            balance: BigDecimal::from(10),
        })?;
    }
    let engine = fixture.engine();
    let ctx = context_for("alice@wonderland");
    let target = AccountId::new("alice@wonderland");

    let first = engine.execute(
        &ctx,
        &Query::GetAccountAssets {
            account_id: target.clone(),
            page: AssetPageRequest::new(None, 2),
        },
    );
    let QueryResponse::AccountAssets(payload) = first else {
        panic!("expected assets, got {first:?}");
    };
    assert_eq!(payload.assets.len(), 2);
    assert_eq!(payload.assets[0].asset_id, AssetId::new("lily#wonderland"));
    assert_eq!(payload.next_asset_id, Some(AssetId::new("rose#wonderland")));
    assert_eq!(payload.total_count, 3);

    let second = engine.execute(
        &ctx,
        &Query::GetAccountAssets {
            account_id: target,
            page: AssetPageRequest::new(Some(AssetId::new("rose#wonderland")), 2),
        },
    );
    let QueryResponse::AccountAssets(payload) = second else {
        panic!("expected assets, got {second:?}");
    };
    assert_eq!(payload.assets.len(), 1);
    assert_eq!(payload.assets[0].asset_id, AssetId::new("tulip#wonderland"));
    assert_eq!(payload.next_asset_id, None);
    Ok(())
}

#[test]
fn asset_balances_distinguish_missing_account_from_empty()
-> Result<(), Box<dyn std::error::Error>> {
    let fixture = populated_ledger()?;
    fixture
        .index
        .define_role(Role::new(RoleId::new("treasurer"), [Permission::GetAllAccountAssets]))?;
    fixture.index.grant_role(AccountId::new("alice@wonderland"), RoleId::new("treasurer"))?;
    fixture.index.put_account(Account {
        account_id: AccountId::new("bob@wonderland"),
        domain_id: DomainId::new("wonderland"),
        quorum: 1,
        detail: json!({}),
    })?;
    let engine = fixture.engine();
    let ctx = context_for("alice@wonderland");

    let missing = engine.execute(
        &ctx,
        &Query::GetAccountAssets {
            account_id: AccountId::new("ghost@wonderland"),
            page: AssetPageRequest::new(None, 2),
        },
    );
    let error = missing.as_error().expect("missing account must be reported");
    assert_eq!(error.error_type, QueryErrorType::NoAccount);

    let empty = engine.execute(
        &ctx,
        &Query::GetAccountAssets {
            account_id: AccountId::new("bob@wonderland"),
            page: AssetPageRequest::new(None, 2),
        },
    );
    let QueryResponse::AccountAssets(payload) = empty else {
        panic!("holding no assets is a success, got {empty:?}");
    };
    assert!(payload.assets.is_empty());
    assert_eq!(payload.total_count, 0);
    Ok(())
}

// ============================================================================
// SECTION: Chain and Registry Reads
// ============================================================================

#[test]
fn block_read_by_height_and_missing_height() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = populated_ledger()?;
    let engine = fixture.engine();
    let ctx = context_for("alice@wonderland");

    let found = engine.execute(
        &ctx,
        &Query::GetBlock {
            height: BlockHeight::from_raw(7).expect("nonzero height"),
        },
    );
    let QueryResponse::Block { block } = found else {
        panic!("expected a block, got {found:?}");
    };
    assert_eq!(block.hash, HashDigest::new("block-7"));

    let missing = engine.execute(
        &ctx,
        &Query::GetBlock {
            height: BlockHeight::from_raw(9_999).expect("nonzero height"),
        },
    );
    let error = missing.as_error().expect("missing height must be reported");
    assert_eq!(error.error_type, QueryErrorType::NoBlock);
    assert_eq!(error.code, 9, "a missing block is not a storage failure");
    Ok(())
}

#[test]
fn repeated_reads_are_idempotent() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = populated_ledger()?;
    let engine = fixture.engine();
    let ctx = context_for("alice@wonderland");
    let query = Query::GetBlock {
        height: BlockHeight::from_raw(7).expect("nonzero height"),
    };

    let first = engine.execute(&ctx, &query);
    let second = engine.execute(&ctx, &query);
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn role_registry_reads() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = populated_ledger()?;
    let engine = fixture.engine();
    let ctx = context_for("alice@wonderland");

    let roles = engine.execute(&ctx, &Query::GetRoles);
    let QueryResponse::Roles { roles } = roles else {
        panic!("expected roles, got {roles:?}");
    };
    assert_eq!(roles, vec![RoleId::new("reader")]);

    let permissions = engine.execute(
        &ctx,
        &Query::GetRolePermissions {
            role_id: RoleId::new("reader"),
        },
    );
    let QueryResponse::RolePermissions { permissions } = permissions else {
        panic!("expected role permissions, got {permissions:?}");
    };
    assert!(permissions.contains(&Permission::GetBlocks));

    let missing = engine.execute(
        &ctx,
        &Query::GetRolePermissions {
            role_id: RoleId::new("no-such-role"),
        },
    );
    let error = missing.as_error().expect("unknown role must be reported");
    assert_eq!(error.error_type, QueryErrorType::NoRoles);
    assert_eq!(error.code, 7);
    Ok(())
}

#[test]
fn asset_info_read_and_missing_asset() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = populated_ledger()?;
    let engine = fixture.engine();
    let ctx = context_for("alice@wonderland");

    let found = engine.execute(
        &ctx,
        &Query::GetAssetInfo {
            asset_id: AssetId::new("rose#wonderland"),
        },
    );
    let QueryResponse::Asset { asset } = found else {
        panic!("expected an asset, got {found:?}");
    };
    assert_eq!(asset.precision, 2);

    let missing = engine.execute(
        &ctx,
        &Query::GetAssetInfo {
            asset_id: AssetId::new("tulip#wonderland"),
        },
    );
    let error = missing.as_error().expect("unknown asset must be reported");
    assert_eq!(error.error_type, QueryErrorType::NoAsset);
    Ok(())
}

#[test]
fn peer_listing_and_empty_case() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = populated_ledger()?;
    let engine = fixture.engine();
    let ctx = context_for("alice@wonderland");

    let empty = engine.execute(&ctx, &Query::GetPeers);
    let error = empty.as_error().expect("an empty peer list must be reported");
    assert_eq!(error.error_type, QueryErrorType::NoPeers);
    assert_eq!(error.code, 10);

    fixture.index.put_peer(Peer {
        address: PeerAddress::new("127.0.0.1:10001"),
        public_key: PublicKey::new("ed0120bb"),
    })?;
    let populated = engine.execute(&ctx, &Query::GetPeers);
    let QueryResponse::Peers { peers } = populated else {
        panic!("expected peers, got {populated:?}");
    };
    assert_eq!(peers.len(), 1);
    assert_eq!(peers[0].address, PeerAddress::new("127.0.0.1:10001"));
    Ok(())
}
