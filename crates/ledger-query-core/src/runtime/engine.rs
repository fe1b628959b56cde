// crates/ledger-query-core/src/runtime/engine.rs
// ============================================================================
// Module: Ledger Query Engine
// Description: Permission-checked dispatch over the closed query set.
// Purpose: Execute one query against borrowed ledger collaborators and return one response.
// Dependencies: crate::core, crate::interfaces, crate::runtime::{context, pagination}, serde_json
// ============================================================================

//! ## Overview
//! The engine is the sole entry point for query execution. It is stateless
//! apart from its borrowed collaborators, so one instance is safe to share
//! across calls; per-call state travels in an explicit
//! [`ExecutionContext`].
//!
//! Every handler follows the same skeleton: evaluate the permission
//! predicate, reject with a kind-specific denial on failure, run the
//! retrieval, map an expected-missing entity to its "does not exist" error,
//! and otherwise build the typed success response. Storage failures from any
//! step surface as a generic stateful failure, logged with the correlation
//! hash and the underlying cause; the cause itself never reaches the caller.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Map;
use serde_json::Value;

use crate::core::entities::Account;
use crate::core::identifiers::AccountId;
use crate::core::identifiers::AssetId;
use crate::core::identifiers::BlockHeight;
use crate::core::identifiers::RoleId;
use crate::core::permissions::Permission;
use crate::core::query::AssetPageRequest;
use crate::core::query::Query;
use crate::core::query::TxPageRequest;
use crate::core::response::AccountAssetsPayload;
use crate::core::response::AccountPayload;
use crate::core::response::ErrorResponse;
use crate::core::response::QueryErrorType;
use crate::core::response::QueryResponse;
use crate::core::response::TransactionsPagePayload;
use crate::interfaces::BlockStore;
use crate::interfaces::BlockStoreError;
use crate::interfaces::IndexError;
use crate::interfaces::PendingPool;
use crate::interfaces::PendingPoolError;
use crate::interfaces::QueryLogSink;
use crate::interfaces::StateIndex;
use crate::interfaces::TxScope;
use crate::runtime::context::ExecutionContext;
use crate::runtime::pagination::HydrationError;
use crate::runtime::pagination::PaginationError;
use crate::runtime::pagination::hydrate_transactions;
use crate::runtime::pagination::paginate_assets;
use crate::runtime::pagination::paginate_transactions;

// ============================================================================
// SECTION: Internal Failures
// ============================================================================

/// Storage-layer failure raised inside a handler retrieval step.
///
/// All variants surface to the caller as a single generic stateful failure;
/// the variant detail exists only for the high-severity log entry.
#[derive(Debug)]
enum RetrievalFailure {
    /// Relational index failure.
    Index(IndexError),
    /// Block store failure.
    Blocks(BlockStoreError),
    /// Pending pool failure.
    Pool(PendingPoolError),
    /// Index/block-store inconsistency during body hydration.
    Hydration(HydrationError),
}

impl RetrievalFailure {
    /// Renders the underlying cause for the failure log entry.
    fn cause(&self) -> String {
        match self {
            Self::Index(err) => err.to_string(),
            Self::Blocks(err) => err.to_string(),
            Self::Pool(err) => err.to_string(),
            Self::Hydration(err) => err.to_string(),
        }
    }
}

impl From<IndexError> for RetrievalFailure {
    fn from(err: IndexError) -> Self {
        Self::Index(err)
    }
}

impl From<BlockStoreError> for RetrievalFailure {
    fn from(err: BlockStoreError) -> Self {
        Self::Blocks(err)
    }
}

impl From<PendingPoolError> for RetrievalFailure {
    fn from(err: PendingPoolError) -> Self {
        Self::Pool(err)
    }
}

impl From<HydrationError> for RetrievalFailure {
    fn from(err: HydrationError) -> Self {
        Self::Hydration(err)
    }
}

/// Outcome of the empty-page fallback checker: the error to report when the
/// pagination target turns out not to exist.
type FallbackRejection = Option<(QueryErrorType, String)>;

// ============================================================================
// SECTION: Engine
// ============================================================================

/// Permission-checked read-query engine over borrowed ledger state.
///
/// # Invariants
/// - Holds no per-call state; safe to share across concurrent executions as
///   long as each call supplies its own [`ExecutionContext`].
/// - Never mutates ledger state through its collaborators.
pub struct QueryEngine<'a> {
    /// Relational index session.
    index: &'a dyn StateIndex,
    /// Immutable block store.
    blocks: &'a dyn BlockStore,
    /// Pending transaction pool.
    pending: &'a dyn PendingPool,
    /// Structured sink for denial and failure events.
    log: &'a dyn QueryLogSink,
}

impl<'a> QueryEngine<'a> {
    /// Creates an engine over borrowed collaborators.
    #[must_use]
    pub const fn new(
        index: &'a dyn StateIndex,
        blocks: &'a dyn BlockStore,
        pending: &'a dyn PendingPool,
        log: &'a dyn QueryLogSink,
    ) -> Self {
        Self {
            index,
            blocks,
            pending,
            log,
        }
    }

    /// Returns whether the account holds a role granting the permission.
    ///
    /// Exposed for transports that need a standalone check outside full
    /// query execution.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError`] when the role join cannot be read.
    pub fn has_role_permission(
        &self,
        account_id: &AccountId,
        permission: Permission,
    ) -> Result<bool, IndexError> {
        for role_id in self.index.roles_of(account_id)? {
            if let Some(role) = self.index.role(&role_id)?
                && role.grants(permission)
            {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Executes one query and returns exactly one typed response.
    ///
    /// Dispatch is an exhaustive match: a new [`Query`] variant fails
    /// compilation here until a handler exists. A denied or failed query
    /// produces only an error response, never a partial success payload.
    #[must_use]
    pub fn execute(&self, ctx: &ExecutionContext, query: &Query) -> QueryResponse {
        match query {
            Query::GetAccount { account_id } => self.get_account(ctx, account_id),
            Query::GetBlock { height } => self.get_block(ctx, *height),
            Query::GetSignatories { account_id } => self.get_signatories(ctx, account_id),
            Query::GetAccountTransactions { account_id, page } => {
                self.get_account_transactions(ctx, account_id, page)
            }
            Query::GetAccountAssetTransactions {
                account_id,
                asset_id,
                page,
            } => self.get_account_asset_transactions(ctx, account_id, asset_id, page),
            Query::GetTransactions { page } => self.get_transactions(ctx, page),
            Query::GetAccountAssets { account_id, page } => {
                self.get_account_assets(ctx, account_id, page)
            }
            Query::GetAccountDetail {
                account_id,
                key,
                writer,
            } => self.get_account_detail(ctx, account_id, key.as_deref(), writer.as_ref()),
            Query::GetRoles => self.get_roles(ctx),
            Query::GetRolePermissions { role_id } => self.get_role_permissions(ctx, role_id),
            Query::GetAssetInfo { asset_id } => self.get_asset_info(ctx, asset_id),
            Query::GetPendingTransactions => self.get_pending_transactions(ctx),
            Query::GetPeers => self.get_peers(ctx),
        }
    }

    // ========================================================================
    // SECTION: Shared Execution Skeleton
    // ========================================================================

    /// Builds and logs an expected rejection (denial, not-found, or invalid
    /// pagination) at low severity.
    fn reject(
        &self,
        ctx: &ExecutionContext,
        error_type: QueryErrorType,
        message: String,
    ) -> QueryResponse {
        self.log.denied(&ctx.query_hash, &message);
        QueryResponse::Error(ErrorResponse::new(error_type, message))
    }

    /// Builds and logs a storage failure at high severity.
    ///
    /// The user-visible message stays generic; the cause goes only to the
    /// log, tagged with the correlation hash.
    fn fail_storage(&self, ctx: &ExecutionContext, cause: &str) -> QueryResponse {
        let message = "stateful query execution failed";
        self.log.storage_failure(&ctx.query_hash, message, cause);
        QueryResponse::Error(ErrorResponse::new(QueryErrorType::StatefulFailed, message))
    }

    /// Runs the shared handler skeleton: permission predicate, denial,
    /// retrieval, storage-failure mapping.
    ///
    /// `permitted` already reflects the query kind's composed predicate;
    /// `retrieve` builds the final response (success or an expected
    /// rejection) and may raise a [`RetrievalFailure`] from any storage
    /// read.
    fn guarded<F>(
        &self,
        ctx: &ExecutionContext,
        permitted: Result<bool, IndexError>,
        denial: String,
        retrieve: F,
    ) -> QueryResponse
    where
        F: FnOnce() -> Result<QueryResponse, RetrievalFailure>,
    {
        match permitted {
            Err(err) => self.fail_storage(ctx, &err.to_string()),
            Ok(false) => self.reject(ctx, QueryErrorType::NotEnoughPermissions, denial),
            Ok(true) => match retrieve() {
                Ok(response) => response,
                Err(failure) => self.fail_storage(ctx, &failure.cause()),
            },
        }
    }

    /// Composed predicate for account-scoped queries: ANY grant, or an OWN
    /// grant when the target is the caller's own account.
    fn allowed_self_or_any(
        &self,
        ctx: &ExecutionContext,
        target: &AccountId,
        own: Permission,
        any: Permission,
    ) -> Result<bool, IndexError> {
        if self.has_role_permission(&ctx.creator_id, any)? {
            return Ok(true);
        }
        if *target == ctx.creator_id {
            return self.has_role_permission(&ctx.creator_id, own);
        }
        Ok(false)
    }

    /// Shared runner for the paged transaction queries.
    ///
    /// `fallback` distinguishes a legitimately empty history from a missing
    /// target; it runs only when zero candidates matched and no cursor was
    /// supplied, since a cursor implies the caller already knows a valid
    /// prior transaction.
    fn transactions_query<C>(
        &self,
        ctx: &ExecutionContext,
        scope: &TxScope,
        page: &TxPageRequest,
        fallback: C,
    ) -> Result<QueryResponse, RetrievalFailure>
    where
        C: FnOnce() -> Result<FallbackRejection, IndexError>,
    {
        let candidates = self.index.related_transactions(scope)?;
        let resolved = match paginate_transactions(&candidates, page) {
            Ok(resolved) => resolved,
            Err(PaginationError::InvalidCursor(cursor)) => {
                return Ok(self.reject(
                    ctx,
                    QueryErrorType::InvalidPagination,
                    format!("pagination hash {cursor} does not match any transaction in the set"),
                ));
            }
        };
        if resolved.total == 0
            && page.first_tx_hash.is_none()
            && let Some((error_type, message)) = fallback()?
        {
            return Ok(self.reject(ctx, error_type, message));
        }
        let transactions = hydrate_transactions(self.blocks, &resolved.refs)?;
        Ok(QueryResponse::TransactionsPage(TransactionsPagePayload {
            transactions,
            next_tx_hash: resolved.next_tx_hash,
            all_transactions_size: resolved.total,
        }))
    }

    // ========================================================================
    // SECTION: Account Handlers
    // ========================================================================

    /// Handles `GetAccount`.
    fn get_account(&self, ctx: &ExecutionContext, account_id: &AccountId) -> QueryResponse {
        self.guarded(
            ctx,
            self.allowed_self_or_any(
                ctx,
                account_id,
                Permission::GetMyAccount,
                Permission::GetAllAccounts,
            ),
            format!(
                "query creator {} lacks {} (or {} for own account) to get account {account_id}",
                ctx.creator_id,
                Permission::GetAllAccounts,
                Permission::GetMyAccount
            ),
            || {
                let Some(account) = self.index.account(account_id)? else {
                    return Ok(self.reject(
                        ctx,
                        QueryErrorType::NoAccount,
                        format!("account {account_id} does not exist"),
                    ));
                };
                let roles = self.index.roles_of(account_id)?;
                Ok(QueryResponse::Account(AccountPayload { account, roles }))
            },
        )
    }

    /// Handles `GetSignatories`.
    fn get_signatories(&self, ctx: &ExecutionContext, account_id: &AccountId) -> QueryResponse {
        self.guarded(
            ctx,
            self.allowed_self_or_any(
                ctx,
                account_id,
                Permission::GetMySignatories,
                Permission::GetAllSignatories,
            ),
            format!(
                "query creator {} lacks {} (or {} for own account) to get signatories of \
                 {account_id}",
                ctx.creator_id,
                Permission::GetAllSignatories,
                Permission::GetMySignatories
            ),
            || {
                let keys = self.index.signatories_of(account_id)?;
                if keys.is_empty() {
                    return Ok(self.reject(
                        ctx,
                        QueryErrorType::NoSignatories,
                        format!("no signatories found for account {account_id}"),
                    ));
                }
                Ok(QueryResponse::Signatories { keys })
            },
        )
    }

    /// Handles `GetAccountDetail`.
    fn get_account_detail(
        &self,
        ctx: &ExecutionContext,
        account_id: &AccountId,
        key: Option<&str>,
        writer: Option<&AccountId>,
    ) -> QueryResponse {
        self.guarded(
            ctx,
            self.allowed_self_or_any(
                ctx,
                account_id,
                Permission::GetMyAccountDetail,
                Permission::GetAllAccountDetail,
            ),
            format!(
                "query creator {} lacks {} (or {} for own account) to get detail of {account_id}",
                ctx.creator_id,
                Permission::GetAllAccountDetail,
                Permission::GetMyAccountDetail
            ),
            || {
                let Some(account) = self.index.account(account_id)? else {
                    return Ok(self.reject(
                        ctx,
                        QueryErrorType::NoAccount,
                        format!("account {account_id} does not exist"),
                    ));
                };
                let detail = filter_detail(&account, key, writer);
                Ok(QueryResponse::AccountDetail { detail })
            },
        )
    }

    /// Handles `GetAccountAssets`.
    fn get_account_assets(
        &self,
        ctx: &ExecutionContext,
        account_id: &AccountId,
        page: &AssetPageRequest,
    ) -> QueryResponse {
        self.guarded(
            ctx,
            self.allowed_self_or_any(
                ctx,
                account_id,
                Permission::GetMyAccountAssets,
                Permission::GetAllAccountAssets,
            ),
            format!(
                "query creator {} lacks {} (or {} for own account) to get assets of {account_id}",
                ctx.creator_id,
                Permission::GetAllAccountAssets,
                Permission::GetMyAccountAssets
            ),
            || {
                let balances = self.index.account_assets(account_id)?;
                let resolved = match paginate_assets(&balances, page) {
                    Ok(resolved) => resolved,
                    Err(PaginationError::InvalidCursor(cursor)) => {
                        return Ok(self.reject(
                            ctx,
                            QueryErrorType::InvalidPagination,
                            format!("starting asset id {cursor} is not held by {account_id}"),
                        ));
                    }
                };
                if resolved.total == 0
                    && page.first_asset_id.is_none()
                    && !self.index.account_exists(account_id)?
                {
                    return Ok(self.reject(
                        ctx,
                        QueryErrorType::NoAccount,
                        format!("account {account_id} does not exist"),
                    ));
                }
                Ok(QueryResponse::AccountAssets(AccountAssetsPayload {
                    assets: resolved.assets,
                    next_asset_id: resolved.next_asset_id,
                    total_count: resolved.total,
                }))
            },
        )
    }

    // ========================================================================
    // SECTION: Transaction Handlers
    // ========================================================================

    /// Handles `GetAccountTransactions`.
    fn get_account_transactions(
        &self,
        ctx: &ExecutionContext,
        account_id: &AccountId,
        page: &TxPageRequest,
    ) -> QueryResponse {
        self.guarded(
            ctx,
            self.allowed_self_or_any(
                ctx,
                account_id,
                Permission::GetMyAccountTransactions,
                Permission::GetAllAccountTransactions,
            ),
            format!(
                "query creator {} lacks {} (or {} for own account) to get transactions of \
                 {account_id}",
                ctx.creator_id,
                Permission::GetAllAccountTransactions,
                Permission::GetMyAccountTransactions
            ),
            || {
                self.transactions_query(ctx, &TxScope::Account(account_id.clone()), page, || {
                    if self.index.account_exists(account_id)? {
                        Ok(None)
                    } else {
                        Ok(Some((
                            QueryErrorType::NoAccount,
                            format!("account {account_id} does not exist"),
                        )))
                    }
                })
            },
        )
    }

    /// Handles `GetAccountAssetTransactions`.
    fn get_account_asset_transactions(
        &self,
        ctx: &ExecutionContext,
        account_id: &AccountId,
        asset_id: &AssetId,
        page: &TxPageRequest,
    ) -> QueryResponse {
        self.guarded(
            ctx,
            self.allowed_self_or_any(
                ctx,
                account_id,
                Permission::GetMyAccountAssetTransactions,
                Permission::GetAllAccountAssetTransactions,
            ),
            format!(
                "query creator {} lacks {} (or {} for own account) to get {asset_id} \
                 transactions of {account_id}",
                ctx.creator_id,
                Permission::GetAllAccountAssetTransactions,
                Permission::GetMyAccountAssetTransactions
            ),
            || {
                let scope = TxScope::AccountAsset(account_id.clone(), asset_id.clone());
                self.transactions_query(ctx, &scope, page, || {
                    if !self.index.account_exists(account_id)? {
                        return Ok(Some((
                            QueryErrorType::NoAccount,
                            format!("account {account_id} does not exist"),
                        )));
                    }
                    if self.index.asset_definition(asset_id)?.is_none() {
                        return Ok(Some((
                            QueryErrorType::NoAsset,
                            format!("asset {asset_id} does not exist"),
                        )));
                    }
                    Ok(None)
                })
            },
        )
    }

    /// Handles `GetTransactions`.
    ///
    /// The candidate set is every committed transaction under the ANY grant,
    /// or the caller's own transactions under the OWN grant. The caller's
    /// account is known to exist, so an empty page needs no fallback check.
    fn get_transactions(&self, ctx: &ExecutionContext, page: &TxPageRequest) -> QueryResponse {
        let scope = match self.has_role_permission(&ctx.creator_id, Permission::GetAllTransactions)
        {
            Err(err) => return self.fail_storage(ctx, &err.to_string()),
            Ok(true) => TxScope::All,
            Ok(false) => TxScope::Creator(ctx.creator_id.clone()),
        };
        let own_only = matches!(scope, TxScope::Creator(_));
        self.guarded(
            ctx,
            if own_only {
                self.has_role_permission(&ctx.creator_id, Permission::GetMyTransactions)
            } else {
                Ok(true)
            },
            format!(
                "query creator {} lacks {} or {} to list transactions",
                ctx.creator_id,
                Permission::GetAllTransactions,
                Permission::GetMyTransactions
            ),
            || self.transactions_query(ctx, &scope, page, || Ok(None)),
        )
    }

    /// Handles `GetPendingTransactions`.
    fn get_pending_transactions(&self, ctx: &ExecutionContext) -> QueryResponse {
        self.guarded(
            ctx,
            self.has_role_permission(&ctx.creator_id, Permission::GetMyPendingTransactions),
            format!(
                "query creator {} lacks {} to get pending transactions",
                ctx.creator_id,
                Permission::GetMyPendingTransactions
            ),
            || {
                let transactions = self.pending.pending_for(&ctx.creator_id)?;
                Ok(QueryResponse::PendingTransactions { transactions })
            },
        )
    }

    // ========================================================================
    // SECTION: Chain and Registry Handlers
    // ========================================================================

    /// Handles `GetBlock`.
    fn get_block(&self, ctx: &ExecutionContext, height: BlockHeight) -> QueryResponse {
        self.guarded(
            ctx,
            self.has_role_permission(&ctx.creator_id, Permission::GetBlocks),
            format!(
                "query creator {} lacks {} to get blocks",
                ctx.creator_id,
                Permission::GetBlocks
            ),
            || {
                let Some(block) = self.blocks.block(height)? else {
                    return Ok(self.reject(
                        ctx,
                        QueryErrorType::NoBlock,
                        format!("no block at height {height}"),
                    ));
                };
                Ok(QueryResponse::Block { block })
            },
        )
    }

    /// Handles `GetRoles`.
    fn get_roles(&self, ctx: &ExecutionContext) -> QueryResponse {
        self.guarded(
            ctx,
            self.has_role_permission(&ctx.creator_id, Permission::GetRoles),
            format!(
                "query creator {} lacks {} to list roles",
                ctx.creator_id,
                Permission::GetRoles
            ),
            || {
                let roles = self.index.all_roles()?;
                Ok(QueryResponse::Roles { roles })
            },
        )
    }

    /// Handles `GetRolePermissions`.
    fn get_role_permissions(&self, ctx: &ExecutionContext, role_id: &RoleId) -> QueryResponse {
        self.guarded(
            ctx,
            self.has_role_permission(&ctx.creator_id, Permission::GetRoles),
            format!(
                "query creator {} lacks {} to get role permissions",
                ctx.creator_id,
                Permission::GetRoles
            ),
            || {
                let Some(role) = self.index.role(role_id)? else {
                    return Ok(self.reject(
                        ctx,
                        QueryErrorType::NoRoles,
                        format!("role {role_id} does not exist"),
                    ));
                };
                Ok(QueryResponse::RolePermissions {
                    permissions: role.permissions,
                })
            },
        )
    }

    /// Handles `GetAssetInfo`.
    fn get_asset_info(&self, ctx: &ExecutionContext, asset_id: &AssetId) -> QueryResponse {
        self.guarded(
            ctx,
            self.has_role_permission(&ctx.creator_id, Permission::ReadAssets),
            format!(
                "query creator {} lacks {} to get asset info",
                ctx.creator_id,
                Permission::ReadAssets
            ),
            || {
                let Some(asset) = self.index.asset_definition(asset_id)? else {
                    return Ok(self.reject(
                        ctx,
                        QueryErrorType::NoAsset,
                        format!("asset {asset_id} does not exist"),
                    ));
                };
                Ok(QueryResponse::Asset { asset })
            },
        )
    }

    /// Handles `GetPeers`.
    fn get_peers(&self, ctx: &ExecutionContext) -> QueryResponse {
        self.guarded(
            ctx,
            self.has_role_permission(&ctx.creator_id, Permission::GetPeers),
            format!(
                "query creator {} lacks {} to list peers",
                ctx.creator_id,
                Permission::GetPeers
            ),
            || {
                let peers = self.index.peers()?;
                if peers.is_empty() {
                    return Ok(self.reject(
                        ctx,
                        QueryErrorType::NoPeers,
                        "no peers are known to the ledger".to_string(),
                    ));
                }
                Ok(QueryResponse::Peers { peers })
            },
        )
    }
}

// ============================================================================
// SECTION: Detail Filtering
// ============================================================================

/// Applies the optional writer and key filters to an account's detail JSON.
///
/// Detail is an object keyed by writer account, then detail key. A writer
/// filter narrows to that writer's entries; a key filter keeps only entries
/// under that key across the remaining writers. Writers left with no entries
/// are dropped.
fn filter_detail(account: &Account, key: Option<&str>, writer: Option<&AccountId>) -> Value {
    let Value::Object(by_writer) = &account.detail else {
        return Value::Object(Map::new());
    };
    let mut filtered = Map::new();
    for (writer_id, entries) in by_writer {
        if let Some(wanted) = writer
            && writer_id != wanted.as_str()
        {
            continue;
        }
        let Value::Object(entries) = entries else {
            continue;
        };
        let kept: Map<String, Value> = entries
            .iter()
            .filter(|(entry_key, _)| key.is_none_or(|wanted| wanted == entry_key.as_str()))
            .map(|(entry_key, value)| (entry_key.clone(), value.clone()))
            .collect();
        if !kept.is_empty() {
            filtered.insert(writer_id.clone(), Value::Object(kept));
        }
    }
    Value::Object(filtered)
}
