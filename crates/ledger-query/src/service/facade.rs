//! Ledger Query Service
//!
//! Orchestrates option validation, plan compilation, cursor decoding and
//! stream setup for each entry point.

use async_trait::async_trait;
use shared_types::{AccountSnapshot, AssetBalance, AssetRecord, TransactionRow};
use std::sync::Arc;

use crate::domain::config::QueryConfig;
use crate::domain::cursor::decode_cursor;
use crate::domain::entity::{AccountEntity, AssetEntity, BalanceEntity, QueryEntity, TransactionEntity};
use crate::domain::errors::{ConfigError, FilterError, QueryError};
use crate::domain::filters::{AccountQueryOptions, AssetBalanceQuery, AssetsQuery, TransactionFilter};
use crate::domain::planner::{
    compile_accounts, compile_asset_balances, compile_assets, compile_transactions, CompiledQuery,
};
use crate::metrics::QueryMetrics;
use crate::ports::inbound::LedgerQueryApi;
use crate::ports::outbound::RowStore;
use crate::service::executor::ScanExecution;
use crate::service::stream::{spawn_stream, QueryContext, RowStream};

/// Ledger query service implementation
///
/// Implements the `LedgerQueryApi` port over an injected row store.
pub struct LedgerQueryService<S: RowStore> {
    store: Arc<S>,
    config: QueryConfig,
    metrics: Arc<QueryMetrics>,
}

impl<S: RowStore> LedgerQueryService<S> {
    /// Create a new service with the default configuration
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            config: QueryConfig::default(),
            metrics: Arc::new(QueryMetrics::new()),
        }
    }

    /// Create with a custom configuration
    pub fn with_config(store: Arc<S>, config: QueryConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            store,
            config,
            metrics: Arc::new(QueryMetrics::new()),
        })
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    pub fn metrics(&self) -> &QueryMetrics {
        &self.metrics
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Validate, compile and open a transaction scan without a runtime.
    pub fn prepare_transactions(
        &self,
        filter: &TransactionFilter,
    ) -> Result<ScanExecution<TransactionEntity>, QueryError> {
        self.prepare(compile_transactions(filter, &self.config), filter.resume_token())
    }

    pub fn prepare_accounts(
        &self,
        options: &AccountQueryOptions,
    ) -> Result<ScanExecution<AccountEntity>, QueryError> {
        self.prepare(compile_accounts(options, &self.config), options.resume_token())
    }

    pub fn prepare_assets(&self, query: &AssetsQuery) -> Result<ScanExecution<AssetEntity>, QueryError> {
        self.prepare(compile_assets(query, &self.config), query.resume_token())
    }

    pub fn prepare_asset_balances(
        &self,
        query: &AssetBalanceQuery,
    ) -> Result<ScanExecution<BalanceEntity>, QueryError> {
        self.prepare(compile_asset_balances(query, &self.config), query.resume_token())
    }

    fn prepare<E: QueryEntity>(
        &self,
        compiled: Result<CompiledQuery<E>, FilterError>,
        token: Option<&str>,
    ) -> Result<ScanExecution<E>, QueryError> {
        self.metrics.record_query_started();

        let compiled = compiled.map_err(|e| {
            tracing::warn!(entity = E::LABEL, error = %e, "rejected filter");
            self.metrics.record_query_rejected();
            e
        })?;

        let cursor = token
            .map(|token| {
                decode_cursor(token, E::KIND, compiled.identity, self.config.max_cursor_token_len)
            })
            .transpose()
            .map_err(|e| {
                tracing::warn!(entity = E::LABEL, error = %e, "rejected cursor");
                self.metrics.record_query_rejected();
                e
            })?;

        Ok(ScanExecution::open(
            self.store.as_ref(),
            compiled,
            cursor,
            Arc::clone(&self.metrics),
        )?)
    }

    fn stream<E: QueryEntity>(
        &self,
        ctx: &QueryContext,
        execution: ScanExecution<E>,
    ) -> Result<RowStream<E::Output>, QueryError> {
        spawn_stream(
            execution,
            ctx,
            self.config.channel_capacity,
            Arc::clone(&self.metrics),
        )
    }
}

#[async_trait]
impl<S: RowStore + 'static> LedgerQueryApi for LedgerQueryService<S> {
    async fn transactions(
        &self,
        ctx: &QueryContext,
        filter: &TransactionFilter,
    ) -> Result<RowStream<TransactionRow>, QueryError> {
        let execution = self.prepare_transactions(filter)?;
        self.stream(ctx, execution)
    }

    async fn accounts(
        &self,
        ctx: &QueryContext,
        options: &AccountQueryOptions,
    ) -> Result<RowStream<AccountSnapshot>, QueryError> {
        let execution = self.prepare_accounts(options)?;
        self.stream(ctx, execution)
    }

    async fn assets(
        &self,
        ctx: &QueryContext,
        query: &AssetsQuery,
    ) -> Result<RowStream<AssetRecord>, QueryError> {
        let execution = self.prepare_assets(query)?;
        self.stream(ctx, execution)
    }

    async fn asset_balances(
        &self,
        ctx: &QueryContext,
        query: &AssetBalanceQuery,
    ) -> Result<RowStream<AssetBalance>, QueryError> {
        let execution = self.prepare_asset_balances(query)?;
        self.stream(ctx, execution)
    }

    async fn account(
        &self,
        ctx: &QueryContext,
        address: &[u8],
    ) -> Result<Option<AccountSnapshot>, QueryError> {
        let options = AccountQueryOptions::new()
            .with_address(address)
            .include_holdings()
            .include_params()
            .with_limit(1);
        let page = self.accounts(ctx, &options).await?.collect_page().await?;
        Ok(page.rows.into_iter().next())
    }
}
