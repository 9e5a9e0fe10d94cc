//! # Filter Compiler
//!
//! Turns validated filter options into a scan plan plus residual predicates.
//!
//! Access paths are chosen most selective first:
//!
//! 1. exact lookup (asset id, single address)
//! 2. range bound on the position key (rounds, asset id greater-than)
//! 3. text / prefix filters (still a primary scan, fully residual)
//! 4. full scan
//!
//! Every dimension yields rows in primary position order, so the choice of
//! access path never changes the order of results. Fields the access path
//! does not consume become residual predicates.

use shared_types::TxnPosition;
use std::fmt;
use std::ops::Bound;

use super::config::QueryConfig;
use super::cursor::FilterIdentity;
use super::entity::{
    AccountEntity, AccountProjection, AssetEntity, BalanceEntity, QueryEntity, TransactionEntity,
};
use super::errors::FilterError;
use super::filters::{AccountQueryOptions, AssetBalanceQuery, AssetsQuery, TransactionFilter};
use super::position::{range_is_empty, tighter_lower, PositionKey};
use super::predicates::{AccountPredicate, AssetPredicate, BalancePredicate, TxnPredicate};
use crate::ports::outbound::ScanDimension;

/// How selective the chosen access path is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AccessTier {
    ExactLookup,
    RangeBound,
    TextPrefix,
    FullScan,
}

impl fmt::Display for AccessTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AccessTier::ExactLookup => "exact",
            AccessTier::RangeBound => "range",
            AccessTier::TextPrefix => "text",
            AccessTier::FullScan => "full",
        })
    }
}

/// Dimension and position range a query iterates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanPlan {
    pub dimension: ScanDimension,
    pub lower: Bound<PositionKey>,
    pub upper: Bound<PositionKey>,
    pub tier: AccessTier,
}

impl ScanPlan {
    fn new(dimension: ScanDimension, tier: AccessTier) -> Self {
        Self {
            dimension,
            lower: Bound::Unbounded,
            upper: Bound::Unbounded,
            tier,
        }
    }

    fn bounded(mut self, lower: Bound<PositionKey>, upper: Bound<PositionKey>) -> Self {
        self.lower = lower;
        self.upper = upper;
        self
    }

    /// True when the bounds admit no key at all.
    pub fn is_empty(&self) -> bool {
        range_is_empty(&self.lower, &self.upper)
    }
}

/// Everything the executor needs to run one query.
#[derive(Debug, Clone)]
pub struct CompiledQuery<E: QueryEntity> {
    pub plan: ScanPlan,
    pub residual: Vec<E::Predicate>,
    pub projection: E::Projection,
    pub limit: u64,
    pub offset: u64,
    pub identity: FilterIdentity,
}

/// Compile transaction options.
///
/// Round bounds are always folded into the scan range, whichever dimension
/// drives the scan. `AssetId` wins over `Address`; the address then stays
/// residual.
pub fn compile_transactions(
    filter: &TransactionFilter,
    config: &QueryConfig,
) -> Result<CompiledQuery<TransactionEntity>, FilterError> {
    filter.validate(config)?;
    let address = filter.address()?;
    let roles = filter.address_role.unwrap_or_default();

    let lower = filter
        .min_round
        .map_or(Bound::Unbounded, |r| Bound::Included(PositionKey::Txn(TxnPosition::round_start(r))));
    let upper = filter
        .max_round
        .map_or(Bound::Unbounded, |r| Bound::Included(PositionKey::Txn(TxnPosition::round_end(r))));
    let has_rounds = filter.min_round.is_some() || filter.max_round.is_some();

    let mut residual = Vec::new();
    let mut address_consumed = false;

    let plan = if let Some(asset_id) = filter.asset_id {
        ScanPlan::new(ScanDimension::TransactionsByAsset(asset_id), AccessTier::ExactLookup)
    } else if let Some(address) = address {
        // The address index covers every role, so only a role restriction
        // needs a residual check.
        address_consumed = roles.is_empty();
        ScanPlan::new(ScanDimension::TransactionsByAddress(address), AccessTier::ExactLookup)
    } else if has_rounds {
        ScanPlan::new(ScanDimension::Transactions, AccessTier::RangeBound)
    } else if filter.note_prefix.is_some() {
        ScanPlan::new(ScanDimension::Transactions, AccessTier::TextPrefix)
    } else {
        ScanPlan::new(ScanDimension::Transactions, AccessTier::FullScan)
    };
    let plan = plan.bounded(lower, upper);

    if let Some(address) = address {
        if !address_consumed {
            residual.push(TxnPredicate::Address { address, roles });
        }
    }
    if let Some(id) = filter.asset_id_greater_than {
        residual.push(TxnPredicate::AssetIdGreaterThan(id));
    }
    if let Some(txn_type) = filter.type_enum {
        residual.push(TxnPredicate::TypeEnum(txn_type));
    }
    if let Some(sig_type) = filter.sig_type {
        residual.push(TxnPredicate::SigType(sig_type));
    }
    if let Some(prefix) = &filter.note_prefix {
        residual.push(TxnPredicate::NotePrefix(prefix.clone()));
    }
    if let Some(min) = filter.min_algos {
        residual.push(TxnPredicate::MinAlgos(min));
    }
    if let Some(gt) = filter.effective_amount_gt {
        residual.push(TxnPredicate::EffectiveAmountGt(gt));
    }
    if let Some(lt) = filter.effective_amount_lt {
        residual.push(TxnPredicate::EffectiveAmountLt(lt));
    }
    if let Some(min) = filter.min_asset_amount {
        residual.push(TxnPredicate::MinAssetAmount(min));
    }
    if let Some(max) = filter.max_asset_amount {
        residual.push(TxnPredicate::MaxAssetAmount(max));
    }

    let compiled = CompiledQuery {
        plan,
        residual,
        projection: (),
        limit: filter.limit,
        offset: filter.offset.unwrap_or(0),
        identity: filter.identity(),
    };
    log_plan::<TransactionEntity>(&compiled);
    Ok(compiled)
}

/// Compile account options.
///
/// `AlgosGreaterThan` cannot bound the address order, so it is always residual.
pub fn compile_accounts(
    options: &AccountQueryOptions,
    config: &QueryConfig,
) -> Result<CompiledQuery<AccountEntity>, FilterError> {
    options.validate(config)?;
    let address = options.address()?;
    let mut residual = Vec::new();

    let plan = if let Some(address) = address {
        if let Some(asset_id) = options.has_asset_id {
            residual.push(AccountPredicate::HasAssetId(asset_id));
        }
        let key = PositionKey::Account(address);
        ScanPlan::new(ScanDimension::Accounts, AccessTier::ExactLookup)
            .bounded(Bound::Included(key), Bound::Included(key))
    } else if let Some(asset_id) = options.has_asset_id {
        ScanPlan::new(ScanDimension::AccountsByAsset(asset_id), AccessTier::ExactLookup)
    } else {
        ScanPlan::new(ScanDimension::Accounts, AccessTier::FullScan)
    };

    if let Some(n) = options.algos_greater_than {
        residual.push(AccountPredicate::AlgosGreaterThan(n));
    }

    let compiled = CompiledQuery {
        plan,
        residual,
        projection: AccountProjection {
            include_holdings: options.include_asset_holdings,
            include_params: options.include_asset_params,
        },
        limit: options.limit,
        offset: 0,
        identity: options.identity(),
    };
    log_plan::<AccountEntity>(&compiled);
    Ok(compiled)
}

/// Compile asset options.
///
/// `AssetIdGreaterThan` is always folded into the lower bound. Name, unit and
/// free-text filters are residual.
pub fn compile_assets(
    query: &AssetsQuery,
    config: &QueryConfig,
) -> Result<CompiledQuery<AssetEntity>, FilterError> {
    query.validate(config)?;
    let creator = query.creator()?;
    let mut residual = Vec::new();

    let has_text = query.query.is_some() || query.name.is_some() || query.unit.is_some();
    let gt_lower = query
        .asset_id_greater_than
        .map_or(Bound::Unbounded, |id| Bound::Excluded(PositionKey::Asset(id)));

    let plan = if let Some(asset_id) = query.asset_id {
        if let Some(creator) = creator {
            residual.push(AssetPredicate::Creator(creator));
        }
        let key = PositionKey::Asset(asset_id);
        ScanPlan::new(ScanDimension::Assets, AccessTier::ExactLookup)
            .bounded(tighter_lower(Bound::Included(key), gt_lower), Bound::Included(key))
    } else if let Some(creator) = creator {
        ScanPlan::new(ScanDimension::AssetsByCreator(creator), AccessTier::ExactLookup)
            .bounded(gt_lower, Bound::Unbounded)
    } else if query.asset_id_greater_than.is_some() {
        ScanPlan::new(ScanDimension::Assets, AccessTier::RangeBound)
            .bounded(gt_lower, Bound::Unbounded)
    } else if has_text {
        ScanPlan::new(ScanDimension::Assets, AccessTier::TextPrefix)
    } else {
        ScanPlan::new(ScanDimension::Assets, AccessTier::FullScan)
    };

    if let Some(name) = &query.name {
        residual.push(AssetPredicate::Name(name.to_lowercase()));
    }
    if let Some(unit) = &query.unit {
        residual.push(AssetPredicate::Unit(unit.to_lowercase()));
    }
    if let Some(text) = &query.query {
        residual.push(AssetPredicate::Query(text.to_lowercase()));
    }

    let compiled = CompiledQuery {
        plan,
        residual,
        projection: (),
        limit: query.limit,
        offset: 0,
        identity: query.identity(),
    };
    log_plan::<AssetEntity>(&compiled);
    Ok(compiled)
}

/// Compile asset balance options. The asset id always drives the scan.
pub fn compile_asset_balances(
    query: &AssetBalanceQuery,
    config: &QueryConfig,
) -> Result<CompiledQuery<BalanceEntity>, FilterError> {
    query.validate(config)?;
    let mut residual = Vec::new();
    if let Some(gt) = query.amount_gt {
        residual.push(BalancePredicate::AmountGt(gt));
    }
    if let Some(lt) = query.amount_lt {
        residual.push(BalancePredicate::AmountLt(lt));
    }

    let compiled = CompiledQuery {
        plan: ScanPlan::new(ScanDimension::AssetBalances(query.asset_id), AccessTier::ExactLookup),
        residual,
        projection: (),
        limit: query.limit,
        offset: 0,
        identity: query.identity(),
    };
    log_plan::<BalanceEntity>(&compiled);
    Ok(compiled)
}

fn log_plan<E: QueryEntity>(compiled: &CompiledQuery<E>) {
    tracing::debug!(
        entity = E::LABEL,
        dimension = %compiled.plan.dimension,
        tier = %compiled.plan.tier,
        residual = compiled.residual.len(),
        limit = compiled.limit,
        "compiled query plan"
    );
}
