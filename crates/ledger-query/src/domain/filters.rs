//! # Filter Options
//!
//! Immutable option sets for each query entry point. Every predicate field is
//! optional and all set fields are combined with AND; an empty option set
//! matches everything.
//!
//! `limit == 0` means unbounded. An absent or empty `next_token` starts from the
//! beginning. `limit`, `offset` and `next_token` do not contribute to the
//! filter identity, so a cursor stays valid across page sizes.

use shared_types::{address_from_slice, Address, AddressRoles, AssetId, Round, SigType, TxnType};

use super::config::QueryConfig;
use super::cursor::{FilterIdentity, IdentityHasher};
use super::errors::FilterError;

/// Options for `transactions`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    pub min_round: Option<Round>,
    pub max_round: Option<Round>,
    /// Skip the first N matching rows of this call. Not carried by cursors.
    pub offset: Option<u64>,
    pub limit: u64,
    pub asset_id: Option<AssetId>,
    pub asset_id_greater_than: Option<AssetId>,
    pub type_enum: Option<TxnType>,
    pub sig_type: Option<SigType>,
    pub note_prefix: Option<Vec<u8>>,
    pub min_algos: Option<u64>,
    pub effective_amount_gt: Option<u64>,
    pub effective_amount_lt: Option<u64>,
    pub address: Option<Vec<u8>>,
    pub address_role: Option<AddressRoles>,
    pub min_asset_amount: Option<u64>,
    pub max_asset_amount: Option<u64>,
    pub next_token: Option<String>,
}

impl TransactionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_round(mut self, round: Round) -> Self {
        self.min_round = Some(round);
        self
    }

    pub fn with_max_round(mut self, round: Round) -> Self {
        self.max_round = Some(round);
        self
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_asset_id(mut self, asset_id: AssetId) -> Self {
        self.asset_id = Some(asset_id);
        self
    }

    pub fn with_asset_id_greater_than(mut self, asset_id: AssetId) -> Self {
        self.asset_id_greater_than = Some(asset_id);
        self
    }

    pub fn with_type(mut self, txn_type: TxnType) -> Self {
        self.type_enum = Some(txn_type);
        self
    }

    pub fn with_sig_type(mut self, sig_type: SigType) -> Self {
        self.sig_type = Some(sig_type);
        self
    }

    pub fn with_note_prefix(mut self, prefix: impl Into<Vec<u8>>) -> Self {
        self.note_prefix = Some(prefix.into());
        self
    }

    pub fn with_min_algos(mut self, amount: u64) -> Self {
        self.min_algos = Some(amount);
        self
    }

    pub fn with_effective_amount_gt(mut self, amount: u64) -> Self {
        self.effective_amount_gt = Some(amount);
        self
    }

    pub fn with_effective_amount_lt(mut self, amount: u64) -> Self {
        self.effective_amount_lt = Some(amount);
        self
    }

    pub fn with_address(mut self, address: impl Into<Vec<u8>>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_address_role(mut self, roles: AddressRoles) -> Self {
        self.address_role = Some(roles);
        self
    }

    pub fn with_min_asset_amount(mut self, amount: u64) -> Self {
        self.min_asset_amount = Some(amount);
        self
    }

    pub fn with_max_asset_amount(mut self, amount: u64) -> Self {
        self.max_asset_amount = Some(amount);
        self
    }

    pub fn with_next_token(mut self, token: impl Into<String>) -> Self {
        self.next_token = Some(token.into());
        self
    }

    /// The token to resume from, if any.
    pub fn resume_token(&self) -> Option<&str> {
        non_empty(&self.next_token)
    }

    pub fn validate(&self, config: &QueryConfig) -> Result<(), FilterError> {
        check_address("Address", self.address.as_deref())?;
        if self.address_role.is_some() && self.address.is_none() {
            return Err(FilterError::RoleWithoutAddress);
        }
        if let (Some(min), Some(max)) = (self.min_round, self.max_round) {
            if min > max {
                return Err(FilterError::RoundRange { min, max });
            }
        }
        check_window(
            "EffectiveAmount",
            self.effective_amount_gt,
            self.effective_amount_lt,
        )?;
        if let (Some(min), Some(max)) = (self.min_asset_amount, self.max_asset_amount) {
            if min > max {
                return Err(FilterError::AssetAmountRange { min, max });
            }
        }
        if let Some(prefix) = &self.note_prefix {
            if prefix.len() > config.max_note_prefix_len {
                return Err(FilterError::NotePrefixTooLong {
                    len: prefix.len(),
                    max: config.max_note_prefix_len,
                });
            }
        }
        check_limit(self.limit, config)
    }

    /// Parsed address, once validated.
    pub fn address(&self) -> Result<Option<Address>, FilterError> {
        parse_address("Address", self.address.as_deref())
    }

    pub fn identity(&self) -> FilterIdentity {
        IdentityHasher::new("transactions")
            .u64("MinRound", self.min_round)
            .u64("MaxRound", self.max_round)
            .u64("AssetId", self.asset_id)
            .u64("AssetIdGreaterThan", self.asset_id_greater_than)
            .u64("TypeEnum", self.type_enum.map(|t| t.code() as u64))
            .str("SigType", self.sig_type.as_ref().map(SigType::as_str))
            .bytes("NotePrefix", self.note_prefix.as_deref())
            .u64("MinAlgos", self.min_algos)
            .u64("EffectiveAmountGt", self.effective_amount_gt)
            .u64("EffectiveAmountLt", self.effective_amount_lt)
            .bytes("Address", self.address.as_deref())
            .u64("AddressRole", self.address_role.map(|r| r.bits() as u64))
            .u64("MinAssetAmount", self.min_asset_amount)
            .u64("MaxAssetAmount", self.max_asset_amount)
            .finish()
    }
}

/// Options for `accounts`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountQueryOptions {
    /// Single-account lookup.
    pub address: Option<Vec<u8>>,
    pub has_asset_id: Option<AssetId>,
    pub algos_greater_than: Option<u64>,
    pub include_asset_holdings: bool,
    pub include_asset_params: bool,
    pub limit: u64,
    pub next_token: Option<String>,
}

impl AccountQueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_address(mut self, address: impl Into<Vec<u8>>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_asset(mut self, asset_id: AssetId) -> Self {
        self.has_asset_id = Some(asset_id);
        self
    }

    pub fn with_algos_greater_than(mut self, amount: u64) -> Self {
        self.algos_greater_than = Some(amount);
        self
    }

    pub fn include_holdings(mut self) -> Self {
        self.include_asset_holdings = true;
        self
    }

    pub fn include_params(mut self) -> Self {
        self.include_asset_params = true;
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_next_token(mut self, token: impl Into<String>) -> Self {
        self.next_token = Some(token.into());
        self
    }

    pub fn resume_token(&self) -> Option<&str> {
        non_empty(&self.next_token)
    }

    pub fn validate(&self, config: &QueryConfig) -> Result<(), FilterError> {
        check_address("Address", self.address.as_deref())?;
        check_limit(self.limit, config)
    }

    pub fn address(&self) -> Result<Option<Address>, FilterError> {
        parse_address("Address", self.address.as_deref())
    }

    pub fn identity(&self) -> FilterIdentity {
        IdentityHasher::new("accounts")
            .bytes("Address", self.address.as_deref())
            .u64("HasAssetId", self.has_asset_id)
            .u64("AlgosGreaterThan", self.algos_greater_than)
            .flag("IncludeAssetHoldings", self.include_asset_holdings)
            .flag("IncludeAssetParams", self.include_asset_params)
            .finish()
    }
}

/// Options for `assets`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetsQuery {
    /// Case-insensitive substring of the asset name or unit name.
    pub query: Option<String>,
    pub name: Option<String>,
    pub unit: Option<String>,
    pub asset_id: Option<AssetId>,
    pub asset_id_greater_than: Option<AssetId>,
    pub creator: Option<Vec<u8>>,
    pub limit: u64,
    pub next_token: Option<String>,
}

impl AssetsQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_asset_id(mut self, asset_id: AssetId) -> Self {
        self.asset_id = Some(asset_id);
        self
    }

    pub fn with_asset_id_greater_than(mut self, asset_id: AssetId) -> Self {
        self.asset_id_greater_than = Some(asset_id);
        self
    }

    pub fn with_creator(mut self, creator: impl Into<Vec<u8>>) -> Self {
        self.creator = Some(creator.into());
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_next_token(mut self, token: impl Into<String>) -> Self {
        self.next_token = Some(token.into());
        self
    }

    pub fn resume_token(&self) -> Option<&str> {
        non_empty(&self.next_token)
    }

    pub fn validate(&self, config: &QueryConfig) -> Result<(), FilterError> {
        check_address("Creator", self.creator.as_deref())?;
        for (field, value) in [
            ("Query", &self.query),
            ("Name", &self.name),
            ("Unit", &self.unit),
        ] {
            if let Some(text) = value {
                if text.len() > config.max_text_query_len {
                    return Err(FilterError::TextQueryTooLong {
                        field,
                        len: text.len(),
                        max: config.max_text_query_len,
                    });
                }
            }
        }
        check_limit(self.limit, config)
    }

    pub fn creator(&self) -> Result<Option<Address>, FilterError> {
        parse_address("Creator", self.creator.as_deref())
    }

    pub fn identity(&self) -> FilterIdentity {
        let lower = |text: &Option<String>| text.as_ref().map(|t| t.to_lowercase());
        IdentityHasher::new("assets")
            .str("Query", lower(&self.query).as_deref())
            .str("Name", lower(&self.name).as_deref())
            .str("Unit", lower(&self.unit).as_deref())
            .u64("AssetId", self.asset_id)
            .u64("AssetIdGreaterThan", self.asset_id_greater_than)
            .bytes("Creator", self.creator.as_deref())
            .finish()
    }
}

/// Options for `asset_balances`: holders of one asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetBalanceQuery {
    pub asset_id: AssetId,
    pub amount_gt: Option<u64>,
    pub amount_lt: Option<u64>,
    pub limit: u64,
    pub next_token: Option<String>,
}

impl AssetBalanceQuery {
    pub fn new(asset_id: AssetId) -> Self {
        Self {
            asset_id,
            amount_gt: None,
            amount_lt: None,
            limit: 0,
            next_token: None,
        }
    }

    pub fn with_amount_gt(mut self, amount: u64) -> Self {
        self.amount_gt = Some(amount);
        self
    }

    pub fn with_amount_lt(mut self, amount: u64) -> Self {
        self.amount_lt = Some(amount);
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_next_token(mut self, token: impl Into<String>) -> Self {
        self.next_token = Some(token.into());
        self
    }

    pub fn resume_token(&self) -> Option<&str> {
        non_empty(&self.next_token)
    }

    pub fn validate(&self, config: &QueryConfig) -> Result<(), FilterError> {
        check_window("Amount", self.amount_gt, self.amount_lt)?;
        check_limit(self.limit, config)
    }

    pub fn identity(&self) -> FilterIdentity {
        IdentityHasher::new("asset_balances")
            .u64("AssetId", Some(self.asset_id))
            .u64("AmountGt", self.amount_gt)
            .u64("AmountLt", self.amount_lt)
            .finish()
    }
}

fn non_empty(token: &Option<String>) -> Option<&str> {
    token.as_deref().filter(|t| !t.is_empty())
}

fn check_address(field: &'static str, address: Option<&[u8]>) -> Result<(), FilterError> {
    parse_address(field, address).map(|_| ())
}

fn parse_address(field: &'static str, address: Option<&[u8]>) -> Result<Option<Address>, FilterError> {
    address
        .map(|bytes| {
            address_from_slice(bytes).map_err(|_| FilterError::AddressLength {
                field,
                actual: bytes.len(),
            })
        })
        .transpose()
}

/// An exclusive `(gt, lt)` window must leave room for at least one value.
fn check_window(field: &'static str, gt: Option<u64>, lt: Option<u64>) -> Result<(), FilterError> {
    if let (Some(gt), Some(lt)) = (gt, lt) {
        if lt <= gt {
            return Err(FilterError::EmptyAmountWindow { field, gt, lt });
        }
    }
    Ok(())
}

fn check_limit(limit: u64, config: &QueryConfig) -> Result<(), FilterError> {
    if config.max_limit > 0 && limit > config.max_limit {
        return Err(FilterError::LimitTooLarge {
            limit,
            max: config.max_limit,
        });
    }
    Ok(())
}
