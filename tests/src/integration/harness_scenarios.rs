//! # Harness Scenarios
//!
//! The query shapes a ledger indexer's verification harness issues, run
//! against a generated ledger and checked with the fixture oracle.
//!
//! ## Scenarios
//!
//! 1. **Asset by id**: `{AssetId: 312769, Limit: 1}` returns exactly that asset
//! 2. **Transactions by type**: `{TypeEnum: keyreg, Limit: 2}` in position order,
//!    and asset lookups that include the asset's creation
//! 3. **Account lookup**: single account with holdings and created assets
//! 4. **Asset balances**: every holder of an asset, amount windows applied
//! 5. **Corrupt rows**: undecodable bytes end the stream with one error

#[cfg(test)]
mod tests {
    use ledger_query::{
        AccountQueryOptions, AssetBalanceQuery, AssetsQuery, LedgerQueryApi, QueryContext,
        StorageError, TransactionFilter,
    };
    use shared_types::{AddressRoles, Transaction, TransactionRow, TxnPosition, TxnType};
    use tokio_stream::StreamExt;

    use crate::fixtures::{init_logging, LedgerFixture, MISSING_ASSET, USDT};

    // =============================================================================
    // ASSETS
    // =============================================================================

    #[tokio::test]
    async fn test_asset_by_id_with_limit_one() {
        init_logging();
        let fixture = LedgerFixture::standard();
        let service = fixture.service();

        let query = AssetsQuery::new().with_asset_id(USDT).with_limit(1);
        let page = service
            .assets(&QueryContext::background(), &query)
            .await
            .unwrap()
            .collect_page()
            .await
            .unwrap()
            .expect_full(1)
            .unwrap();

        assert_eq!(page.len(), 1);
        assert_eq!(page.rows[0].asset_id, USDT);
        assert_eq!(page.rows[0].params.unit_name, "USDt");
        assert!(page.next_token.is_some());
    }

    #[tokio::test]
    async fn test_missing_asset_is_a_short_page() {
        let fixture = LedgerFixture::standard();
        let service = fixture.service();

        let query = AssetsQuery::new().with_asset_id(MISSING_ASSET).with_limit(1);
        let page = service
            .assets(&QueryContext::background(), &query)
            .await
            .unwrap()
            .collect_page()
            .await
            .unwrap();

        assert!(page.is_empty());
        assert!(page.next_token.is_none());
        let short = page.expect_full(1).unwrap_err();
        assert_eq!((short.expected, short.actual), (1, 0));
    }

    #[tokio::test]
    async fn test_asset_text_search_matches_oracle() {
        let fixture = LedgerFixture::standard();
        let service = fixture.service();
        let ctx = QueryContext::background();

        for query in [
            AssetsQuery::new().with_unit("gems"),
            AssetsQuery::new().with_name("TETHER USDT"),
            AssetsQuery::new().with_query("gem"),
            AssetsQuery::new().with_asset_id_greater_than(2_002),
            AssetsQuery::new().with_creator(fixture.assets[0].creator.to_vec()),
        ] {
            let page = service
                .assets(&ctx, &query)
                .await
                .unwrap()
                .collect_page()
                .await
                .unwrap();
            assert_eq!(page.rows, fixture.expected_assets(&query), "{query:?}");
        }
    }

    // =============================================================================
    // TRANSACTIONS
    // =============================================================================

    #[tokio::test]
    async fn test_keyreg_transactions_limit_two() {
        init_logging();
        let fixture = LedgerFixture::standard();
        let service = fixture.service();

        let filter = TransactionFilter::new()
            .with_type(TxnType::KeyRegistration)
            .with_limit(2);
        let mut stream = service
            .transactions(&QueryContext::background(), &filter)
            .await
            .unwrap();

        let mut positions: Vec<TxnPosition> = Vec::new();
        while let Some(envelope) = stream.next().await {
            assert!(!envelope.is_error());
            let row = envelope.into_result().unwrap();
            assert_eq!(row.txn.txn_type, TxnType::KeyRegistration);
            positions.push(row.position());
        }

        assert!(positions.len() <= 2);
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        let expected: Vec<TxnPosition> = fixture
            .expected_transactions(&filter)
            .iter()
            .take(2)
            .map(|row| row.position())
            .collect();
        assert_eq!(positions, expected);
    }

    #[tokio::test]
    async fn test_transactions_by_asset_within_rounds() {
        let fixture = LedgerFixture::standard();
        let service = fixture.service();

        let filter = TransactionFilter::new()
            .with_asset_id(USDT)
            .with_min_round(10)
            .with_max_round(40);
        let page = service
            .transactions(&QueryContext::background(), &filter)
            .await
            .unwrap()
            .collect_page()
            .await
            .unwrap();

        assert_eq!(page.rows, fixture.expected_transactions(&filter));
        assert!(page
            .rows
            .iter()
            .all(|row| (10..=40).contains(&row.round) && row.txn.asset_id == Some(USDT)));
    }

    #[tokio::test]
    async fn test_asset_creation_found_by_asset_id() {
        let fixture = LedgerFixture::standard();
        let mut creation = Transaction::new(TxnType::AssetConfig, fixture.addresses[0]);
        creation.created_asset_id = Some(USDT);
        let creation = TransactionRow {
            round: 10_000,
            intra: 0,
            round_time: 0,
            txn: creation,
        };
        fixture.store.insert_transaction(&creation).unwrap();
        let service = fixture.service();

        let filter = TransactionFilter::new().with_asset_id(USDT);
        let page = service
            .transactions(&QueryContext::background(), &filter)
            .await
            .unwrap()
            .collect_page()
            .await
            .unwrap();

        let mut expected = fixture.expected_transactions(&filter);
        expected.push(creation);
        assert_eq!(page.rows, expected);
    }

    #[tokio::test]
    async fn test_transactions_by_address_and_role() {
        let fixture = LedgerFixture::standard();
        let service = fixture.service();
        let ctx = QueryContext::background();
        let address = fixture.addresses[3];

        for roles in [
            AddressRoles::NONE,
            AddressRoles::SENDER,
            AddressRoles::RECEIVER | AddressRoles::ASSET_RECEIVER,
        ] {
            let filter = TransactionFilter::new()
                .with_address(address.to_vec())
                .with_address_role(roles);
            let page = service
                .transactions(&ctx, &filter)
                .await
                .unwrap()
                .collect_page()
                .await
                .unwrap();
            assert_eq!(page.rows, fixture.expected_transactions(&filter), "{roles:?}");
        }
    }

    #[tokio::test]
    async fn test_offset_applies_per_call() {
        let fixture = LedgerFixture::standard();
        let service = fixture.service();

        let filter = TransactionFilter::new().with_offset(3).with_limit(4);
        let page = service
            .transactions(&QueryContext::background(), &filter)
            .await
            .unwrap()
            .collect_page()
            .await
            .unwrap();

        let expected: Vec<_> = fixture.transactions.iter().skip(3).take(4).cloned().collect();
        assert_eq!(page.rows, expected);
    }

    // =============================================================================
    // ACCOUNTS
    // =============================================================================

    #[tokio::test]
    async fn test_account_lookup() {
        let fixture = LedgerFixture::standard();
        let service = fixture.service();
        let ctx = QueryContext::background();

        for address in &fixture.addresses {
            let account = service.account(&ctx, address).await.unwrap();
            assert_eq!(account.as_ref(), fixture.account(address));
        }
        assert_eq!(service.account(&ctx, &[0xEE; 32]).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_accounts_holding_asset() {
        let fixture = LedgerFixture::standard();
        let service = fixture.service();
        let ctx = QueryContext::background();

        let options = AccountQueryOptions::new().with_asset(USDT);
        let bare = service
            .accounts(&ctx, &options)
            .await
            .unwrap()
            .collect_page()
            .await
            .unwrap();
        let expected: Vec<_> = fixture
            .expected_accounts(&options)
            .iter()
            .map(|a| a.address)
            .collect();
        let addresses: Vec<_> = bare.rows.iter().map(|a| a.address).collect();
        assert_eq!(addresses, expected);
        assert!(bare
            .rows
            .iter()
            .all(|a| a.assets.is_empty() && a.created_assets.is_empty()));

        let full = service
            .accounts(&ctx, &options.clone().include_holdings().include_params())
            .await
            .unwrap()
            .collect_page()
            .await
            .unwrap();
        assert_eq!(full.rows, fixture.expected_accounts(&options));
    }

    #[tokio::test]
    async fn test_accounts_above_balance() {
        let fixture = LedgerFixture::standard();
        let service = fixture.service();

        let options = AccountQueryOptions::new()
            .with_algos_greater_than(2_500_000)
            .include_holdings()
            .include_params();
        let page = service
            .accounts(&QueryContext::background(), &options)
            .await
            .unwrap()
            .collect_page()
            .await
            .unwrap();
        assert_eq!(page.rows, fixture.expected_accounts(&options));
    }

    // =============================================================================
    // ASSET BALANCES
    // =============================================================================

    #[tokio::test]
    async fn test_asset_balances_match_holdings() {
        let fixture = LedgerFixture::standard();
        let service = fixture.service();
        let ctx = QueryContext::background();

        for query in [
            AssetBalanceQuery::new(USDT),
            AssetBalanceQuery::new(USDT).with_amount_gt(100).with_amount_lt(800),
            AssetBalanceQuery::new(MISSING_ASSET),
        ] {
            let page = service
                .asset_balances(&ctx, &query)
                .await
                .unwrap()
                .collect_page()
                .await
                .unwrap();
            assert_eq!(page.rows, fixture.expected_balances(&query), "{query:?}");
        }
    }

    // =============================================================================
    // CORRUPT ROWS
    // =============================================================================

    #[tokio::test]
    async fn test_undecodable_row_ends_stream_with_error() {
        let fixture = LedgerFixture::standard();
        let bad = TxnPosition::new(2, 99);
        fixture
            .store
            .insert_raw_transaction(bad, vec![0xFF; 3], &[], None)
            .unwrap();
        let service = fixture.service();

        let mut stream = service
            .transactions(&QueryContext::background(), &TransactionFilter::new())
            .await
            .unwrap();
        let mut rows = 0;
        let mut errors = Vec::new();
        while let Some(envelope) = stream.next().await {
            match envelope.into_result() {
                Ok(row) => {
                    assert!(row.position() < bad);
                    rows += 1;
                }
                Err(e) => errors.push(e),
            }
        }

        let before = fixture
            .transactions
            .iter()
            .filter(|row| row.position() < bad)
            .count();
        assert_eq!(rows, before);
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], StorageError::Decode { .. }));
        assert_eq!(service.metrics().snapshot().storage_errors, 1);
    }
}
