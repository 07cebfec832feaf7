//! Common test utilities for row-matching integration tests.

#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use row_matching::clients::{MockContributionConfirmer, MockOrdersLookup, MockRowUpdater};
use row_matching::config::DialogConfig;
use row_matching::models::{
    AccountRef, Amount, CandidateOrder, ColumnMapping, CsvConfig, ImportStats, ImportedRow,
    OrderStatus, PendingContributionData, TransactionsImport,
};
use row_matching::services::{Collaborators, EntityCache, MatchDialog, RecordingNotifier};
use std::collections::BTreeMap;
use std::sync::{Arc, Once};

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,row_matching=debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub const IMPORT_ID: &str = "import-1";
pub const ROW_ID: &str = "row-1";
pub const HOST_ID: &str = "host-1";

pub fn host() -> AccountRef {
    AccountRef {
        id: HOST_ID.to_string(),
        slug: Some("opensource".to_string()),
        name: Some("Open Source Collective".to_string()),
    }
}

pub fn import() -> TransactionsImport {
    TransactionsImport {
        id: IMPORT_ID.to_string(),
        account: host(),
        csv_config: Some(CsvConfig {
            columns: ColumnMapping {
                date: Some("Date".to_string()),
                amount: Some("Amount".to_string()),
                credit: None,
                debit: None,
            },
        }),
        stats: ImportStats {
            total: 10,
            ignored: 1,
            expenses: 2,
            orders: 3,
            processed: 6,
        },
    }
}

pub fn row(value_in_cents: i64) -> ImportedRow {
    let mut raw_value = BTreeMap::new();
    raw_value.insert("Date".to_string(), "2024-03-15".to_string());
    raw_value.insert("Amount".to_string(), "123.45".to_string());
    raw_value.insert("Description".to_string(), "WIRE FROM ACME CORP".to_string());
    raw_value.insert("Reference".to_string(), "".to_string());

    ImportedRow {
        id: ROW_ID.to_string(),
        import_id: IMPORT_ID.to_string(),
        amount: Amount::new(value_in_cents, "USD"),
        date: Utc.with_ymd_and_hms(2024, 3, 15, 14, 30, 0).unwrap(),
        raw_value,
        order: None,
    }
}

pub fn order(id: &str, status: Option<OrderStatus>, value_in_cents: i64) -> CandidateOrder {
    CandidateOrder {
        id: id.to_string(),
        legacy_id: 1000 + id.len() as i64,
        status,
        description: Some(format!("Contribution {}", id)),
        created_at: None,
        frequency: None,
        total_amount: Amount::new(value_in_cents, "USD"),
        platform_tip_amount: None,
        pending_contribution_data: Some(PendingContributionData {
            expected_at: None,
            payment_method: Some("BANK_TRANSFER".to_string()),
            ponumber: Some("PO-1".to_string()),
            memo: None,
            from_account_info: None,
        }),
        from_account: AccountRef::new("acme"),
        to_account: AccountRef::new("collective"),
        tier: None,
    }
}

/// Mocks plus the shared cache, kept so tests can inspect them afterwards.
pub struct TestHarness {
    pub orders: Arc<MockOrdersLookup>,
    pub confirmer: Arc<MockContributionConfirmer>,
    pub row_updater: Arc<MockRowUpdater>,
    pub cache: Arc<EntityCache>,
    pub notifier: Arc<RecordingNotifier>,
}

impl TestHarness {
    pub fn new(candidates: Vec<CandidateOrder>) -> Self {
        Self::with_mocks(
            MockOrdersLookup::new(candidates.clone()),
            MockContributionConfirmer::new(candidates),
            MockRowUpdater::new(),
        )
    }

    pub fn with_mocks(
        orders: MockOrdersLookup,
        confirmer: MockContributionConfirmer,
        row_updater: MockRowUpdater,
    ) -> Self {
        init_tracing();
        Self {
            orders: Arc::new(orders),
            confirmer: Arc::new(confirmer),
            row_updater: Arc::new(row_updater),
            cache: Arc::new(EntityCache::new()),
            notifier: Arc::new(RecordingNotifier::new()),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            orders: self.orders.clone(),
            confirmer: self.confirmer.clone(),
            row_updater: self.row_updater.clone(),
            cache: self.cache.clone(),
            notifier: self.notifier.clone(),
        }
    }

    pub fn open_dialog(&self, value_in_cents: i64) -> MatchDialog {
        self.open_dialog_with(DialogConfig::default(), value_in_cents)
    }

    pub fn open_dialog_with(&self, settings: DialogConfig, value_in_cents: i64) -> MatchDialog {
        MatchDialog::open(self.collaborators(), settings, import(), row(value_in_cents))
            .expect("Failed to open dialog")
    }

    pub fn stats(&self) -> ImportStats {
        self.cache
            .import_stats(IMPORT_ID)
            .unwrap()
            .expect("Import should be cached")
    }
}
