//! Shared test helpers, available to all `#[cfg(test)]` modules in the crate.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use tempfile::TempDir;

use crate::config::{Config, IndexConfig, PaginationConfig, RecurrenceConfig, ServerConfig};
use crate::model::{AggregateMeta, MonthMask, PeriodicalFields, Spending, SpendingFields};
use crate::service::{Ledger, NewPeriodical, NewSpending};
use crate::storage::{Database, IndexReplaceMode};
use crate::AppState;

/// Open a fresh database in a temporary directory.
///
/// Returns both the `Database` and the `TempDir` guard; the caller must
/// keep the `TempDir` alive for the duration of the test.
pub fn setup_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db = Database::open(temp_dir.path()).unwrap();
    (db, temp_dir)
}

/// A `Config` suitable for unit tests (no scheduler, replace semantics).
pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            bind_address: "127.0.0.1:8080".to_string(),
            data_dir: "/tmp/test".to_string(),
        },
        pagination: PaginationConfig::default(),
        index: IndexConfig::default(),
        recurrence: RecurrenceConfig {
            enabled: false,
            interval_seconds: 1,
        },
    }
}

/// Build a full `Arc<AppState>` around a fresh database.
pub fn test_state() -> (Arc<AppState>, TempDir) {
    let (db, temp_dir) = setup_db();
    (Arc::new(AppState::new(test_config(), db)), temp_dir)
}

pub fn test_ledger() -> (Ledger, TempDir) {
    let (db, temp_dir) = setup_db();
    (Ledger::new(db, IndexReplaceMode::Replace), temp_dir)
}

/// Midnight UTC on the given date
pub fn utc(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

/// An in-memory spending, never persisted
pub fn make_spending(checking_account: &str, amount: i64, booked: bool, saving: bool) -> Spending {
    Spending {
        meta: AggregateMeta::new(uuid::Uuid::new_v4().to_string(), Utc::now()),
        checking_account: checking_account.to_string(),
        category: "Misc".to_string(),
        title: "Something".to_string(),
        amount,
        booked,
        booked_at: None,
        saving,
    }
}

pub fn make_spending_fields(checking_account: &str, booked_at: Option<DateTime<Utc>>) -> SpendingFields {
    SpendingFields {
        checking_account: checking_account.to_string(),
        category: "Pets".to_string(),
        title: "Cat food".to_string(),
        amount: -1_234,
        booked: booked_at.is_some(),
        booked_at,
        saving: false,
    }
}

pub fn make_periodical_fields(checking_account: &str, enabled_in: MonthMask) -> PeriodicalFields {
    PeriodicalFields {
        checking_account: checking_account.to_string(),
        category: "Home".to_string(),
        title: "Rent".to_string(),
        amount: -80_000,
        estimate: false,
        starts_at: None,
        enabled_in,
        saving: false,
    }
}

pub fn make_new_spending(category: &str, title: &str) -> NewSpending {
    NewSpending {
        category: category.to_string(),
        title: title.to_string(),
        amount: -1_000,
        booked: false,
        booked_at: None,
        saving: false,
    }
}

pub fn make_new_periodical(title: &str, amount: i64) -> NewPeriodical {
    NewPeriodical {
        category: "Home".to_string(),
        title: title.to_string(),
        amount,
        estimate: false,
        starts_at: None,
        saving: false,
        enabled_in: Vec::new(),
    }
}
