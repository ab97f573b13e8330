//! spendbook - checking accounts, spendings and recurring periodicals
//!
//! This crate provides an event-sourced household ledger with:
//! - Optimistic-concurrency aggregate repositories over an append-only event log
//! - Range-queryable sorted indexes and prefix-searchable list indexes
//! - A `key:value` query tokenizer for filtering searches
//! - Balance reports folded over booked spendings
//! - Monthly materialization of periodicals into spendings
//! - redb embedded database (ACID, MVCC, crash-safe)
//! - REST API

pub mod api;
pub mod config;
pub mod eventstore;
pub mod model;
pub mod pagination;
pub mod query;
pub mod recurrence;
pub mod report;
pub mod repository;
pub mod service;
pub mod storage;
#[cfg(test)]
pub mod testutil;

use config::Config;
use service::Ledger;
use storage::Database;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub ledger: Ledger,
}

impl AppState {
    pub fn new(config: Config, db: Database) -> Self {
        let ledger = Ledger::new(db.clone(), config.index.replace_mode);
        Self { config, db, ledger }
    }
}
