mod checking_account;
mod periodical;
mod spending;

pub use checking_account::{
    CheckingAccount, CheckingAccountChanges, CheckingAccountEvent, CheckingAccountFields,
    DEFAULT_CURRENCY,
};
pub use periodical::{MonthMask, Periodical, PeriodicalEvent, PeriodicalFields};
pub use spending::{Spending, SpendingChanges, SpendingEvent, SpendingFields};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Kinds of event-sourced aggregates. The name partitions the event log,
/// relations and indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggregateType {
    CheckingAccount,
    Periodical,
    Spending,
}

impl AggregateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateType::CheckingAccount => "CheckingAccount",
            AggregateType::Periodical => "Periodical",
            AggregateType::Spending => "Spending",
        }
    }
}

impl fmt::Display for AggregateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bookkeeping shared by every aggregate
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateMeta {
    pub id: String,
    /// Number of events applied so far
    pub version: u64,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl AggregateMeta {
    pub fn new(id: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            version: 1,
            created_at,
            updated_at: None,
            deleted_at: None,
        }
    }

    pub fn updated(&self, at: DateTime<Utc>) -> Self {
        Self {
            version: self.version + 1,
            updated_at: Some(at),
            ..self.clone()
        }
    }

    pub fn deleted(&self, at: DateTime<Utc>) -> Self {
        Self {
            version: self.version + 1,
            updated_at: Some(at),
            deleted_at: Some(at),
            ..self.clone()
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Rejected aggregate payload
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

pub(crate) fn non_empty(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError(format!("{field} must not be empty")));
    }
    Ok(())
}
