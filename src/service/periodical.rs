use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::{Ledger, ServiceError};
use crate::model::{MonthMask, Periodical, PeriodicalFields};
use crate::pagination::{Page, Pagination};

/// A periodical as submitted by a user
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPeriodical {
    pub category: String,
    pub title: String,
    pub amount: i64,
    #[serde(default)]
    pub estimate: bool,
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub saving: bool,
    /// 1-based months; empty for every month
    #[serde(default)]
    pub enabled_in: Vec<u32>,
}

impl Ledger {
    pub fn create_periodical(
        &self,
        user: &str,
        checking_account_id: &str,
        periodical: NewPeriodical,
    ) -> Result<Periodical, ServiceError> {
        let account = self.get_checking_account(user, checking_account_id)?;
        let fields = PeriodicalFields {
            checking_account: account.meta.id,
            category: periodical.category,
            title: periodical.title,
            amount: periodical.amount,
            estimate: periodical.estimate,
            starts_at: periodical.starts_at,
            enabled_in: MonthMask::from_months(&periodical.enabled_in)?,
            saving: periodical.saving,
        };
        fields.validate()?;
        Ok(self.periodicals.add(fields)?)
    }

    pub fn find_periodicals(
        &self,
        user: &str,
        checking_account_id: &str,
        pagination: Pagination,
    ) -> Result<Page<Periodical>, ServiceError> {
        self.get_checking_account(user, checking_account_id)?;

        let ids = self.periodicals.find_ids_by_checking_account(checking_account_id)?;
        let total = ids.len();
        let items = pagination
            .splice(&ids)
            .iter()
            .map(|id| self.periodicals.get_by_id(id))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(pagination.result(items, total, None))
    }

    pub fn get_periodical(&self, user: &str, id: &str) -> Result<Periodical, ServiceError> {
        let periodical = self.periodicals.get_by_id(id)?;
        self.get_checking_account(user, &periodical.checking_account)?;
        Ok(periodical)
    }
}
