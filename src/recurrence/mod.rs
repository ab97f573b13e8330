//! Materialization of periodicals into the spendings of a month.

pub mod scheduler;

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::eventstore::RepositoryError;
use crate::model::{MonthMask, Periodical, Spending, SpendingFields};
use crate::repository::{CheckingAccountRepository, PeriodicalRepository, SpendingRepository};

/// Creates one unbooked spending per periodical enabled in a month.
///
/// Not idempotent: executing twice for the same month creates duplicates.
/// Periodicals of deleted checking accounts are left out.
pub struct MonthlySpendingsCommand {
    checking_accounts: CheckingAccountRepository,
    periodicals: PeriodicalRepository,
    spendings: SpendingRepository,
}

impl MonthlySpendingsCommand {
    pub fn new(
        checking_accounts: CheckingAccountRepository,
        periodicals: PeriodicalRepository,
        spendings: SpendingRepository,
    ) -> Self {
        Self {
            checking_accounts,
            periodicals,
            spendings,
        }
    }

    /// Returns the created spendings, booked at `month`
    pub fn execute(&self, month: DateTime<Utc>) -> Result<Vec<Spending>, RepositoryError> {
        let periodicals = self.due(month)?;

        let mut created = Vec::with_capacity(periodicals.len());
        for periodical in &periodicals {
            created.push(self.materialize(periodical, month)?);
        }

        tracing::info!(month = %month, spendings = created.len(), "Created monthly spendings");
        Ok(created)
    }

    /// Periodicals enabled in the month of `month` whose account still exists
    pub fn due(&self, month: DateTime<Utc>) -> Result<Vec<Periodical>, RepositoryError> {
        let mut live: HashMap<String, bool> = HashMap::new();
        let mut due = Vec::new();

        for periodical in self.periodicals.find_by_month(MonthMask::of(&month))? {
            let account = &periodical.checking_account;
            let is_live = match live.get(account) {
                Some(&is_live) => is_live,
                None => {
                    let is_live = self.account_is_live(account)?;
                    live.insert(account.clone(), is_live);
                    is_live
                }
            };

            if is_live {
                due.push(periodical);
            } else {
                tracing::debug!(
                    aggregate_id = %periodical.meta.id,
                    checking_account = %account,
                    "Skipping periodical of deleted checking account"
                );
            }
        }
        Ok(due)
    }

    /// Create the unbooked spending of one periodical, booked at `month`
    pub fn materialize(
        &self,
        periodical: &Periodical,
        month: DateTime<Utc>,
    ) -> Result<Spending, RepositoryError> {
        self.spendings.add(SpendingFields {
            checking_account: periodical.checking_account.clone(),
            category: periodical.category.clone(),
            title: periodical.title.clone(),
            amount: periodical.amount,
            booked: false,
            booked_at: Some(month),
            saving: periodical.saving,
        })
    }

    // Accounts never stored are kept; only a recorded deletion disables them.
    fn account_is_live(&self, id: &str) -> Result<bool, RepositoryError> {
        match self.checking_accounts.get_by_id(id) {
            Ok(_) | Err(RepositoryError::NotFound { .. }) => Ok(true),
            Err(RepositoryError::Deleted { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
