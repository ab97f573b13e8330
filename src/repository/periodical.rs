use crate::eventstore::{self, Aggregate, RepositoryError};
use crate::model::{MonthMask, Periodical, PeriodicalEvent, PeriodicalFields};
use crate::storage::Database;

use super::CHECKING_ACCOUNT_RELATION;

#[derive(Clone)]
pub struct PeriodicalRepository {
    db: Database,
}

impl PeriodicalRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn add(&self, fields: PeriodicalFields) -> Result<Periodical, RepositoryError> {
        let event = eventstore::create::<Periodical>(&self.db, PeriodicalEvent::Created(fields))?;
        let periodical = Periodical::apply(None, &event)?;

        self.db.add_related_id(
            Periodical::TYPE.as_str(),
            CHECKING_ACCOUNT_RELATION,
            &periodical.checking_account,
            &periodical.meta.id,
        )?;

        tracing::debug!(aggregate_id = %periodical.meta.id, checking_account = %periodical.checking_account, "Created periodical");
        Ok(periodical)
    }

    pub fn get_by_id(&self, id: &str) -> Result<Periodical, RepositoryError> {
        eventstore::get_by_id(&self.db, id)
    }

    /// Every periodical enabled in `month`. Scans all periodicals.
    pub fn find_by_month(&self, month: MonthMask) -> Result<Vec<Periodical>, RepositoryError> {
        Ok(eventstore::find_all::<Periodical>(&self.db)?
            .into_iter()
            .filter(|p| p.is_enabled_in(month))
            .collect())
    }

    pub fn find_ids_by_checking_account(
        &self,
        checking_account_id: &str,
    ) -> Result<Vec<String>, RepositoryError> {
        Ok(self.db.find_by_related_id(
            Periodical::TYPE.as_str(),
            CHECKING_ACCOUNT_RELATION,
            checking_account_id,
        )?)
    }
}
