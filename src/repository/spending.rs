use std::collections::HashSet;

use crate::eventstore::{self, Aggregate, RepositoryError};
use crate::model::{Spending, SpendingEvent, SpendingFields};
use crate::query::SortRange;
use crate::storage::{Database, IndexReplaceMode};

use super::{booked_at_index, sort_key, CHECKING_ACCOUNT_RELATION};

#[derive(Clone)]
pub struct SpendingRepository {
    db: Database,
    replace_mode: IndexReplaceMode,
}

impl SpendingRepository {
    pub fn new(db: Database, replace_mode: IndexReplaceMode) -> Self {
        Self { db, replace_mode }
    }

    /// Create a spending, file it under its account and, when it has a
    /// booking date, in the account's bookedAt index.
    pub fn add(&self, fields: SpendingFields) -> Result<Spending, RepositoryError> {
        let event = eventstore::create::<Spending>(&self.db, SpendingEvent::Created(fields))?;
        let spending = Spending::apply(None, &event)?;

        self.db.add_related_id(
            Spending::TYPE.as_str(),
            CHECKING_ACCOUNT_RELATION,
            &spending.checking_account,
            &spending.meta.id,
        )?;
        if let Some(booked_at) = &spending.booked_at {
            self.db.index_add(
                &booked_at_index(&spending.checking_account),
                &spending.meta.id,
                &sort_key(booked_at),
            )?;
        }

        tracing::debug!(aggregate_id = %spending.meta.id, checking_account = %spending.checking_account, "Created spending");
        Ok(spending)
    }

    pub fn update(&self, spending: &Spending, payload: SpendingEvent) -> Result<Spending, RepositoryError> {
        let event = eventstore::persist(&self.db, spending, payload)?;
        let updated = Spending::apply(Some(spending.clone()), &event)?;

        let index = booked_at_index(&updated.checking_account);
        match &updated.booked_at {
            Some(booked_at) => {
                self.db
                    .index_put(&index, &updated.meta.id, &sort_key(booked_at), self.replace_mode)?
            }
            None => {
                self.db.index_remove(&index, &updated.meta.id)?;
            }
        }

        tracing::debug!(aggregate_id = %updated.meta.id, version = updated.meta.version, "Updated spending");
        Ok(updated)
    }

    pub fn delete(&self, spending: &Spending) -> Result<Spending, RepositoryError> {
        let event = eventstore::persist(&self.db, spending, spending.delete())?;
        let deleted = Spending::apply(Some(spending.clone()), &event)?;

        self.db.remove_related_id(
            Spending::TYPE.as_str(),
            CHECKING_ACCOUNT_RELATION,
            &deleted.checking_account,
            &deleted.meta.id,
        )?;
        self.db
            .index_remove(&booked_at_index(&deleted.checking_account), &deleted.meta.id)?;

        tracing::debug!(aggregate_id = %deleted.meta.id, "Deleted spending");
        Ok(deleted)
    }

    pub fn get_by_id(&self, id: &str) -> Result<Spending, RepositoryError> {
        eventstore::get_by_id(&self.db, id)
    }

    /// Spending ids of an account. Without a range they come in creation
    /// order; with one, only spendings booked within it, ordered by booking
    /// date.
    pub fn find_ids_by_checking_account(
        &self,
        checking_account_id: &str,
        range: Option<&SortRange>,
    ) -> Result<Vec<String>, RepositoryError> {
        let ids = self.db.find_by_related_id(
            Spending::TYPE.as_str(),
            CHECKING_ACCOUNT_RELATION,
            checking_account_id,
        )?;
        let Some(range) = range else {
            return Ok(ids);
        };

        let related: HashSet<String> = ids.into_iter().collect();
        let booked = self.db.index_find(
            &booked_at_index(checking_account_id),
            &range.from,
            range.to.as_deref(),
        )?;
        Ok(booked.into_iter().filter(|id| related.contains(id)).collect())
    }
}
