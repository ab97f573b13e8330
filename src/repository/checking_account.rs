use crate::eventstore::{self, Aggregate, RepositoryError};
use crate::model::{CheckingAccount, CheckingAccountEvent, CheckingAccountFields};
use crate::storage::Database;

use super::USER_RELATION;

#[derive(Clone)]
pub struct CheckingAccountRepository {
    db: Database,
}

impl CheckingAccountRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create an account and file it under each of its users
    pub fn add(&self, fields: CheckingAccountFields) -> Result<CheckingAccount, RepositoryError> {
        let event =
            eventstore::create::<CheckingAccount>(&self.db, CheckingAccountEvent::Created(fields))?;
        let account = CheckingAccount::apply(None, &event)?;
        self.index_users(&account)?;

        tracing::debug!(aggregate_id = %account.meta.id, "Created checking account");
        Ok(account)
    }

    pub fn update(
        &self,
        account: &CheckingAccount,
        payload: CheckingAccountEvent,
    ) -> Result<CheckingAccount, RepositoryError> {
        let event = eventstore::persist(&self.db, account, payload)?;
        let updated = CheckingAccount::apply(Some(account.clone()), &event)?;

        if updated.users != account.users {
            self.db.remove_relation(CheckingAccount::TYPE.as_str(), USER_RELATION, &updated.meta.id)?;
            self.index_users(&updated)?;
        }

        tracing::debug!(aggregate_id = %updated.meta.id, version = updated.meta.version, "Updated checking account");
        Ok(updated)
    }

    pub fn delete(&self, account: &CheckingAccount) -> Result<CheckingAccount, RepositoryError> {
        let event = eventstore::persist(&self.db, account, account.delete())?;
        let deleted = CheckingAccount::apply(Some(account.clone()), &event)?;
        self.db.remove_relation(CheckingAccount::TYPE.as_str(), USER_RELATION, &deleted.meta.id)?;

        tracing::debug!(aggregate_id = %deleted.meta.id, "Deleted checking account");
        Ok(deleted)
    }

    pub fn get_by_id(&self, id: &str) -> Result<CheckingAccount, RepositoryError> {
        eventstore::get_by_id(&self.db, id)
    }

    /// Ids of the accounts `user` belongs to, in the order they were filed
    pub fn find_ids_by_user(&self, user: &str) -> Result<Vec<String>, RepositoryError> {
        Ok(self
            .db
            .find_by_related_id(CheckingAccount::TYPE.as_str(), USER_RELATION, user)?)
    }

    fn index_users(&self, account: &CheckingAccount) -> Result<(), RepositoryError> {
        for user in &account.users {
            self.db.add_related_id(
                CheckingAccount::TYPE.as_str(),
                USER_RELATION,
                user,
                &account.meta.id,
            )?;
        }
        Ok(())
    }
}
