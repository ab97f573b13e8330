use super::{check_version, Ledger, ServiceError};
use crate::model::{CheckingAccount, CheckingAccountChanges, CheckingAccountFields};
use crate::pagination::{Page, Pagination};
use crate::query;

impl Ledger {
    pub fn create_checking_account(&self, name: &str, user: &str) -> Result<CheckingAccount, ServiceError> {
        let fields = CheckingAccountFields::new(name, user);
        fields.validate()?;
        Ok(self.checking_accounts.add(fields)?)
    }

    /// Accounts `user` belongs to. An `id:` token narrows the result to that
    /// account, which the user must belong to.
    pub fn find_checking_accounts(
        &self,
        user: &str,
        query: &str,
        pagination: Pagination,
    ) -> Result<Page<CheckingAccount>, ServiceError> {
        let filters = query::parse(query).filters()?;
        let mut ids = self.checking_accounts.find_ids_by_user(user)?;

        if let Some(id) = filters.equals("id") {
            if !ids.iter().any(|i| i == id) {
                return Err(access_denied(user, id));
            }
            ids.retain(|i| i == id);
        }

        let total = ids.len();
        let items = pagination
            .splice(&ids)
            .iter()
            .map(|id| self.checking_accounts.get_by_id(id))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(pagination.result(items, total, Some(query)))
    }

    pub fn get_checking_account(&self, user: &str, id: &str) -> Result<CheckingAccount, ServiceError> {
        let account = self.checking_accounts.get_by_id(id)?;
        if !account.has_user(user) {
            return Err(access_denied(user, id));
        }
        Ok(account)
    }

    pub fn update_checking_account(
        &self,
        user: &str,
        id: &str,
        version: u64,
        changes: CheckingAccountChanges,
    ) -> Result<CheckingAccount, ServiceError> {
        let account = self.get_checking_account(user, id)?;
        check_version(&account, version)?;
        let payload = account.update(changes)?;
        Ok(self.checking_accounts.update(&account, payload)?)
    }

    /// Periodicals of a deleted account stay stored but are no longer
    /// materialized into monthly spendings.
    pub fn delete_checking_account(
        &self,
        user: &str,
        id: &str,
        version: u64,
    ) -> Result<(), ServiceError> {
        let account = self.get_checking_account(user, id)?;
        check_version(&account, version)?;
        self.checking_accounts.delete(&account)?;
        Ok(())
    }
}

pub(super) fn access_denied(user: &str, checking_account_id: &str) -> ServiceError {
    ServiceError::AccessDenied(format!(
        "User \"{user}\" is not allowed to access checking account \"{checking_account_id}\""
    ))
}
