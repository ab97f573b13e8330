use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::{check_version, Ledger, ServiceError};
use crate::model::{Spending, SpendingChanges, SpendingFields};
use crate::pagination::{Page, Pagination};
use crate::query;
use crate::repository::{category_list, title_list};

/// A spending as submitted by a user
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSpending {
    pub category: String,
    pub title: String,
    pub amount: i64,
    #[serde(default)]
    pub booked: bool,
    pub booked_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub saving: bool,
}

impl Ledger {
    pub fn create_spending(
        &self,
        user: &str,
        checking_account_id: &str,
        spending: NewSpending,
    ) -> Result<Spending, ServiceError> {
        let account = self.get_checking_account(user, checking_account_id)?;
        let fields = SpendingFields {
            checking_account: account.meta.id,
            category: spending.category,
            title: spending.title,
            amount: spending.amount,
            booked: spending.booked,
            booked_at: spending.booked_at,
            saving: spending.saving,
        };
        fields.validate()?;

        let spending = self.spendings.add(fields)?;
        self.index_spending(&spending)?;
        Ok(spending)
    }

    pub fn update_spending(
        &self,
        user: &str,
        id: &str,
        version: u64,
        changes: SpendingChanges,
    ) -> Result<Spending, ServiceError> {
        let spending = self.get_spending(user, id)?;
        check_version(&spending, version)?;
        let payload = spending.update(changes)?;

        let updated = self.spendings.update(&spending, payload)?;
        self.index_spending(&updated)?;
        Ok(updated)
    }

    /// Spendings of an account, optionally limited to a `from:`/`to:`
    /// booking date range.
    pub fn find_spendings(
        &self,
        user: &str,
        checking_account_id: &str,
        query: &str,
        pagination: Pagination,
    ) -> Result<Page<Spending>, ServiceError> {
        self.get_checking_account(user, checking_account_id)?;
        let filters = query::parse(query).filters()?;

        let ids = self
            .spendings
            .find_ids_by_checking_account(checking_account_id, filters.range())?;
        let total = ids.len();
        let items = pagination
            .splice(&ids)
            .iter()
            .map(|id| self.spendings.get_by_id(id))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(pagination.result(items, total, Some(query)))
    }

    pub fn get_spending(&self, user: &str, id: &str) -> Result<Spending, ServiceError> {
        let spending = self.spendings.get_by_id(id)?;
        self.get_checking_account(user, &spending.checking_account)?;
        Ok(spending)
    }

    pub fn delete_spending(&self, user: &str, id: &str) -> Result<(), ServiceError> {
        let spending = self.get_spending(user, id)?;
        self.spendings.delete(&spending)?;
        Ok(())
    }

    /// File the spending's category and title for autocomplete
    fn index_spending(&self, spending: &Spending) -> Result<(), ServiceError> {
        let account = &spending.checking_account;
        self.db
            .list_add(&title_list(account, &spending.category), &spending.title)?;
        self.db.list_add(&category_list(account), &spending.category)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{make_new_spending, test_ledger, utc};

    #[test]
    fn test_create_requires_access() {
        let (ledger, _temp) = test_ledger();
        let account = ledger.create_checking_account("Private", "alice").unwrap();

        let result = ledger.create_spending("mallory", &account.meta.id, make_new_spending("Pets", "Cat food"));
        assert!(matches!(result, Err(ServiceError::AccessDenied(_))));

        let result = ledger.create_spending("alice", "missing", make_new_spending("Pets", "Cat food"));
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    #[test]
    fn test_find_with_range() {
        let (ledger, _temp) = test_ledger();
        let account = ledger.create_checking_account("Private", "alice").unwrap();
        let id = &account.meta.id;

        for (title, day) in [("Second", 2), ("First", 1), ("Later", 20)] {
            let mut spending = make_new_spending("Pets", title);
            spending.booked_at = Some(utc(2015, 1, day));
            ledger.create_spending("alice", id, spending).unwrap();
        }
        ledger
            .create_spending("alice", id, make_new_spending("Pets", "Unbooked"))
            .unwrap();

        let page = ledger
            .find_spendings("alice", id, "from:2015-01-01 to:2015-01-10", Pagination::new(0, 10))
            .unwrap();
        let titles: Vec<_> = page.items.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["First", "Second"]);
        assert_eq!(page.total, 2);

        let page = ledger.find_spendings("alice", id, "", Pagination::new(0, 2)).unwrap();
        assert_eq!(page.total, 4);
        assert_eq!(page.items.len(), 2);

        let result = ledger.find_spendings("alice", id, "from:2015-02-01 to:2015-01-01", Pagination::new(0, 10));
        assert!(matches!(result, Err(ServiceError::Validation(_))));

        let result = ledger.find_spendings("mallory", id, "", Pagination::new(0, 10));
        assert!(matches!(result, Err(ServiceError::AccessDenied(_))));
    }

    #[test]
    fn test_update_checks_version_and_moves_index() {
        let (ledger, _temp) = test_ledger();
        let account = ledger.create_checking_account("Private", "alice").unwrap();
        let mut new = make_new_spending("Pets", "Cat food");
        new.booked_at = Some(utc(2015, 1, 1));
        let spending = ledger.create_spending("alice", &account.meta.id, new).unwrap();

        let changes = || SpendingChanges {
            booked_at: Some(utc(2015, 2, 1)),
            ..Default::default()
        };
        ledger
            .update_spending("alice", &spending.meta.id, 1, changes())
            .unwrap();
        let result = ledger.update_spending("alice", &spending.meta.id, 1, changes());
        assert!(matches!(result, Err(ServiceError::Conflict(_))));

        let january = ledger
            .find_spendings("alice", &account.meta.id, "from:2015-01-01 to:2015-01-31", Pagination::new(0, 10))
            .unwrap();
        assert_eq!(january.total, 0);
        let february = ledger
            .find_spendings("alice", &account.meta.id, "from:2015-02-01", Pagination::new(0, 10))
            .unwrap();
        assert_eq!(february.total, 1);
    }

    #[test]
    fn test_get_and_delete() {
        let (ledger, _temp) = test_ledger();
        let account = ledger.create_checking_account("Private", "alice").unwrap();
        let spending = ledger
            .create_spending("alice", &account.meta.id, make_new_spending("Pets", "Cat food"))
            .unwrap();

        assert!(matches!(
            ledger.get_spending("mallory", &spending.meta.id),
            Err(ServiceError::AccessDenied(_))
        ));
        assert_eq!(ledger.get_spending("alice", &spending.meta.id).unwrap().title, "Cat food");

        ledger.delete_spending("alice", &spending.meta.id).unwrap();
        assert!(matches!(
            ledger.get_spending("alice", &spending.meta.id),
            Err(ServiceError::NotFound(_))
        ));
        let page = ledger
            .find_spendings("alice", &account.meta.id, "", Pagination::new(0, 10))
            .unwrap();
        assert_eq!(page.total, 0);
    }
}
