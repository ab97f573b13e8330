use super::{Ledger, ServiceError};
use crate::pagination::{Page, Pagination};
use crate::query::{self, QueryError};
use crate::report::{build_report, Report};
use crate::repository::{category_list, title_list};
use crate::storage::sort_index::MAX_SORT_KEY_SUFFIX;

impl Ledger {
    /// Totals of the account's booked spendings, optionally limited to a
    /// `from:`/`to:` booking date range.
    pub fn get_report(
        &self,
        user: &str,
        checking_account_id: &str,
        query: &str,
    ) -> Result<Report, ServiceError> {
        let account = self.get_checking_account(user, checking_account_id)?;
        let filters = query::parse(query).filters()?;

        let spendings = self
            .spendings
            .find_ids_by_checking_account(&account.meta.id, filters.range())?
            .iter()
            .map(|id| self.spendings.get_by_id(id))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(build_report(&account.meta.id, &spendings)?)
    }

    /// Autocomplete over the titles of one category (`category:<name>`) or,
    /// with `in:category`, over the categories. The residual text is the
    /// prefix.
    pub fn search_titles(
        &self,
        user: &str,
        checking_account_id: &str,
        query: &str,
        pagination: Pagination,
    ) -> Result<Page<String>, ServiceError> {
        let account = self.get_checking_account(user, checking_account_id)?;
        let parsed = query::parse(query);
        let filters = parsed.filters()?;

        let namespace = match filters.equals("in") {
            Some("category") => category_list(&account.meta.id),
            Some("title") | None => {
                let category = filters.equals("category").ok_or(QueryError::MissingToken("category"))?;
                title_list(&account.meta.id, category)
            }
            Some(other) => return Err(QueryError::UnknownList(other.to_string()).into()),
        };

        let upper = format!("{}{MAX_SORT_KEY_SUFFIX}", parsed.text);
        let items = self.db.list_find(&namespace, &parsed.text, Some(&upper))?;
        let total = items.len();
        Ok(pagination.result(pagination.splice(&items), total, Some(query)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::NewSpending;
    use crate::testutil::{make_new_spending, test_ledger, utc};

    fn booked(category: &str, title: &str, amount: i64, saving: bool, day: u32) -> NewSpending {
        NewSpending {
            amount,
            booked: true,
            booked_at: Some(utc(2015, 1, day)),
            saving,
            ..make_new_spending(category, title)
        }
    }

    #[test]
    fn test_report_over_booked_spendings() {
        let (ledger, _temp) = test_ledger();
        let account = ledger.create_checking_account("Private", "alice").unwrap();
        let id = &account.meta.id;

        ledger.create_spending("alice", id, booked("Salary", "January", 300_000, false, 1)).unwrap();
        ledger.create_spending("alice", id, booked("Pets", "Cat food", -1_500, false, 2)).unwrap();
        ledger.create_spending("alice", id, booked("Savings", "Rainy day", -50_000, true, 3)).unwrap();
        let mut forecast = booked("Pets", "Vet", -20_000, false, 4);
        forecast.booked = false;
        ledger.create_spending("alice", id, forecast).unwrap();

        let report = ledger.get_report("alice", id, "").unwrap();
        assert_eq!(report.checking_account_id, *id);
        assert_eq!(report.income, 300_000);
        assert_eq!(report.spendings, -1_500);
        assert_eq!(report.savings, -50_000);
        assert_eq!(report.balance, 248_500);

        let report = ledger.get_report("alice", id, "from:2015-01-02 to:2015-01-31").unwrap();
        assert_eq!(report.income, 0);
        assert_eq!(report.balance, -51_500);

        assert!(matches!(
            ledger.get_report("mallory", id, ""),
            Err(ServiceError::AccessDenied(_))
        ));
    }

    #[test]
    fn test_report_totals_out_of_range() {
        let (ledger, _temp) = test_ledger();
        let account = ledger.create_checking_account("Private", "alice").unwrap();
        let id = &account.meta.id;

        ledger.create_spending("alice", id, booked("Lottery", "Jackpot", i64::MAX, false, 1)).unwrap();
        assert_eq!(ledger.get_report("alice", id, "").unwrap().balance, i64::MAX);

        ledger.create_spending("alice", id, booked("Misc", "Found a coin", 1, false, 2)).unwrap();
        assert!(matches!(
            ledger.get_report("alice", id, ""),
            Err(ServiceError::Validation(_))
        ));
        // A range excluding the second booking still reports
        let report = ledger.get_report("alice", id, "to:2015-01-01T23:59:59.999Z").unwrap();
        assert_eq!(report.income, i64::MAX);
    }

    #[test]
    fn test_search_titles_and_categories() {
        let (ledger, _temp) = test_ledger();
        let account = ledger.create_checking_account("Private", "alice").unwrap();
        let id = &account.meta.id;

        for (category, title) in [
            ("Pets", "Cat food"),
            ("Pets", "Cat litter"),
            ("Pets", "Dog toy"),
            ("Pets", "Cat food"),
            ("Food", "Cake"),
        ] {
            ledger.create_spending("alice", id, make_new_spending(category, title)).unwrap();
        }

        let page = ledger
            .search_titles("alice", id, "category:Pets Cat", Pagination::new(0, 10))
            .unwrap();
        assert_eq!(page.items, vec!["Cat food", "Cat litter"]);
        assert_eq!(page.total, 2);

        let page = ledger
            .search_titles("alice", id, "category:Pets", Pagination::new(0, 2))
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 2);

        let page = ledger
            .search_titles("alice", id, "in:category", Pagination::new(0, 10))
            .unwrap();
        assert_eq!(page.items, vec!["Food", "Pets"]);

        let page = ledger
            .search_titles("alice", id, "in:category P", Pagination::new(0, 10))
            .unwrap();
        assert_eq!(page.items, vec!["Pets"]);
    }

    #[test]
    fn test_search_titles_validation() {
        let (ledger, _temp) = test_ledger();
        let account = ledger.create_checking_account("Private", "alice").unwrap();
        let id = &account.meta.id;

        assert!(matches!(
            ledger.search_titles("alice", id, "Cat", Pagination::new(0, 10)),
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            ledger.search_titles("alice", id, "in:bogus", Pagination::new(0, 10)),
            Err(ServiceError::Validation(_))
        ));
    }
}
