//! Balance report over booked spendings.

use serde::Serialize;
use thiserror::Error;

use crate::model::Spending;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportError {
    #[error("Totals of checking account \"{0}\" exceed the supported amount range")]
    Overflow(String),
}

/// Totals in minor units. `balance == income + spendings + savings`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub checking_account_id: String,
    pub balance: i64,
    pub income: i64,
    pub spendings: i64,
    pub savings: i64,
}

impl Report {
    pub fn new(checking_account_id: impl Into<String>) -> Self {
        Self {
            checking_account_id: checking_account_id.into(),
            ..Default::default()
        }
    }

    /// Account for one booked amount, returning the new totals. `None` when a
    /// total leaves the `i64` range.
    pub fn fold(self, amount: i64, saving: bool) -> Option<Self> {
        let balance = self.balance.checked_add(amount)?;
        let report = if amount >= 0 {
            Self {
                balance,
                income: self.income.checked_add(amount)?,
                ..self
            }
        } else if saving {
            Self {
                balance,
                savings: self.savings.checked_add(amount)?,
                ..self
            }
        } else {
            Self {
                balance,
                spendings: self.spendings.checked_add(amount)?,
                ..self
            }
        };
        Some(report)
    }
}

/// Fold the booked entries of `spendings`; unbooked ones are forecasts and
/// ignored.
pub fn build_report<'a>(
    checking_account_id: &str,
    spendings: impl IntoIterator<Item = &'a Spending>,
) -> Result<Report, ReportError> {
    spendings
        .into_iter()
        .filter(|s| s.booked)
        .try_fold(Report::new(checking_account_id), |report, s| {
            report.fold(s.amount, s.saving)
        })
        .ok_or_else(|| ReportError::Overflow(checking_account_id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::make_spending;

    #[test]
    fn test_fold_branches() {
        let spendings = vec![
            make_spending("42", 100_000, true, false),
            make_spending("42", -2_500, true, false),
            make_spending("42", -10_000, true, true),
            make_spending("42", 0, true, false),
        ];
        let report = build_report("42", &spendings).unwrap();

        assert_eq!(report.checking_account_id, "42");
        assert_eq!(report.income, 100_000);
        assert_eq!(report.spendings, -2_500);
        assert_eq!(report.savings, -10_000);
        assert_eq!(report.balance, 87_500);
    }

    #[test]
    fn test_unbooked_rows_are_ignored() {
        let spendings = vec![
            make_spending("42", 5_000, false, false),
            make_spending("42", -5_000, false, true),
            make_spending("42", -1_000, false, false),
        ];
        assert_eq!(build_report("42", &spendings).unwrap(), Report::new("42"));
    }

    #[test]
    fn test_balance_equals_sum_of_parts() {
        let amounts = [-7, 0, 12, -1, 3_000, -999, 42, -42, 1];
        let spendings: Vec<_> = amounts
            .iter()
            .enumerate()
            .map(|(i, &amount)| make_spending("42", amount, i % 3 != 0, i % 2 == 0))
            .collect();

        let report = build_report("42", &spendings).unwrap();
        assert_eq!(report.balance, report.income + report.spendings + report.savings);

        let mut reversed = spendings.clone();
        reversed.reverse();
        assert_eq!(build_report("42", &reversed).unwrap(), report);
    }

    #[test]
    fn test_empty() {
        let none: Vec<Spending> = Vec::new();
        assert_eq!(build_report("42", &none).unwrap(), Report::new("42"));
    }

    #[test]
    fn test_amounts_near_the_limit() {
        let at_limit = vec![
            make_spending("42", i64::MAX, true, false),
            make_spending("42", i64::MIN + 1, true, false),
        ];
        let report = build_report("42", &at_limit).unwrap();
        assert_eq!(report.balance, 0);
        assert_eq!(report.income, i64::MAX);

        let overflowing = vec![
            make_spending("42", i64::MAX, true, false),
            make_spending("42", 1, true, false),
        ];
        assert_eq!(
            build_report("42", &overflowing),
            Err(ReportError::Overflow("42".to_string()))
        );

        let underflowing = vec![
            make_spending("42", i64::MIN, true, true),
            make_spending("42", -1, true, true),
        ];
        assert!(build_report("42", &underflowing).is_err());

        // Unbooked rows cannot overflow the totals
        let forecast = vec![
            make_spending("42", i64::MAX, true, false),
            make_spending("42", i64::MAX, false, false),
        ];
        assert!(build_report("42", &forecast).is_ok());
    }
}
