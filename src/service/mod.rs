//! Use cases. Every operation acts on behalf of a user and checks that the
//! user belongs to the checking account involved.

mod checking_account;
mod periodical;
mod report;
mod spending;

pub use periodical::NewPeriodical;
pub use spending::NewSpending;

use thiserror::Error;

use crate::eventstore::{Aggregate, RepositoryError};
use crate::model::ValidationError;
use crate::query::QueryError;
use crate::recurrence::MonthlySpendingsCommand;
use crate::report::ReportError;
use crate::repository::{CheckingAccountRepository, PeriodicalRepository, SpendingRepository};
use crate::storage::{Database, DatabaseError, IndexReplaceMode};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    AccessDenied(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Internal(String),
    #[error(transparent)]
    Database(DatabaseError),
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { .. } | RepositoryError::Deleted { .. } => {
                ServiceError::NotFound(err.to_string())
            }
            RepositoryError::Conflict { .. } => ServiceError::Conflict(err.to_string()),
            RepositoryError::UnhandledEvent { .. } => ServiceError::Internal(err.to_string()),
            RepositoryError::Database(e) => ServiceError::Database(e),
        }
    }
}

impl From<DatabaseError> for ServiceError {
    fn from(err: DatabaseError) -> Self {
        ServiceError::Database(err)
    }
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::Validation(err.0)
    }
}

impl From<QueryError> for ServiceError {
    fn from(err: QueryError) -> Self {
        ServiceError::Validation(err.to_string())
    }
}

impl From<ReportError> for ServiceError {
    fn from(err: ReportError) -> Self {
        ServiceError::Validation(err.to_string())
    }
}

/// Entry point for all use cases. Cheap to clone.
#[derive(Clone)]
pub struct Ledger {
    db: Database,
    checking_accounts: CheckingAccountRepository,
    spendings: SpendingRepository,
    periodicals: PeriodicalRepository,
}

impl Ledger {
    pub fn new(db: Database, replace_mode: IndexReplaceMode) -> Self {
        Self {
            checking_accounts: CheckingAccountRepository::new(db.clone()),
            spendings: SpendingRepository::new(db.clone(), replace_mode),
            periodicals: PeriodicalRepository::new(db.clone()),
            db,
        }
    }

    /// The command turning this month's periodicals into spendings
    pub fn monthly_spendings(&self) -> MonthlySpendingsCommand {
        MonthlySpendingsCommand::new(
            self.checking_accounts.clone(),
            self.periodicals.clone(),
            self.spendings.clone(),
        )
    }
}

/// Reject the write if the caller's copy of the aggregate is outdated
fn check_version<A: Aggregate>(aggregate: &A, their_version: u64) -> Result<(), ServiceError> {
    let meta = aggregate.meta();
    if meta.version != their_version {
        return Err(ServiceError::Conflict(format!(
            "{} \"{}\" has been modified. Your version is {} our version is {}",
            A::TYPE,
            meta.id,
            their_version,
            meta.version
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AggregateType, CheckingAccountFields};
    use crate::testutil::setup_db;

    #[test]
    fn test_repository_errors_map_to_taxonomy() {
        let not_found = RepositoryError::NotFound {
            aggregate_type: AggregateType::Spending,
            aggregate_id: "x".to_string(),
        };
        assert!(matches!(ServiceError::from(not_found), ServiceError::NotFound(_)));

        let conflict = RepositoryError::Conflict {
            aggregate_type: AggregateType::Spending,
            aggregate_id: "x".to_string(),
            expected: 1,
            actual: 2,
        };
        assert!(matches!(ServiceError::from(conflict), ServiceError::Conflict(_)));

        let invalid = QueryError::UnknownList("bogus".to_string());
        assert!(matches!(ServiceError::from(invalid), ServiceError::Validation(_)));
    }

    #[test]
    fn test_check_version() {
        let (db, _temp) = setup_db();
        let ledger = Ledger::new(db, IndexReplaceMode::Replace);
        let account = ledger
            .checking_accounts
            .add(CheckingAccountFields::new("Private", "alice"))
            .unwrap();

        assert!(check_version(&account, 1).is_ok());
        let err = check_version(&account, 3).unwrap_err();
        assert!(err.to_string().contains("Your version is 3 our version is 1"));
    }
}
