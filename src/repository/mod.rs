//! Aggregate repositories: event store writes plus the relation and index
//! maintenance that has to follow every successful write.

mod checking_account;
mod periodical;
mod spending;

pub use checking_account::CheckingAccountRepository;
pub use periodical::PeriodicalRepository;
pub use spending::SpendingRepository;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::model::AggregateType;
use crate::storage::IndexNamespace;

pub const USER_RELATION: &str = "user";
pub const CHECKING_ACCOUNT_RELATION: &str = "checkingAccount";

/// Spendings of an account by booking date
pub fn booked_at_index(checking_account_id: &str) -> IndexNamespace {
    IndexNamespace::new(
        AggregateType::Spending,
        format!("checkingAccount:{checking_account_id}:bookedAt"),
    )
}

/// Categories used in an account
pub fn category_list(checking_account_id: &str) -> IndexNamespace {
    IndexNamespace::new(
        AggregateType::CheckingAccount,
        format!("checkingAccount:{checking_account_id}:category"),
    )
}

/// Titles used within one category of an account
pub fn title_list(checking_account_id: &str, category: &str) -> IndexNamespace {
    IndexNamespace::new(
        AggregateType::CheckingAccount,
        format!("checkingAccount:{checking_account_id}:title:category:{category}"),
    )
}

/// Lexically ordered rendering of a timestamp (`2015-01-01T00:00:00.000Z`)
pub fn sort_key(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
