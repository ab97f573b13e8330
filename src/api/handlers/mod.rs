mod checking_accounts;
mod internal;
mod periodicals;
mod reports;
mod spendings;

use serde::Deserialize;

use crate::api::response::ApiError;
use crate::config::Config;
use crate::pagination::Pagination;

/// Shared query parameters for list endpoints
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    /// Free-text query with optional `key:value` tokens
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub items_per_page: Option<usize>,
}

impl ListParams {
    pub fn pagination(&self, config: &Config) -> Result<Pagination, ApiError> {
        let items_per_page = self
            .items_per_page
            .unwrap_or(config.pagination.items_per_page);
        if items_per_page == 0 {
            return Err(ApiError::bad_request("itemsPerPage must be greater than 0"));
        }
        Ok(Pagination::new(self.offset, items_per_page))
    }
}

pub use checking_accounts::{
    create_checking_account, delete_checking_account, get_checking_account,
    list_checking_accounts, update_checking_account,
};
pub use internal::{create_monthly_spendings, health};
pub use periodicals::{create_periodical, get_periodical, list_periodicals};
pub use reports::{get_report, search_titles};
pub use spendings::{create_spending, delete_spending, get_spending, list_spendings, update_spending};
