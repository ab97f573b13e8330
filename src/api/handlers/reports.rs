use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::ListParams;
use crate::api::middleware::UserId;
use crate::api::response::{ApiError, AppQuery, JSend, JSendPaginated};
use crate::report::Report;
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct ReportParams {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize)]
pub struct TitleResponse {
    pub title: String,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn get_report(
    State(state): State<Arc<AppState>>,
    Extension(UserId(user)): Extension<UserId>,
    Path(checking_account_id): Path<String>,
    AppQuery(params): AppQuery<ReportParams>,
) -> Result<Json<JSend<Report>>, ApiError> {
    let report = state
        .ledger
        .get_report(&user, &checking_account_id, &params.q)?;
    Ok(JSend::success(report))
}

/// Autocomplete: `q=category:Pets Ca` or `q=in:category P`
pub async fn search_titles(
    State(state): State<Arc<AppState>>,
    Extension(UserId(user)): Extension<UserId>,
    Path(checking_account_id): Path<String>,
    AppQuery(params): AppQuery<ListParams>,
) -> Result<Json<JSendPaginated<TitleResponse>>, ApiError> {
    let pagination = params.pagination(&state.config)?;
    let page = state
        .ledger
        .search_titles(&user, &checking_account_id, &params.q, pagination)?;
    Ok(JSendPaginated::page(page.map(|title| TitleResponse { title })))
}
