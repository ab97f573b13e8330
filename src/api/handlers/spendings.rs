use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::{Extension, Json};
use std::sync::Arc;

use super::ListParams;
use crate::api::middleware::{if_match_version, UserId};
use crate::api::response::{ApiError, AppJson, AppQuery, JSend, JSendPaginated};
use crate::model::{Spending, SpendingChanges};
use crate::service::NewSpending;
use crate::AppState;

pub async fn create_spending(
    State(state): State<Arc<AppState>>,
    Extension(UserId(user)): Extension<UserId>,
    Path(checking_account_id): Path<String>,
    AppJson(req): AppJson<NewSpending>,
) -> Result<(StatusCode, Json<JSend<Spending>>), ApiError> {
    let spending = state
        .ledger
        .create_spending(&user, &checking_account_id, req)?;
    Ok((StatusCode::CREATED, JSend::success(spending)))
}

/// Spendings of an account; `q` may carry `from:` and `to:` booking dates
pub async fn list_spendings(
    State(state): State<Arc<AppState>>,
    Extension(UserId(user)): Extension<UserId>,
    Path(checking_account_id): Path<String>,
    AppQuery(params): AppQuery<ListParams>,
) -> Result<Json<JSendPaginated<Spending>>, ApiError> {
    let pagination = params.pagination(&state.config)?;
    let page = state
        .ledger
        .find_spendings(&user, &checking_account_id, &params.q, pagination)?;
    Ok(JSendPaginated::page(page))
}

pub async fn get_spending(
    State(state): State<Arc<AppState>>,
    Extension(UserId(user)): Extension<UserId>,
    Path(id): Path<String>,
) -> Result<Json<JSend<Spending>>, ApiError> {
    let spending = state.ledger.get_spending(&user, &id)?;
    Ok(JSend::success(spending))
}

pub async fn update_spending(
    State(state): State<Arc<AppState>>,
    Extension(UserId(user)): Extension<UserId>,
    Path(id): Path<String>,
    headers: HeaderMap,
    AppJson(changes): AppJson<SpendingChanges>,
) -> Result<Json<JSend<Spending>>, ApiError> {
    let version = if_match_version(&headers)?;
    let spending = state.ledger.update_spending(&user, &id, version, changes)?;
    Ok(JSend::success(spending))
}

pub async fn delete_spending(
    State(state): State<Arc<AppState>>,
    Extension(UserId(user)): Extension<UserId>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.ledger.delete_spending(&user, &id)?;
    Ok(StatusCode::NO_CONTENT)
}
