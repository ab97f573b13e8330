use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::{Extension, Json};
use serde::Deserialize;
use std::sync::Arc;

use super::ListParams;
use crate::api::middleware::{if_match_version, UserId};
use crate::api::response::{ApiError, AppJson, AppQuery, JSend, JSendPaginated};
use crate::model::{CheckingAccount, CheckingAccountChanges};
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateCheckingAccountRequest {
    pub name: String,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn create_checking_account(
    State(state): State<Arc<AppState>>,
    Extension(UserId(user)): Extension<UserId>,
    AppJson(req): AppJson<CreateCheckingAccountRequest>,
) -> Result<(StatusCode, Json<JSend<CheckingAccount>>), ApiError> {
    let account = state.ledger.create_checking_account(&req.name, &user)?;
    Ok((StatusCode::CREATED, JSend::success(account)))
}

pub async fn list_checking_accounts(
    State(state): State<Arc<AppState>>,
    Extension(UserId(user)): Extension<UserId>,
    AppQuery(params): AppQuery<ListParams>,
) -> Result<Json<JSendPaginated<CheckingAccount>>, ApiError> {
    let pagination = params.pagination(&state.config)?;
    let page = state
        .ledger
        .find_checking_accounts(&user, &params.q, pagination)?;
    Ok(JSendPaginated::page(page))
}

pub async fn get_checking_account(
    State(state): State<Arc<AppState>>,
    Extension(UserId(user)): Extension<UserId>,
    Path(id): Path<String>,
) -> Result<Json<JSend<CheckingAccount>>, ApiError> {
    let account = state.ledger.get_checking_account(&user, &id)?;
    Ok(JSend::success(account))
}

pub async fn update_checking_account(
    State(state): State<Arc<AppState>>,
    Extension(UserId(user)): Extension<UserId>,
    Path(id): Path<String>,
    headers: HeaderMap,
    AppJson(changes): AppJson<CheckingAccountChanges>,
) -> Result<Json<JSend<CheckingAccount>>, ApiError> {
    let version = if_match_version(&headers)?;
    let account = state
        .ledger
        .update_checking_account(&user, &id, version, changes)?;
    Ok(JSend::success(account))
}

pub async fn delete_checking_account(
    State(state): State<Arc<AppState>>,
    Extension(UserId(user)): Extension<UserId>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let version = if_match_version(&headers)?;
    state.ledger.delete_checking_account(&user, &id, version)?;
    Ok(StatusCode::NO_CONTENT)
}
