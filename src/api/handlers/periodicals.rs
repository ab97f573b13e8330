use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use std::sync::Arc;

use super::ListParams;
use crate::api::middleware::UserId;
use crate::api::response::{ApiError, AppJson, AppQuery, JSend, JSendPaginated};
use crate::model::Periodical;
use crate::service::NewPeriodical;
use crate::AppState;

pub async fn create_periodical(
    State(state): State<Arc<AppState>>,
    Extension(UserId(user)): Extension<UserId>,
    Path(checking_account_id): Path<String>,
    AppJson(req): AppJson<NewPeriodical>,
) -> Result<(StatusCode, Json<JSend<Periodical>>), ApiError> {
    let periodical = state
        .ledger
        .create_periodical(&user, &checking_account_id, req)?;
    Ok((StatusCode::CREATED, JSend::success(periodical)))
}

pub async fn list_periodicals(
    State(state): State<Arc<AppState>>,
    Extension(UserId(user)): Extension<UserId>,
    Path(checking_account_id): Path<String>,
    AppQuery(params): AppQuery<ListParams>,
) -> Result<Json<JSendPaginated<Periodical>>, ApiError> {
    let pagination = params.pagination(&state.config)?;
    let page = state
        .ledger
        .find_periodicals(&user, &checking_account_id, pagination)?;
    Ok(JSendPaginated::page(page))
}

pub async fn get_periodical(
    State(state): State<Arc<AppState>>,
    Extension(UserId(user)): Extension<UserId>,
    Path(id): Path<String>,
) -> Result<Json<JSend<Periodical>>, ApiError> {
    let periodical = state.ledger.get_periodical(&user, &id)?;
    Ok(JSend::success(periodical))
}
