use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::response::{ApiError, AppQuery, JSend};
use crate::model::Spending;
use crate::service::ServiceError;
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Deserialize)]
pub struct MonthlySpendingsParams {
    /// Booking date of the created spendings; defaults to now
    #[serde(default)]
    pub month: Option<DateTime<Utc>>,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn health() -> Json<JSend<HealthResponse>> {
    JSend::success(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Create this month's spendings from the periodicals. Not idempotent.
pub async fn create_monthly_spendings(
    State(state): State<Arc<AppState>>,
    AppQuery(params): AppQuery<MonthlySpendingsParams>,
) -> Result<(StatusCode, Json<JSend<Vec<Spending>>>), ApiError> {
    let month = params.month.unwrap_or_else(Utc::now);
    let created = state
        .ledger
        .monthly_spendings()
        .execute(month)
        .map_err(ServiceError::from)?;
    Ok((StatusCode::CREATED, JSend::success(created)))
}
