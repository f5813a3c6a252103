//! Dashboard endpoint.

use axum::{Router, extract::State, routing::get};
use mutuelle_common::AppResult;
use mutuelle_core::DashboardSummary;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Create dashboard router.
pub fn router() -> Router<AppState> {
    Router::new().route("/summary", get(get_summary))
}

/// Per-user dashboard summary.
async fn get_summary(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<DashboardSummary>> {
    let summary = state.dashboard_service.summary(&user.id).await?;

    Ok(ApiResponse::ok(summary))
}
