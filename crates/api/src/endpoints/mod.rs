//! API endpoints.

pub mod dashboard;
pub mod groups;
pub mod messaging;
pub mod notifications;

use axum::Router;

use crate::middleware::AppState;

/// Build the API router.
#[must_use]
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/messaging", messaging::router())
        .nest("/notifications", notifications::router())
        .nest("/groups", groups::router())
        .nest("/dashboard", dashboard::router())
}
