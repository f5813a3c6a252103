//! API middleware.

#![allow(missing_docs)]

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use mutuelle_core::{
    ConversationService, DashboardService, GroupService, MessagingService, NotificationService,
};
use mutuelle_db::repositories::UserRepository;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_repo: UserRepository,
    pub conversation_service: ConversationService,
    pub messaging_service: MessagingService,
    pub notification_service: NotificationService,
    pub group_service: GroupService,
    pub dashboard_service: DashboardService,
}

/// Authentication middleware.
///
/// Resolves a bearer token against the user table and stows the user model
/// in request extensions for [`crate::extractors::AuthUser`].
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        if let Ok(Some(user)) = state.user_repo.find_by_token(token).await {
            req.extensions_mut().insert(user);
        }
    }

    next.run(req).await
}
