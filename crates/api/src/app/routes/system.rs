use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, sse::Event as SseEvent},
    Json,
};

use crate::app::errors::ApiError;
use crate::app::services::{self, AppServices};
use crate::context::PrincipalContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<impl IntoResponse, ApiError> {
    let role_id = services
        .authz()
        .users()
        .get_user_role_id(principal.user_id())
        .await?;

    Ok(Json(serde_json::json!({
        "user_id": principal.user_id(),
        "role_id": role_id,
    })))
}

/// GET /me/role - the caller's own role assignment and role document.
pub async fn my_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<impl IntoResponse, ApiError> {
    let publication = services
        .authz()
        .publish_user_role(Some(principal.user_id()))
        .await?;
    Ok(Json(publication))
}

pub async fn stream(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Sse<impl tokio_stream::Stream<Item = Result<SseEvent, std::convert::Infallible>>> {
    services::user_sse_stream(services, principal.user_id().clone())
}
