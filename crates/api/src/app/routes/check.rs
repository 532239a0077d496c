//! Ad-hoc permission checks for clients deciding what to render.

use std::sync::Arc;

use axum::{
    extract::{Extension, rejection::JsonRejection},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};

use rolekit_core::{DomainError, UserId, optional_role_id};

use crate::app::dto::{CheckRequest, CheckResponse};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::authz::{self, ROLES_READ};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new().route("/check", post(check))
}

/// POST /authz/check
///
/// - no target: the caller, with user-level semantics
/// - `user_id`: that user (needs `roles.read` unless it is the caller)
/// - `role_id`: the role itself, with role-level semantics (needs `roles.read`);
///   a blank id is an absent role and never passes
pub async fn check(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<CheckRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = body?;
    let rbac = services.authz();

    let response = match (req.user_id, req.role_id) {
        (Some(_), Some(_)) => {
            return Err(DomainError::invalid_argument("give user_id or role_id, not both").into());
        }
        (None, Some(role_id)) => {
            authz::require(rbac, &principal, ROLES_READ).await?;
            let role_id = optional_role_id(Some(role_id.as_str()));
            let allowed = rbac.roles().role_can(&req.permissions, role_id.as_ref()).await?;
            CheckResponse {
                allowed,
                missing: None,
                reason: None,
            }
        }
        (user_id, None) => {
            let user_id = match user_id {
                Some(raw) => UserId::parse(raw)?,
                None => principal.user_id().clone(),
            };
            if !principal.is(&user_id) {
                authz::require(rbac, &principal, ROLES_READ).await?;
            }

            let explanation = rbac.explain_user_can(&req.permissions, Some(&user_id)).await?;
            CheckResponse {
                allowed: explanation.allowed,
                missing: Some(explanation.missing),
                reason: Some(explanation.reason),
            }
        }
    };

    Ok(Json(response).into_response())
}
