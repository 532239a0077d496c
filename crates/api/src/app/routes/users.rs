use std::sync::Arc;

use axum::{
    extract::{Extension, Path, rejection::JsonRejection},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use rolekit_core::{UserId, optional_role_id};

use crate::app::dto::{SetUserRoleRequest, UserRoleResponse};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::authz::{self, USERS_MANAGE, USERS_READ};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new().route("/:id/role", get(get_user_role).put(set_user_role))
}

/// GET /users/:id/role - callers may always read their own assignment.
pub async fn get_user_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let user_id = UserId::parse(id)?;
    if !principal.is(&user_id) {
        authz::require(services.authz(), &principal, USERS_READ).await?;
    }

    let rbac = services.authz();
    let role_id = rbac.users().get_user_role_id(&user_id).await?;
    let role = rbac.get_user_role(&user_id).await?;

    Ok(Json(UserRoleResponse { user_id, role_id, role }).into_response())
}

/// PUT /users/:id/role
pub async fn set_user_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<SetUserRoleRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    authz::require(services.authz(), &principal, USERS_MANAGE).await?;
    let user_id = UserId::parse(id)?;
    let Json(req) = body?;
    // A blank id clears the assignment, same as null.
    let role_id = optional_role_id(req.role_id.as_deref());

    let rbac = services.authz();
    rbac.users().set_user_role(&user_id, role_id.as_ref()).await?;
    let role = rbac.get_user_role(&user_id).await?;

    Ok(Json(UserRoleResponse { user_id, role_id, role }).into_response())
}
