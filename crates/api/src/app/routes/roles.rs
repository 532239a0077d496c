//! Role CRUD and permission-set updates.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch},
    Json, Router,
};

use rolekit_core::RoleId;

use crate::app::dto::{CreateRoleRequest, PermissionOp, UpdatePermissionsRequest};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::authz::{self, ROLES_MANAGE, ROLES_READ};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_roles).post(create_role))
        .route("/:id", get(get_role).delete(delete_role))
        .route("/:id/permissions", patch(update_permissions))
}

/// GET /roles
pub async fn list_roles(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<Response, ApiError> {
    authz::require(services.authz(), &principal, ROLES_READ).await?;

    let roles = services.authz().publish_roles().await?;
    Ok(Json(serde_json::json!({ "roles": roles })).into_response())
}

/// POST /roles
pub async fn create_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<CreateRoleRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    authz::require(services.authz(), &principal, ROLES_MANAGE).await?;
    let Json(req) = body?;

    let role = services
        .authz()
        .roles()
        .create_role(&req.name, &req.permissions)
        .await?;
    Ok((StatusCode::CREATED, Json(role)).into_response())
}

/// GET /roles/:id
pub async fn get_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    authz::require(services.authz(), &principal, ROLES_READ).await?;
    let role_id = RoleId::parse(id)?;

    match services.authz().publish_role(&role_id).await? {
        Some(role) => Ok(Json(role).into_response()),
        None => Err(ApiError::NotFound("role")),
    }
}

/// DELETE /roles/:id
///
/// Users still pointing at the role keep the reference; it grants nothing.
pub async fn delete_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    authz::require(services.authz(), &principal, ROLES_MANAGE).await?;
    let role_id = RoleId::parse(id)?;

    if services.authz().roles().delete_role(&role_id).await? {
        Ok(StatusCode::NO_CONTENT.into_response())
    } else {
        Err(ApiError::NotFound("role"))
    }
}

/// PATCH /roles/:id/permissions
pub async fn update_permissions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<UpdatePermissionsRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    authz::require(services.authz(), &principal, ROLES_MANAGE).await?;
    let role_id = RoleId::parse(id)?;
    let Json(req) = body?;

    let roles = services.authz().roles();
    let updated = match req.op {
        PermissionOp::Add => roles.add_permissions(&req.permissions, &role_id).await?,
        PermissionOp::Remove => roles.remove_permissions(&req.permissions, &role_id).await?,
        PermissionOp::Set => roles.set_permissions(&req.permissions, &role_id).await?,
    };

    updated
        .map(|role| Json(role).into_response())
        .ok_or(ApiError::NotFound("role"))
}
