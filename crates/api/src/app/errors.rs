use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use rolekit_auth::{AuthzError, StoreError};
use rolekit_core::DomainError;

/// Handler error; rendered as `{ "error": code, "message": ... }`.
#[derive(Debug)]
pub enum ApiError {
    Authz(AuthzError),
    /// The request body did not parse.
    Body(String),
    NotFound(&'static str),
}

impl From<AuthzError> for ApiError {
    fn from(value: AuthzError) -> Self {
        ApiError::Authz(value)
    }
}

impl From<DomainError> for ApiError {
    fn from(value: DomainError) -> Self {
        ApiError::Authz(value.into())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        ApiError::Body(value.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ApiError::Authz(err) => authz_error_to_response(err),
            ApiError::Body(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_argument", msg),
            ApiError::NotFound(what) => {
                json_error(StatusCode::NOT_FOUND, "not_found", format!("{what} not found"))
            }
        }
    }
}

pub fn authz_error_to_response(err: AuthzError) -> axum::response::Response {
    let status = match &err {
        AuthzError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        AuthzError::NotFound(_) => StatusCode::NOT_FOUND,
        AuthzError::Forbidden { .. } => StatusCode::FORBIDDEN,
        AuthzError::Storage(store) => {
            tracing::error!(error = %store, "storage failure while serving request");
            match store {
                StoreError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            }
        }
    };

    let code = err.kind();
    match err {
        AuthzError::Forbidden { missing } => (
            status,
            axum::Json(json!({
                "error": code,
                "message": "missing required permissions",
                "missing": missing,
            })),
        )
            .into_response(),
        other => json_error(status, code, other.to_string()),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use rolekit_auth::Permission;
    use rolekit_core::RoleId;

    use super::*;

    #[test]
    fn maps_error_kinds_to_status_codes() {
        let cases = [
            (AuthzError::InvalidArgument("x".into()), StatusCode::BAD_REQUEST),
            (AuthzError::NotFound(RoleId::parse("r").unwrap()), StatusCode::NOT_FOUND),
            (
                AuthzError::Forbidden { missing: vec![Permission::new("a")] },
                StatusCode::FORBIDDEN,
            ),
            (
                AuthzError::Storage(StoreError::Backend("boom".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                AuthzError::Storage(StoreError::Unavailable("down".into())),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(authz_error_to_response(err).status(), status);
        }
    }
}
