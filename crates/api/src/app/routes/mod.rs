use axum::{Router, routing::get};

pub mod check;
pub mod roles;
pub mod system;
pub mod users;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/me/role", get(system::my_role))
        .route("/stream", get(system::stream))
        .nest("/roles", roles::router())
        .nest("/users", users::router())
        .nest("/authz", check::router())
}
