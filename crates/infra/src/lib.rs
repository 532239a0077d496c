//! Infrastructure layer: concrete document stores for roles and users.

pub mod repository;


pub use repository::{
    InMemoryRoleRepository, InMemoryUserRepository, PostgresRoleRepository,
    PostgresUserRepository, ensure_schema,
};
