//! Document store implementations of the role/user repository contract.

pub mod in_memory;
pub mod postgres;

pub use in_memory::{InMemoryRoleRepository, InMemoryUserRepository};
pub use postgres::{PostgresRoleRepository, PostgresUserRepository, ensure_schema};
