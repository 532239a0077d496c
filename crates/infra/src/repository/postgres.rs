//! Postgres-backed roles and users collections.
//!
//! Permission sets are stored as `TEXT[]` columns. Every set update is a
//! single `UPDATE ... RETURNING` statement, so concurrent add/remove calls
//! on the same role never lose each other's writes.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Duplicate` |
//! | Database (other) | Any other | `Backend` |
//! | PoolTimedOut / PoolClosed / Io | N/A | `Unavailable` |
//! | Other | N/A | `Backend` |

use std::collections::BTreeSet;
use std::sync::Arc;

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::warn;

use rolekit_auth::{Permission, Role, RoleRepository, StoreError, UserRepository};
use rolekit_core::{RoleId, UserId, optional_role_id};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS rbac_roles (
        id          TEXT PRIMARY KEY,
        name        TEXT NOT NULL,
        permissions TEXT[] NOT NULL DEFAULT '{}'
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS rbac_user_roles (
        user_id TEXT PRIMARY KEY,
        role_id TEXT NULL
    )
    "#,
];

/// Create the tables if they are missing. Idempotent.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), StoreError> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
    }
    Ok(())
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    let mapped = match &err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            if db_err.is_unique_violation() {
                StoreError::Duplicate(msg)
            } else {
                StoreError::Backend(msg)
            }
        }
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(format!("{operation}: {err}"))
        }
        _ => StoreError::Backend(format!("{operation}: {err}")),
    };
    warn!(operation, error = %mapped, "postgres operation failed");
    mapped
}

fn to_text_array(set: &BTreeSet<Permission>) -> Vec<String> {
    set.iter().map(|p| p.as_str().to_string()).collect()
}

fn row_to_role(row: &PgRow) -> Result<Role, StoreError> {
    let id: String = row
        .try_get("id")
        .map_err(|e| StoreError::Corrupt(format!("rbac_roles.id: {e}")))?;
    let name: String = row
        .try_get("name")
        .map_err(|e| StoreError::Corrupt(format!("rbac_roles.name: {e}")))?;
    let permissions: Vec<String> = row
        .try_get("permissions")
        .map_err(|e| StoreError::Corrupt(format!("rbac_roles.permissions: {e}")))?;

    let id = RoleId::parse(id).map_err(|e| StoreError::Corrupt(e.to_string()))?;
    Ok(Role::new(
        id,
        name,
        permissions.into_iter().map(Permission::new).collect(),
    ))
}

/// Postgres roles collection.
pub struct PostgresRoleRepository {
    pool: Arc<PgPool>,
}

impl PostgresRoleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    async fn update_returning(
        &self,
        operation: &str,
        sql: &str,
        id: &RoleId,
        permissions: &BTreeSet<Permission>,
    ) -> Result<Option<Role>, StoreError> {
        let row = sqlx::query(sql)
            .bind(id.as_str())
            .bind(to_text_array(permissions))
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;

        row.as_ref().map(row_to_role).transpose()
    }
}

#[async_trait::async_trait]
impl RoleRepository for PostgresRoleRepository {
    async fn insert(&self, role: Role) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO rbac_roles (id, name, permissions) VALUES ($1, $2, $3)")
            .bind(role.id.as_str())
            .bind(role.name.as_str())
            .bind(to_text_array(&role.permissions))
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_role", e))?;
        Ok(())
    }

    async fn delete(&self, id: &RoleId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM rbac_roles WHERE id = $1")
            .bind(id.as_str())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_role", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn find(&self, id: &RoleId) -> Result<Option<Role>, StoreError> {
        let row = sqlx::query("SELECT id, name, permissions FROM rbac_roles WHERE id = $1")
            .bind(id.as_str())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_role", e))?;

        row.as_ref().map(row_to_role).transpose()
    }

    async fn list(&self) -> Result<Vec<Role>, StoreError> {
        let rows = sqlx::query("SELECT id, name, permissions FROM rbac_roles ORDER BY id")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_roles", e))?;

        rows.iter().map(row_to_role).collect()
    }

    async fn count(&self, id: &RoleId) -> Result<u64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM rbac_roles WHERE id = $1")
            .bind(id.as_str())
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_roles", e))?;

        let total: i64 = row
            .try_get("total")
            .map_err(|e| StoreError::Corrupt(format!("failed to read count: {e}")))?;
        Ok(total.max(0) as u64)
    }

    async fn count_with_all(
        &self,
        id: &RoleId,
        required: &BTreeSet<Permission>,
    ) -> Result<u64, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS total
            FROM rbac_roles
            WHERE id = $1 AND permissions @> $2::text[]
            "#,
        )
        .bind(id.as_str())
        .bind(to_text_array(required))
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("count_roles_with_all", e))?;

        let total: i64 = row
            .try_get("total")
            .map_err(|e| StoreError::Corrupt(format!("failed to read count: {e}")))?;
        Ok(total.max(0) as u64)
    }

    async fn add_to_set(
        &self,
        id: &RoleId,
        permissions: &BTreeSet<Permission>,
    ) -> Result<Option<Role>, StoreError> {
        self.update_returning(
            "add_role_permissions",
            r#"
            UPDATE rbac_roles
            SET permissions = ARRAY(
                SELECT DISTINCT p FROM unnest(permissions || $2::text[]) AS t(p) ORDER BY p
            )
            WHERE id = $1
            RETURNING id, name, permissions
            "#,
            id,
            permissions,
        )
        .await
    }

    async fn remove_from_set(
        &self,
        id: &RoleId,
        permissions: &BTreeSet<Permission>,
    ) -> Result<Option<Role>, StoreError> {
        self.update_returning(
            "remove_role_permissions",
            r#"
            UPDATE rbac_roles
            SET permissions = ARRAY(
                SELECT p FROM unnest(permissions) AS t(p)
                WHERE NOT (p = ANY($2::text[]))
                ORDER BY p
            )
            WHERE id = $1
            RETURNING id, name, permissions
            "#,
            id,
            permissions,
        )
        .await
    }

    async fn replace_permissions(
        &self,
        id: &RoleId,
        permissions: &BTreeSet<Permission>,
    ) -> Result<Option<Role>, StoreError> {
        self.update_returning(
            "set_role_permissions",
            r#"
            UPDATE rbac_roles
            SET permissions = $2::text[]
            WHERE id = $1
            RETURNING id, name, permissions
            "#,
            id,
            permissions,
        )
        .await
    }
}

/// Postgres users collection (only the `role_id` field).
pub struct PostgresUserRepository {
    pool: Arc<PgPool>,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait::async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_role_id(&self, user_id: &UserId) -> Result<Option<RoleId>, StoreError> {
        let row = sqlx::query("SELECT role_id FROM rbac_user_roles WHERE user_id = $1")
            .bind(user_id.as_str())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_user_role", e))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let raw: Option<String> = row
            .try_get("role_id")
            .map_err(|e| StoreError::Corrupt(format!("rbac_user_roles.role_id: {e}")))?;
        Ok(optional_role_id(raw.as_deref()))
    }

    async fn set_role_id(&self, user_id: &UserId, role_id: Option<&RoleId>) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO rbac_user_roles (user_id, role_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE SET role_id = EXCLUDED.role_id
            "#,
        )
        .bind(user_id.as_str())
        .bind(role_id.map(RoleId::as_str))
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("set_user_role", e))?;
        Ok(())
    }
}
