use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;

use crate::database::models::{CreateRoleRequest, Role, UpdateRoleRequest};
use crate::database::utils::{sql, with_timeout};
use crate::error::AppError;

#[async_trait]
pub trait RoleRepository: Send + Sync {
    async fn create(&self, restaurant_id: Uuid, req: &CreateRoleRequest) -> Result<Role, AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Role>, AppError>;
    async fn list_by_restaurant(&self, restaurant_id: Uuid) -> Result<Vec<Role>, AppError>;
    async fn update(&self, id: Uuid, req: &UpdateRoleRequest) -> Result<Role, AppError>;
    /// Fails with `AppError::BadRequest` (surfaced from a Postgres
    /// `23503`/restrict violation) if any `ScheduledShift` still references
    /// this role.
    async fn delete(&self, id: Uuid) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct PgRoleRepository {
    pool: PgPool,
    query_timeout: Duration,
}

impl PgRoleRepository {
    pub fn new(pool: PgPool, query_timeout: Duration) -> Self {
        Self { pool, query_timeout }
    }
}

#[async_trait]
impl RoleRepository for PgRoleRepository {
    async fn create(&self, restaurant_id: Uuid, req: &CreateRoleRequest) -> Result<Role, AppError> {
        let role = with_timeout(
            self.query_timeout,
            sqlx::query_as::<_, Role>(&sql(r#"
                INSERT INTO
                    roles (restaurant_id, name, color)
                VALUES
                    (?, ?, ?)
                RETURNING
                    id, restaurant_id, name, color
            "#))
            .bind(restaurant_id)
            .bind(&req.name)
            .bind(&req.color)
            .fetch_one(&self.pool),
        )
        .await?;

        Ok(role)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Role>, AppError> {
        let role = with_timeout(
            self.query_timeout,
            sqlx::query_as::<_, Role>(&sql(r#"
                SELECT id, restaurant_id, name, color FROM roles WHERE id = ?
            "#))
            .bind(id)
            .fetch_optional(&self.pool),
        )
        .await?;

        Ok(role)
    }

    async fn list_by_restaurant(&self, restaurant_id: Uuid) -> Result<Vec<Role>, AppError> {
        let roles = with_timeout(
            self.query_timeout,
            sqlx::query_as::<_, Role>(&sql(r#"
                SELECT id, restaurant_id, name, color
                FROM roles
                WHERE restaurant_id = ?
                ORDER BY name
            "#))
            .bind(restaurant_id)
            .fetch_all(&self.pool),
        )
        .await?;

        Ok(roles)
    }

    async fn update(&self, id: Uuid, req: &UpdateRoleRequest) -> Result<Role, AppError> {
        let role = with_timeout(
            self.query_timeout,
            sqlx::query_as::<_, Role>(&sql(r#"
                UPDATE roles
                SET name = ?, color = ?
                WHERE id = ?
                RETURNING id, restaurant_id, name, color
            "#))
            .bind(&req.name)
            .bind(&req.color)
            .bind(id)
            .fetch_optional(&self.pool),
        )
        .await?
        .ok_or_else(AppError::ownership_masked)?;

        Ok(role)
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        with_timeout(
            self.query_timeout,
            sqlx::query(&sql("DELETE FROM roles WHERE id = ?"))
                .bind(id)
                .execute(&self.pool),
        )
        .await?;
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryRoleRepository {
    roles: Mutex<HashMap<Uuid, Role>>,
    /// Mirrors the `ON DELETE RESTRICT` FK from `scheduled_shifts.role_id`
    /// so in-memory tests can exercise the same rejection.
    referenced: Mutex<std::collections::HashSet<Uuid>>,
}

impl InMemoryRoleRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_referenced(&self, role_id: Uuid) {
        self.referenced.lock().unwrap().insert(role_id);
    }
}

#[async_trait]
impl RoleRepository for InMemoryRoleRepository {
    async fn create(&self, restaurant_id: Uuid, req: &CreateRoleRequest) -> Result<Role, AppError> {
        let role = Role {
            id: Uuid::new_v4(),
            restaurant_id,
            name: req.name.clone(),
            color: req.color.clone(),
        };
        self.roles.lock().unwrap().insert(role.id, role.clone());
        Ok(role)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Role>, AppError> {
        Ok(self.roles.lock().unwrap().get(&id).cloned())
    }

    async fn list_by_restaurant(&self, restaurant_id: Uuid) -> Result<Vec<Role>, AppError> {
        Ok(self
            .roles
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.restaurant_id == restaurant_id)
            .cloned()
            .collect())
    }

    async fn update(&self, id: Uuid, req: &UpdateRoleRequest) -> Result<Role, AppError> {
        let mut roles = self.roles.lock().unwrap();
        let role = roles.get_mut(&id).ok_or_else(AppError::ownership_masked)?;
        role.name = req.name.clone();
        role.color = req.color.clone();
        Ok(role.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        if self.referenced.lock().unwrap().contains(&id) {
            return Err(AppError::BadRequest(
                "role is still referenced by a scheduled shift".to_string(),
            ));
        }
        self.roles.lock().unwrap().remove(&id);
        Ok(())
    }
}
