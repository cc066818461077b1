use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;

use crate::database::utils::{sql, with_timeout};
use crate::error::AppError;

/// Set-membership operations on `employee_roles` — there is no single
/// aggregate identity here, just an edge between `Employee` and `Role`
/// here.
#[async_trait]
pub trait EmployeeRoleRepository: Send + Sync {
    async fn grant(&self, employee_id: Uuid, role_id: Uuid) -> Result<(), AppError>;
    async fn revoke(&self, employee_id: Uuid, role_id: Uuid) -> Result<(), AppError>;
    async fn has_role(&self, employee_id: Uuid, role_id: Uuid) -> Result<bool, AppError>;
    /// Every role currently granted to this employee.
    async fn list_for_employee(&self, employee_id: Uuid) -> Result<Vec<Uuid>, AppError>;
}

#[derive(Clone)]
pub struct PgEmployeeRoleRepository {
    pool: PgPool,
    query_timeout: Duration,
}

impl PgEmployeeRoleRepository {
    pub fn new(pool: PgPool, query_timeout: Duration) -> Self {
        Self { pool, query_timeout }
    }
}

#[async_trait]
impl EmployeeRoleRepository for PgEmployeeRoleRepository {
    async fn grant(&self, employee_id: Uuid, role_id: Uuid) -> Result<(), AppError> {
        with_timeout(
            self.query_timeout,
            sqlx::query(&sql(r#"
                INSERT INTO employee_roles (employee_id, role_id)
                VALUES (?, ?)
                ON CONFLICT (employee_id, role_id) DO NOTHING
            "#))
            .bind(employee_id)
            .bind(role_id)
            .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn revoke(&self, employee_id: Uuid, role_id: Uuid) -> Result<(), AppError> {
        with_timeout(
            self.query_timeout,
            sqlx::query(&sql(
                "DELETE FROM employee_roles WHERE employee_id = ? AND role_id = ?",
            ))
            .bind(employee_id)
            .bind(role_id)
            .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn has_role(&self, employee_id: Uuid, role_id: Uuid) -> Result<bool, AppError> {
        let row: Option<(i32,)> = with_timeout(
            self.query_timeout,
            sqlx::query_as(&sql(r#"
                SELECT 1 FROM employee_roles WHERE employee_id = ? AND role_id = ?
            "#))
            .bind(employee_id)
            .bind(role_id)
            .fetch_optional(&self.pool),
        )
        .await?;

        Ok(row.is_some())
    }

    async fn list_for_employee(&self, employee_id: Uuid) -> Result<Vec<Uuid>, AppError> {
        let role_ids: Vec<(Uuid,)> = with_timeout(
            self.query_timeout,
            sqlx::query_as(&sql(r#"
                SELECT role_id FROM employee_roles WHERE employee_id = ?
            "#))
            .bind(employee_id)
            .fetch_all(&self.pool),
        )
        .await?;

        Ok(role_ids.into_iter().map(|(id,)| id).collect())
    }
}

#[derive(Default)]
pub struct InMemoryEmployeeRoleRepository {
    grants: Mutex<HashSet<(Uuid, Uuid)>>,
}

impl InMemoryEmployeeRoleRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EmployeeRoleRepository for InMemoryEmployeeRoleRepository {
    async fn grant(&self, employee_id: Uuid, role_id: Uuid) -> Result<(), AppError> {
        self.grants.lock().unwrap().insert((employee_id, role_id));
        Ok(())
    }

    async fn revoke(&self, employee_id: Uuid, role_id: Uuid) -> Result<(), AppError> {
        self.grants.lock().unwrap().remove(&(employee_id, role_id));
        Ok(())
    }

    async fn has_role(&self, employee_id: Uuid, role_id: Uuid) -> Result<bool, AppError> {
        Ok(self
            .grants
            .lock()
            .unwrap()
            .contains(&(employee_id, role_id)))
    }

    async fn list_for_employee(&self, employee_id: Uuid) -> Result<Vec<Uuid>, AppError> {
        Ok(self
            .grants
            .lock()
            .unwrap()
            .iter()
            .filter(|(e, _)| *e == employee_id)
            .map(|(_, r)| *r)
            .collect())
    }
}
