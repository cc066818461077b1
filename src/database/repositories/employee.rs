use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

use crate::database::models::{CreateEmployeeRequest, Employee, UpdateEmployeeRequest};
use crate::database::repositories::EmployeeRoleRepository;
use crate::database::utils::{sql, with_timeout};
use crate::error::AppError;

#[async_trait]
pub trait EmployeeRepository: Send + Sync {
    async fn create(
        &self,
        restaurant_id: Uuid,
        req: &CreateEmployeeRequest,
    ) -> Result<Employee, AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Employee>, AppError>;
    async fn list_by_restaurant(&self, restaurant_id: Uuid) -> Result<Vec<Employee>, AppError>;
    async fn update(&self, id: Uuid, req: &UpdateEmployeeRequest) -> Result<Employee, AppError>;
    async fn delete(&self, id: Uuid) -> Result<(), AppError>;
    /// Roles held by this employee, via `employee_roles`.
    async fn role_ids(&self, id: Uuid) -> Result<Vec<Uuid>, AppError>;
}

#[derive(Clone)]
pub struct PgEmployeeRepository {
    pool: PgPool,
    query_timeout: Duration,
}

impl PgEmployeeRepository {
    pub fn new(pool: PgPool, query_timeout: Duration) -> Self {
        Self { pool, query_timeout }
    }
}

#[async_trait]
impl EmployeeRepository for PgEmployeeRepository {
    async fn create(
        &self,
        restaurant_id: Uuid,
        req: &CreateEmployeeRequest,
    ) -> Result<Employee, AppError> {
        let employee = with_timeout(
            self.query_timeout,
            sqlx::query_as::<_, Employee>(&sql(r#"
                INSERT INTO
                    employees (restaurant_id, full_name, email)
                VALUES
                    (?, ?, ?)
                RETURNING
                    id, restaurant_id, full_name, email
            "#))
            .bind(restaurant_id)
            .bind(&req.full_name)
            .bind(&req.email)
            .fetch_one(&self.pool),
        )
        .await?;

        Ok(employee)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Employee>, AppError> {
        let employee = with_timeout(
            self.query_timeout,
            sqlx::query_as::<_, Employee>(&sql(r#"
                SELECT id, restaurant_id, full_name, email FROM employees WHERE id = ?
            "#))
            .bind(id)
            .fetch_optional(&self.pool),
        )
        .await?;

        Ok(employee)
    }

    async fn list_by_restaurant(&self, restaurant_id: Uuid) -> Result<Vec<Employee>, AppError> {
        let employees = with_timeout(
            self.query_timeout,
            sqlx::query_as::<_, Employee>(&sql(r#"
                SELECT id, restaurant_id, full_name, email
                FROM employees
                WHERE restaurant_id = ?
                ORDER BY full_name
            "#))
            .bind(restaurant_id)
            .fetch_all(&self.pool),
        )
        .await?;

        Ok(employees)
    }

    async fn update(&self, id: Uuid, req: &UpdateEmployeeRequest) -> Result<Employee, AppError> {
        let employee = with_timeout(
            self.query_timeout,
            sqlx::query_as::<_, Employee>(&sql(r#"
                UPDATE employees
                SET full_name = ?, email = ?
                WHERE id = ?
                RETURNING id, restaurant_id, full_name, email
            "#))
            .bind(&req.full_name)
            .bind(&req.email)
            .bind(id)
            .fetch_optional(&self.pool),
        )
        .await?
        .ok_or_else(AppError::ownership_masked)?;

        Ok(employee)
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        with_timeout(
            self.query_timeout,
            sqlx::query(&sql("DELETE FROM employees WHERE id = ?"))
                .bind(id)
                .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn role_ids(&self, id: Uuid) -> Result<Vec<Uuid>, AppError> {
        let role_ids: Vec<(Uuid,)> = with_timeout(
            self.query_timeout,
            sqlx::query_as(&sql(r#"
                SELECT role_id FROM employee_roles WHERE employee_id = ?
            "#))
            .bind(id)
            .fetch_all(&self.pool),
        )
        .await?;

        Ok(role_ids.into_iter().map(|(id,)| id).collect())
    }
}

/// Delegates `role_ids` to `employee_roles` rather than keeping its own
/// copy of the relation — otherwise a grant made through
/// `EmployeeRoleRepository::grant` would never show up here, the same
/// split-brain a single Postgres table doesn't have.
pub struct InMemoryEmployeeRepository {
    employees: Mutex<HashMap<Uuid, Employee>>,
    employee_roles: Arc<dyn EmployeeRoleRepository>,
}

impl InMemoryEmployeeRepository {
    pub fn new(employee_roles: Arc<dyn EmployeeRoleRepository>) -> Self {
        Self {
            employees: Mutex::new(HashMap::new()),
            employee_roles,
        }
    }
}

#[async_trait]
impl EmployeeRepository for InMemoryEmployeeRepository {
    async fn create(
        &self,
        restaurant_id: Uuid,
        req: &CreateEmployeeRequest,
    ) -> Result<Employee, AppError> {
        let employee = Employee {
            id: Uuid::new_v4(),
            restaurant_id,
            full_name: req.full_name.clone(),
            email: req.email.clone(),
        };
        self.employees
            .lock()
            .unwrap()
            .insert(employee.id, employee.clone());
        Ok(employee)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Employee>, AppError> {
        Ok(self.employees.lock().unwrap().get(&id).cloned())
    }

    async fn list_by_restaurant(&self, restaurant_id: Uuid) -> Result<Vec<Employee>, AppError> {
        Ok(self
            .employees
            .lock()
            .unwrap()
            .values()
            .filter(|e| e.restaurant_id == restaurant_id)
            .cloned()
            .collect())
    }

    async fn update(&self, id: Uuid, req: &UpdateEmployeeRequest) -> Result<Employee, AppError> {
        let mut employees = self.employees.lock().unwrap();
        let employee = employees
            .get_mut(&id)
            .ok_or_else(AppError::ownership_masked)?;
        employee.full_name = req.full_name.clone();
        employee.email = req.email.clone();
        Ok(employee.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.employees.lock().unwrap().remove(&id);
        Ok(())
    }

    async fn role_ids(&self, id: Uuid) -> Result<Vec<Uuid>, AppError> {
        self.employee_roles.list_for_employee(id).await
    }
}
