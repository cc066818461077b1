use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;

use crate::database::models::{
    CreateShiftTemplateRequest, ShiftTemplate, ShiftTemplateWithRoles, UpdateShiftTemplateRequest,
};
use crate::database::utils::{sql, with_timeout};
use crate::error::AppError;

#[async_trait]
pub trait ShiftTemplateRepository: Send + Sync {
    async fn create(
        &self,
        restaurant_id: Uuid,
        req: &CreateShiftTemplateRequest,
    ) -> Result<ShiftTemplateWithRoles, AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ShiftTemplate>, AppError>;
    async fn list_by_restaurant(
        &self,
        restaurant_id: Uuid,
    ) -> Result<Vec<ShiftTemplateWithRoles>, AppError>;
    async fn update(
        &self,
        id: Uuid,
        req: &UpdateShiftTemplateRequest,
    ) -> Result<ShiftTemplate, AppError>;
    async fn delete(&self, id: Uuid) -> Result<(), AppError>;
    /// Replaces the full `shift_template_roles` set for `id` inside one
    /// transaction.
    async fn assign_roles(&self, id: Uuid, role_ids: &[Uuid]) -> Result<Vec<Uuid>, AppError>;
    async fn role_ids(&self, id: Uuid) -> Result<Vec<Uuid>, AppError>;
}

#[derive(Clone)]
pub struct PgShiftTemplateRepository {
    pool: PgPool,
    query_timeout: Duration,
}

impl PgShiftTemplateRepository {
    pub fn new(pool: PgPool, query_timeout: Duration) -> Self {
        Self { pool, query_timeout }
    }

    async fn role_ids_exec(&self, id: Uuid) -> Result<Vec<Uuid>, AppError> {
        let role_ids: Vec<(Uuid,)> = with_timeout(
            self.query_timeout,
            sqlx::query_as(&sql(r#"
                SELECT role_id FROM shift_template_roles WHERE shift_template_id = ?
            "#))
            .bind(id)
            .fetch_all(&self.pool),
        )
        .await?;

        Ok(role_ids.into_iter().map(|(id,)| id).collect())
    }

    async fn insert_roles_tx(
        tx: &mut Transaction<'_, Postgres>,
        shift_template_id: Uuid,
        role_ids: &[Uuid],
        query_timeout: Duration,
    ) -> Result<(), AppError> {
        for role_id in role_ids {
            with_timeout(
                query_timeout,
                sqlx::query(&sql(r#"
                    INSERT INTO shift_template_roles (shift_template_id, role_id)
                    VALUES (?, ?)
                    ON CONFLICT (shift_template_id, role_id) DO NOTHING
                "#))
                .bind(shift_template_id)
                .bind(role_id)
                .execute(&mut **tx),
            )
            .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl ShiftTemplateRepository for PgShiftTemplateRepository {
    async fn create(
        &self,
        restaurant_id: Uuid,
        req: &CreateShiftTemplateRequest,
    ) -> Result<ShiftTemplateWithRoles, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::from)?;

        let template = with_timeout(
            self.query_timeout,
            sqlx::query_as::<_, ShiftTemplate>(&sql(r#"
                INSERT INTO
                    shift_templates (restaurant_id, name, day_of_week, start_time, end_time)
                VALUES
                    (?, ?, ?, ?, ?)
                RETURNING
                    id, restaurant_id, name, day_of_week, start_time, end_time
            "#))
            .bind(restaurant_id)
            .bind(&req.name)
            .bind(req.day_of_week)
            .bind(&req.start_time)
            .bind(&req.end_time)
            .fetch_one(&mut *tx),
        )
        .await?;

        Self::insert_roles_tx(&mut tx, template.id, &req.role_ids, self.query_timeout).await?;
        tx.commit().await.map_err(AppError::from)?;

        Ok(ShiftTemplateWithRoles {
            template,
            role_ids: req.role_ids.clone(),
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ShiftTemplate>, AppError> {
        let template = with_timeout(
            self.query_timeout,
            sqlx::query_as::<_, ShiftTemplate>(&sql(r#"
                SELECT id, restaurant_id, name, day_of_week, start_time, end_time
                FROM shift_templates
                WHERE id = ?
            "#))
            .bind(id)
            .fetch_optional(&self.pool),
        )
        .await?;

        Ok(template)
    }

    async fn list_by_restaurant(
        &self,
        restaurant_id: Uuid,
    ) -> Result<Vec<ShiftTemplateWithRoles>, AppError> {
        let templates = with_timeout(
            self.query_timeout,
            sqlx::query_as::<_, ShiftTemplate>(&sql(r#"
                SELECT id, restaurant_id, name, day_of_week, start_time, end_time
                FROM shift_templates
                WHERE restaurant_id = ?
                ORDER BY day_of_week, start_time
            "#))
            .bind(restaurant_id)
            .fetch_all(&self.pool),
        )
        .await?;

        let mut result = Vec::with_capacity(templates.len());
        for template in templates {
            let role_ids = self.role_ids_exec(template.id).await?;
            result.push(ShiftTemplateWithRoles { template, role_ids });
        }
        Ok(result)
    }

    async fn update(
        &self,
        id: Uuid,
        req: &UpdateShiftTemplateRequest,
    ) -> Result<ShiftTemplate, AppError> {
        let template = with_timeout(
            self.query_timeout,
            sqlx::query_as::<_, ShiftTemplate>(&sql(r#"
                UPDATE shift_templates
                SET name = ?, day_of_week = ?, start_time = ?, end_time = ?
                WHERE id = ?
                RETURNING id, restaurant_id, name, day_of_week, start_time, end_time
            "#))
            .bind(&req.name)
            .bind(req.day_of_week)
            .bind(&req.start_time)
            .bind(&req.end_time)
            .bind(id)
            .fetch_optional(&self.pool),
        )
        .await?
        .ok_or_else(AppError::ownership_masked)?;

        Ok(template)
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        with_timeout(
            self.query_timeout,
            sqlx::query(&sql("DELETE FROM shift_templates WHERE id = ?"))
                .bind(id)
                .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn assign_roles(&self, id: Uuid, role_ids: &[Uuid]) -> Result<Vec<Uuid>, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::from)?;

        with_timeout(
            self.query_timeout,
            sqlx::query(&sql("DELETE FROM shift_template_roles WHERE shift_template_id = ?"))
                .bind(id)
                .execute(&mut *tx),
        )
        .await?;

        Self::insert_roles_tx(&mut tx, id, role_ids, self.query_timeout).await?;
        tx.commit().await.map_err(AppError::from)?;

        Ok(role_ids.to_vec())
    }

    async fn role_ids(&self, id: Uuid) -> Result<Vec<Uuid>, AppError> {
        self.role_ids_exec(id).await
    }
}

#[derive(Default)]
pub struct InMemoryShiftTemplateRepository {
    templates: Mutex<HashMap<Uuid, ShiftTemplate>>,
    roles: Mutex<HashMap<Uuid, Vec<Uuid>>>,
}

impl InMemoryShiftTemplateRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ShiftTemplateRepository for InMemoryShiftTemplateRepository {
    async fn create(
        &self,
        restaurant_id: Uuid,
        req: &CreateShiftTemplateRequest,
    ) -> Result<ShiftTemplateWithRoles, AppError> {
        let template = ShiftTemplate {
            id: Uuid::new_v4(),
            restaurant_id,
            name: req.name.clone(),
            day_of_week: req.day_of_week,
            start_time: req.start_time.clone(),
            end_time: req.end_time.clone(),
        };
        self.templates
            .lock()
            .unwrap()
            .insert(template.id, template.clone());
        self.roles
            .lock()
            .unwrap()
            .insert(template.id, req.role_ids.clone());
        Ok(ShiftTemplateWithRoles {
            template,
            role_ids: req.role_ids.clone(),
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ShiftTemplate>, AppError> {
        Ok(self.templates.lock().unwrap().get(&id).cloned())
    }

    async fn list_by_restaurant(
        &self,
        restaurant_id: Uuid,
    ) -> Result<Vec<ShiftTemplateWithRoles>, AppError> {
        let templates = self.templates.lock().unwrap();
        let roles = self.roles.lock().unwrap();
        Ok(templates
            .values()
            .filter(|t| t.restaurant_id == restaurant_id)
            .map(|t| ShiftTemplateWithRoles {
                template: t.clone(),
                role_ids: roles.get(&t.id).cloned().unwrap_or_default(),
            })
            .collect())
    }

    async fn update(
        &self,
        id: Uuid,
        req: &UpdateShiftTemplateRequest,
    ) -> Result<ShiftTemplate, AppError> {
        let mut templates = self.templates.lock().unwrap();
        let template = templates
            .get_mut(&id)
            .ok_or_else(AppError::ownership_masked)?;
        template.name = req.name.clone();
        template.day_of_week = req.day_of_week;
        template.start_time = req.start_time.clone();
        template.end_time = req.end_time.clone();
        Ok(template.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.templates.lock().unwrap().remove(&id);
        self.roles.lock().unwrap().remove(&id);
        Ok(())
    }

    async fn assign_roles(&self, id: Uuid, role_ids: &[Uuid]) -> Result<Vec<Uuid>, AppError> {
        self.roles.lock().unwrap().insert(id, role_ids.to_vec());
        Ok(role_ids.to_vec())
    }

    async fn role_ids(&self, id: Uuid) -> Result<Vec<Uuid>, AppError> {
        Ok(self.roles.lock().unwrap().get(&id).cloned().unwrap_or_default())
    }
}
