use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;

use crate::database::models::{CreateScheduleRequest, Schedule};
use crate::database::utils::{sql, with_timeout};
use crate::error::AppError;

#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    async fn create(
        &self,
        restaurant_id: Uuid,
        req: &CreateScheduleRequest,
    ) -> Result<Schedule, AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Schedule>, AppError>;
    async fn list_by_restaurant(&self, restaurant_id: Uuid) -> Result<Vec<Schedule>, AppError>;
    /// Capability with no HTTP route in this core — left unresolved whether
    /// republishing an already-published schedule should be rejected or
    /// silently overwrite the prior timestamp (see DESIGN.md).
    async fn publish(&self, id: Uuid, at: DateTime<Utc>) -> Result<Schedule, AppError>;
    async fn delete(&self, id: Uuid) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct PgScheduleRepository {
    pool: PgPool,
    query_timeout: Duration,
}

impl PgScheduleRepository {
    pub fn new(pool: PgPool, query_timeout: Duration) -> Self {
        Self { pool, query_timeout }
    }
}

#[async_trait]
impl ScheduleRepository for PgScheduleRepository {
    async fn create(
        &self,
        restaurant_id: Uuid,
        req: &CreateScheduleRequest,
    ) -> Result<Schedule, AppError> {
        let schedule = with_timeout(
            self.query_timeout,
            sqlx::query_as::<_, Schedule>(&sql(r#"
                INSERT INTO
                    schedules (restaurant_id, start_date, end_date)
                VALUES
                    (?, ?, ?)
                RETURNING
                    id, restaurant_id, start_date, end_date, published_at
            "#))
            .bind(restaurant_id)
            .bind(req.start_date)
            .bind(req.end_date)
            .fetch_one(&self.pool),
        )
        .await?;

        Ok(schedule)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Schedule>, AppError> {
        let schedule = with_timeout(
            self.query_timeout,
            sqlx::query_as::<_, Schedule>(&sql(r#"
                SELECT id, restaurant_id, start_date, end_date, published_at
                FROM schedules
                WHERE id = ?
            "#))
            .bind(id)
            .fetch_optional(&self.pool),
        )
        .await?;

        Ok(schedule)
    }

    async fn list_by_restaurant(&self, restaurant_id: Uuid) -> Result<Vec<Schedule>, AppError> {
        let schedules = with_timeout(
            self.query_timeout,
            sqlx::query_as::<_, Schedule>(&sql(r#"
                SELECT id, restaurant_id, start_date, end_date, published_at
                FROM schedules
                WHERE restaurant_id = ?
                ORDER BY start_date DESC
            "#))
            .bind(restaurant_id)
            .fetch_all(&self.pool),
        )
        .await?;

        Ok(schedules)
    }

    async fn publish(&self, id: Uuid, at: DateTime<Utc>) -> Result<Schedule, AppError> {
        let schedule = with_timeout(
            self.query_timeout,
            sqlx::query_as::<_, Schedule>(&sql(r#"
                UPDATE schedules
                SET published_at = ?
                WHERE id = ?
                RETURNING id, restaurant_id, start_date, end_date, published_at
            "#))
            .bind(at)
            .bind(id)
            .fetch_optional(&self.pool),
        )
        .await?
        .ok_or_else(AppError::ownership_masked)?;

        Ok(schedule)
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        with_timeout(
            self.query_timeout,
            sqlx::query(&sql("DELETE FROM schedules WHERE id = ?"))
                .bind(id)
                .execute(&self.pool),
        )
        .await?;
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryScheduleRepository {
    schedules: Mutex<HashMap<Uuid, Schedule>>,
}

impl InMemoryScheduleRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ScheduleRepository for InMemoryScheduleRepository {
    async fn create(
        &self,
        restaurant_id: Uuid,
        req: &CreateScheduleRequest,
    ) -> Result<Schedule, AppError> {
        let schedule = Schedule {
            id: Uuid::new_v4(),
            restaurant_id,
            start_date: req.start_date,
            end_date: req.end_date,
            published_at: None,
        };
        self.schedules
            .lock()
            .unwrap()
            .insert(schedule.id, schedule.clone());
        Ok(schedule)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Schedule>, AppError> {
        Ok(self.schedules.lock().unwrap().get(&id).cloned())
    }

    async fn list_by_restaurant(&self, restaurant_id: Uuid) -> Result<Vec<Schedule>, AppError> {
        let mut schedules: Vec<_> = self
            .schedules
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.restaurant_id == restaurant_id)
            .cloned()
            .collect();
        schedules.sort_by_key(|s| std::cmp::Reverse(s.start_date));
        Ok(schedules)
    }

    async fn publish(&self, id: Uuid, at: DateTime<Utc>) -> Result<Schedule, AppError> {
        let mut schedules = self.schedules.lock().unwrap();
        let schedule = schedules
            .get_mut(&id)
            .ok_or_else(AppError::ownership_masked)?;
        schedule.published_at = Some(at);
        Ok(schedule.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.schedules.lock().unwrap().remove(&id);
        Ok(())
    }
}
