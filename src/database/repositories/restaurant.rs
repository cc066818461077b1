use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;

use crate::database::models::{CreateRestaurantRequest, Restaurant, UpdateRestaurantRequest};
use crate::database::utils::{sql, with_timeout};
use crate::error::AppError;

#[async_trait]
pub trait RestaurantRepository: Send + Sync {
    async fn create(
        &self,
        owner_user_id: Uuid,
        req: &CreateRestaurantRequest,
    ) -> Result<Restaurant, AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Restaurant>, AppError>;
    async fn list_by_owner(&self, owner_user_id: Uuid) -> Result<Vec<Restaurant>, AppError>;
    /// Optimistic-concurrency update: fails with `NotFound` if `version` in
    /// `req` does not match the row currently stored.
    async fn update(
        &self,
        id: Uuid,
        req: &UpdateRestaurantRequest,
    ) -> Result<Restaurant, AppError>;
    async fn delete(&self, id: Uuid) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct PgRestaurantRepository {
    pool: PgPool,
    query_timeout: Duration,
}

impl PgRestaurantRepository {
    pub fn new(pool: PgPool, query_timeout: Duration) -> Self {
        Self { pool, query_timeout }
    }
}

#[async_trait]
impl RestaurantRepository for PgRestaurantRepository {
    async fn create(
        &self,
        owner_user_id: Uuid,
        req: &CreateRestaurantRequest,
    ) -> Result<Restaurant, AppError> {
        let restaurant = with_timeout(
            self.query_timeout,
            sqlx::query_as::<_, Restaurant>(&sql(r#"
                INSERT INTO
                    restaurants (owner_user_id, name, address, phone, version)
                VALUES
                    (?, ?, ?, ?, 1)
                RETURNING
                    id, owner_user_id, name, address, phone, created_at, updated_at, version
            "#))
            .bind(owner_user_id)
            .bind(&req.name)
            .bind(&req.address)
            .bind(&req.phone)
            .fetch_one(&self.pool),
        )
        .await?;

        Ok(restaurant)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Restaurant>, AppError> {
        let restaurant = with_timeout(
            self.query_timeout,
            sqlx::query_as::<_, Restaurant>(&sql(r#"
                SELECT
                    id, owner_user_id, name, address, phone, created_at, updated_at, version
                FROM
                    restaurants
                WHERE
                    id = ?
            "#))
            .bind(id)
            .fetch_optional(&self.pool),
        )
        .await?;

        Ok(restaurant)
    }

    async fn list_by_owner(&self, owner_user_id: Uuid) -> Result<Vec<Restaurant>, AppError> {
        let restaurants = with_timeout(
            self.query_timeout,
            sqlx::query_as::<_, Restaurant>(&sql(r#"
                SELECT
                    id, owner_user_id, name, address, phone, created_at, updated_at, version
                FROM
                    restaurants
                WHERE
                    owner_user_id = ?
                ORDER BY
                    created_at
            "#))
            .bind(owner_user_id)
            .fetch_all(&self.pool),
        )
        .await?;

        Ok(restaurants)
    }

    async fn update(
        &self,
        id: Uuid,
        req: &UpdateRestaurantRequest,
    ) -> Result<Restaurant, AppError> {
        let restaurant = with_timeout(
            self.query_timeout,
            sqlx::query_as::<_, Restaurant>(&sql(r#"
                UPDATE restaurants
                SET
                    name = ?,
                    address = ?,
                    phone = ?,
                    version = version + 1,
                    updated_at = now()
                WHERE
                    id = ? AND version = ?
                RETURNING
                    id, owner_user_id, name, address, phone, created_at, updated_at, version
            "#))
            .bind(&req.name)
            .bind(&req.address)
            .bind(&req.phone)
            .bind(id)
            .bind(req.version)
            .fetch_optional(&self.pool),
        )
        .await?
        .ok_or_else(AppError::ownership_masked)?;

        Ok(restaurant)
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        with_timeout(
            self.query_timeout,
            sqlx::query(&sql("DELETE FROM restaurants WHERE id = ?"))
                .bind(id)
                .execute(&self.pool),
        )
        .await?;
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryRestaurantRepository {
    restaurants: Mutex<HashMap<Uuid, Restaurant>>,
}

impl InMemoryRestaurantRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RestaurantRepository for InMemoryRestaurantRepository {
    async fn create(
        &self,
        owner_user_id: Uuid,
        req: &CreateRestaurantRequest,
    ) -> Result<Restaurant, AppError> {
        let now = chrono::Utc::now();
        let restaurant = Restaurant {
            id: Uuid::new_v4(),
            owner_user_id,
            name: req.name.clone(),
            address: req.address.clone(),
            phone: req.phone.clone(),
            created_at: now,
            updated_at: now,
            version: 1,
        };
        self.restaurants
            .lock()
            .unwrap()
            .insert(restaurant.id, restaurant.clone());
        Ok(restaurant)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Restaurant>, AppError> {
        Ok(self.restaurants.lock().unwrap().get(&id).cloned())
    }

    async fn list_by_owner(&self, owner_user_id: Uuid) -> Result<Vec<Restaurant>, AppError> {
        Ok(self
            .restaurants
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.owner_user_id == owner_user_id)
            .cloned()
            .collect())
    }

    async fn update(
        &self,
        id: Uuid,
        req: &UpdateRestaurantRequest,
    ) -> Result<Restaurant, AppError> {
        let mut restaurants = self.restaurants.lock().unwrap();
        let restaurant = restaurants
            .get_mut(&id)
            .filter(|r| r.version == req.version)
            .ok_or_else(AppError::ownership_masked)?;
        restaurant.name = req.name.clone();
        restaurant.address = req.address.clone();
        restaurant.phone = req.phone.clone();
        restaurant.version += 1;
        restaurant.updated_at = chrono::Utc::now();
        Ok(restaurant.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.restaurants.lock().unwrap().remove(&id);
        Ok(())
    }
}
