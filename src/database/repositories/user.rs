use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;

use crate::database::models::User;
use crate::database::utils::{sql, with_timeout};
use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub google_id: Option<String>,
    pub avatar_url: Option<String>,
    pub is_active: bool,
}

/// Capability set for the `users` table. Kept as a trait (rather than a
/// concrete struct) so handlers and services depend on `Arc<dyn
/// UserRepository>` and tests can substitute `InMemoryUserRepository` for
/// the real database.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, new_user: &NewUser) -> Result<User, AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_by_google_id(&self, google_id: &str) -> Result<Option<User>, AppError>;
    async fn activate(&self, id: Uuid) -> Result<(), AppError>;
    async fn link_google(
        &self,
        id: Uuid,
        google_id: &str,
        avatar_url: Option<String>,
    ) -> Result<(), AppError>;
    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<(), AppError>;
    async fn delete(&self, id: Uuid) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
    query_timeout: Duration,
}

impl PgUserRepository {
    pub fn new(pool: PgPool, query_timeout: Duration) -> Self {
        Self { pool, query_timeout }
    }

    /// Used by `RegistrationSaga::register` inside its single transaction.
    pub async fn create_tx(
        tx: &mut Transaction<'_, Postgres>,
        new_user: &NewUser,
        query_timeout: Duration,
    ) -> Result<User, AppError> {
        let user = with_timeout(
            query_timeout,
            sqlx::query_as::<_, User>(&sql(r#"
                INSERT INTO
                    users (email, password_hash, first_name, last_name, google_id, avatar_url, is_active)
                VALUES
                    (?, ?, ?, ?, ?, ?, ?)
                RETURNING
                    id, email, password_hash, first_name, last_name, google_id, avatar_url,
                    is_active, created_at, updated_at
            "#))
            .bind(&new_user.email)
            .bind(&new_user.password_hash)
            .bind(&new_user.first_name)
            .bind(&new_user.last_name)
            .bind(&new_user.google_id)
            .bind(&new_user.avatar_url)
            .bind(new_user.is_active)
            .fetch_one(&mut **tx),
        )
        .await?;

        Ok(user)
    }

    /// Compensation step of the registration saga: deletes the user (and,
    /// via `ON DELETE CASCADE`, its invitation) when the activation email
    /// could not be sent.
    pub async fn delete_tx(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        query_timeout: Duration,
    ) -> Result<(), AppError> {
        with_timeout(
            query_timeout,
            sqlx::query(&sql("DELETE FROM users WHERE id = ?"))
                .bind(id)
                .execute(&mut **tx),
        )
        .await?;
        Ok(())
    }

    pub async fn activate_tx(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        query_timeout: Duration,
    ) -> Result<(), AppError> {
        with_timeout(
            query_timeout,
            sqlx::query(&sql("UPDATE users SET is_active = true, updated_at = now() WHERE id = ?"))
                .bind(id)
                .execute(&mut **tx),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, new_user: &NewUser) -> Result<User, AppError> {
        let user = with_timeout(
            self.query_timeout,
            sqlx::query_as::<_, User>(&sql(r#"
                INSERT INTO
                    users (email, password_hash, first_name, last_name, google_id, avatar_url, is_active)
                VALUES
                    (?, ?, ?, ?, ?, ?, ?)
                RETURNING
                    id, email, password_hash, first_name, last_name, google_id, avatar_url,
                    is_active, created_at, updated_at
            "#))
            .bind(&new_user.email)
            .bind(&new_user.password_hash)
            .bind(&new_user.first_name)
            .bind(&new_user.last_name)
            .bind(&new_user.google_id)
            .bind(&new_user.avatar_url)
            .bind(new_user.is_active)
            .fetch_one(&self.pool),
        )
        .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = with_timeout(
            self.query_timeout,
            sqlx::query_as::<_, User>(&sql(r#"
                SELECT
                    id, email, password_hash, first_name, last_name, google_id, avatar_url,
                    is_active, created_at, updated_at
                FROM
                    users
                WHERE
                    id = ?
            "#))
            .bind(id)
            .fetch_optional(&self.pool),
        )
        .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = with_timeout(
            self.query_timeout,
            sqlx::query_as::<_, User>(&sql(r#"
                SELECT
                    id, email, password_hash, first_name, last_name, google_id, avatar_url,
                    is_active, created_at, updated_at
                FROM
                    users
                WHERE
                    lower(email) = lower(?)
            "#))
            .bind(email)
            .fetch_optional(&self.pool),
        )
        .await?;

        Ok(user)
    }

    async fn find_by_google_id(&self, google_id: &str) -> Result<Option<User>, AppError> {
        let user = with_timeout(
            self.query_timeout,
            sqlx::query_as::<_, User>(&sql(r#"
                SELECT
                    id, email, password_hash, first_name, last_name, google_id, avatar_url,
                    is_active, created_at, updated_at
                FROM
                    users
                WHERE
                    google_id = ?
            "#))
            .bind(google_id)
            .fetch_optional(&self.pool),
        )
        .await?;

        Ok(user)
    }

    async fn activate(&self, id: Uuid) -> Result<(), AppError> {
        with_timeout(
            self.query_timeout,
            sqlx::query(&sql("UPDATE users SET is_active = true, updated_at = now() WHERE id = ?"))
                .bind(id)
                .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn link_google(
        &self,
        id: Uuid,
        google_id: &str,
        avatar_url: Option<String>,
    ) -> Result<(), AppError> {
        with_timeout(
            self.query_timeout,
            sqlx::query(&sql(r#"
                UPDATE users
                SET
                    google_id = ?,
                    avatar_url = coalesce(?, avatar_url),
                    is_active = true,
                    updated_at = now()
                WHERE
                    id = ?
            "#))
            .bind(google_id)
            .bind(avatar_url)
            .bind(id)
            .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<(), AppError> {
        with_timeout(
            self.query_timeout,
            sqlx::query(&sql("UPDATE users SET password_hash = ?, updated_at = now() WHERE id = ?"))
                .bind(password_hash)
                .bind(id)
                .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        with_timeout(
            self.query_timeout,
            sqlx::query(&sql("DELETE FROM users WHERE id = ?"))
                .bind(id)
                .execute(&self.pool),
        )
        .await?;
        Ok(())
    }
}

/// In-memory stand-in used by unit tests that exercise domain rules without
/// a database.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<HashMap<Uuid, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, new_user: &NewUser) -> Result<User, AppError> {
        let mut users = self.users.lock().unwrap();
        if users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&new_user.email))
        {
            return Err(AppError::DuplicateEmail);
        }
        let now = chrono::Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email.clone(),
            password_hash: new_user.password_hash.clone(),
            first_name: new_user.first_name.clone(),
            last_name: new_user.last_name.clone(),
            google_id: new_user.google_id.clone(),
            avatar_url: new_user.avatar_url.clone(),
            is_active: new_user.is_active,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_google_id(&self, google_id: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.google_id.as_deref() == Some(google_id))
            .cloned())
    }

    async fn activate(&self, id: Uuid) -> Result<(), AppError> {
        let mut users = self.users.lock().unwrap();
        let user = users.get_mut(&id).ok_or_else(AppError::ownership_masked)?;
        user.is_active = true;
        user.updated_at = chrono::Utc::now();
        Ok(())
    }

    async fn link_google(
        &self,
        id: Uuid,
        google_id: &str,
        avatar_url: Option<String>,
    ) -> Result<(), AppError> {
        let mut users = self.users.lock().unwrap();
        let user = users.get_mut(&id).ok_or_else(AppError::ownership_masked)?;
        user.google_id = Some(google_id.to_string());
        if let Some(avatar_url) = avatar_url {
            user.avatar_url = Some(avatar_url);
        }
        user.is_active = true;
        user.updated_at = chrono::Utc::now();
        Ok(())
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<(), AppError> {
        let mut users = self.users.lock().unwrap();
        let user = users.get_mut(&id).ok_or_else(AppError::ownership_masked)?;
        user.password_hash = Some(password_hash.to_string());
        user.updated_at = chrono::Utc::now();
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.users.lock().unwrap().remove(&id);
        Ok(())
    }
}
