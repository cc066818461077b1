use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;

use crate::database::models::UserInvitation;
use crate::database::utils::{sql, with_timeout};
use crate::error::AppError;

#[async_trait]
pub trait UserInvitationRepository: Send + Sync {
    async fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<UserInvitation>, AppError>;
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<UserInvitation>, AppError>;
    async fn delete(&self, token_hash: &str) -> Result<(), AppError>;
    /// Standalone insert used by the resend-invitation flow, which does not
    /// need to share a transaction with `UserRepository::create`.
    async fn create(
        &self,
        user_id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<UserInvitation, AppError>;
}

#[derive(Clone)]
pub struct PgUserInvitationRepository {
    pool: PgPool,
    query_timeout: Duration,
}

impl PgUserInvitationRepository {
    pub fn new(pool: PgPool, query_timeout: Duration) -> Self {
        Self { pool, query_timeout }
    }

    pub async fn create_tx(
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
        query_timeout: Duration,
    ) -> Result<UserInvitation, AppError> {
        let invitation = with_timeout(
            query_timeout,
            sqlx::query_as::<_, UserInvitation>(&sql(r#"
                INSERT INTO
                    user_invitations (token_hash, user_id, expires_at)
                VALUES
                    (?, ?, ?)
                RETURNING
                    token_hash, user_id, expires_at, created_at
            "#))
            .bind(token_hash)
            .bind(user_id)
            .bind(expires_at)
            .fetch_one(&mut **tx),
        )
        .await?;

        Ok(invitation)
    }

    pub async fn delete_tx(
        tx: &mut Transaction<'_, Postgres>,
        token_hash: &str,
        query_timeout: Duration,
    ) -> Result<(), AppError> {
        with_timeout(
            query_timeout,
            sqlx::query(&sql("DELETE FROM user_invitations WHERE token_hash = ?"))
                .bind(token_hash)
                .execute(&mut **tx),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl UserInvitationRepository for PgUserInvitationRepository {
    async fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<UserInvitation>, AppError> {
        let invitation = with_timeout(
            self.query_timeout,
            sqlx::query_as::<_, UserInvitation>(&sql(r#"
                SELECT
                    token_hash, user_id, expires_at, created_at
                FROM
                    user_invitations
                WHERE
                    token_hash = ?
            "#))
            .bind(token_hash)
            .fetch_optional(&self.pool),
        )
        .await?;

        Ok(invitation)
    }

    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<UserInvitation>, AppError> {
        let invitation = with_timeout(
            self.query_timeout,
            sqlx::query_as::<_, UserInvitation>(&sql(r#"
                SELECT
                    token_hash, user_id, expires_at, created_at
                FROM
                    user_invitations
                WHERE
                    user_id = ?
            "#))
            .bind(user_id)
            .fetch_optional(&self.pool),
        )
        .await?;

        Ok(invitation)
    }

    async fn delete(&self, token_hash: &str) -> Result<(), AppError> {
        with_timeout(
            self.query_timeout,
            sqlx::query(&sql("DELETE FROM user_invitations WHERE token_hash = ?"))
                .bind(token_hash)
                .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn create(
        &self,
        user_id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<UserInvitation, AppError> {
        let invitation = with_timeout(
            self.query_timeout,
            sqlx::query_as::<_, UserInvitation>(&sql(r#"
                INSERT INTO
                    user_invitations (token_hash, user_id, expires_at)
                VALUES
                    (?, ?, ?)
                RETURNING
                    token_hash, user_id, expires_at, created_at
            "#))
            .bind(token_hash)
            .bind(user_id)
            .bind(expires_at)
            .fetch_one(&self.pool),
        )
        .await?;

        Ok(invitation)
    }
}

#[derive(Default)]
pub struct InMemoryUserInvitationRepository {
    invitations: Mutex<HashMap<String, UserInvitation>>,
}

impl InMemoryUserInvitationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, invitation: UserInvitation) {
        self.invitations
            .lock()
            .unwrap()
            .insert(invitation.token_hash.clone(), invitation);
    }
}

#[async_trait]
impl UserInvitationRepository for InMemoryUserInvitationRepository {
    async fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<UserInvitation>, AppError> {
        Ok(self.invitations.lock().unwrap().get(token_hash).cloned())
    }

    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<UserInvitation>, AppError> {
        Ok(self
            .invitations
            .lock()
            .unwrap()
            .values()
            .find(|i| i.user_id == user_id)
            .cloned())
    }

    async fn delete(&self, token_hash: &str) -> Result<(), AppError> {
        self.invitations.lock().unwrap().remove(token_hash);
        Ok(())
    }

    async fn create(
        &self,
        user_id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<UserInvitation, AppError> {
        let invitation = UserInvitation {
            token_hash: token_hash.to_string(),
            user_id,
            expires_at,
            created_at: chrono::Utc::now(),
        };
        self.insert(invitation.clone());
        Ok(invitation)
    }
}
