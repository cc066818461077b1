use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// The tenant aggregate root. `version` is the optimistic-concurrency
/// counter: `RestaurantRepository::update` rewrites it under a
/// `WHERE id = $1 AND version = $2` guard.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    pub id: Uuid,
    pub owner_user_id: Uuid,
    pub name: String,
    pub address: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: i32,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRestaurantRequest {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub address: String,
    pub phone: Option<String>,
}

/// `version` must echo the value last read by the caller — the update is
/// rejected with `NotFound` if it no longer matches.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRestaurantRequest {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub address: String,
    pub phone: Option<String>,
    pub version: i32,
}
