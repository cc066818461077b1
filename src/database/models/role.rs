use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A job title scoped to one restaurant; `name` is unique within that
/// restaurant (enforced by a unique index on `(restaurant_id, name)`).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub name: String,
    pub color: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoleRequest {
    #[validate(length(min = 1))]
    pub name: String,
    pub color: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRoleRequest {
    #[validate(length(min = 1))]
    pub name: String,
    pub color: Option<String>,
}
