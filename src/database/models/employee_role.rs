use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Set-membership `{employee_id, role_id}`. A weak relation, not an
/// ownership edge — deleting either side does not cascade into this table
/// beyond the row itself.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeRole {
    pub employee_id: Uuid,
    pub role_id: Uuid,
}
