use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::database::time_of_day::TimeOfDay;

/// A recurring weekly pattern: a day-of-week plus a clock-time range,
/// attached to zero or more roles via `shift_template_roles`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ShiftTemplate {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub name: String,
    /// 0 = Sunday .. 6 = Saturday.
    pub day_of_week: i16,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ShiftTemplateWithRoles {
    #[sqlx(flatten)]
    pub template: ShiftTemplate,
    pub role_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateShiftTemplateRequest {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(range(min = 0, max = 6, message = "day_of_week must be in [0, 6]"))]
    pub day_of_week: i16,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    #[serde(default)]
    pub role_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateShiftTemplateRequest {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(range(min = 0, max = 6, message = "day_of_week must be in [0, 6]"))]
    pub day_of_week: i16,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AssignRolesRequest {
    pub role_ids: Vec<Uuid>,
}

impl CreateShiftTemplateRequest {
    /// `endTime == startTime` is rejected as `BadRequest`; this is the single source of that
    /// check so both the template and the scheduled-shift create paths stay
    /// consistent.
    pub fn validate_time_range(&self) -> Result<(), String> {
        if self.end_time <= self.start_time {
            return Err("end_time must be after start_time".to_string());
        }
        Ok(())
    }
}

impl UpdateShiftTemplateRequest {
    pub fn validate_time_range(&self) -> Result<(), String> {
        if self.end_time <= self.start_time {
            return Err("end_time must be after start_time".to_string());
        }
        Ok(())
    }
}
