use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::database::time_of_day::TimeOfDay;

/// A concrete shift occurrence inside a `Schedule`. `employee_id` of `None`
/// means the shift is open. `role_id` always belongs to the same restaurant
/// as the owning schedule; when `employee_id` is set, that employee belongs
/// to the same restaurant and holds `role_id` via `employee_roles`
/// the role.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledShift {
    pub id: Uuid,
    pub schedule_id: Uuid,
    pub shift_template_id: Option<Uuid>,
    pub role_id: Uuid,
    pub employee_id: Option<Uuid>,
    pub shift_date: NaiveDate,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub notes: Option<String>,
}

/// Joined read-model for the week calendar — adds display names without
/// requiring the client to issue follow-up lookups.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledShiftView {
    #[sqlx(flatten)]
    pub shift: ScheduledShift,
    pub role_name: String,
    pub employee_name: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateScheduledShiftRequest {
    pub role_id: Uuid,
    pub employee_id: Option<Uuid>,
    pub shift_date: NaiveDate,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub notes: Option<String>,
}

impl CreateScheduledShiftRequest {
    pub fn validate_time_range(&self) -> Result<(), String> {
        if self.end_time <= self.start_time {
            return Err("end_time must be after start_time".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateScheduledShiftRequest {
    pub role_id: Uuid,
    pub shift_date: NaiveDate,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub notes: Option<String>,
}

impl UpdateScheduledShiftRequest {
    pub fn validate_time_range(&self) -> Result<(), String> {
        if self.end_time <= self.start_time {
            return Err("end_time must be after start_time".to_string());
        }
        Ok(())
    }
}

/// `employee_id: None` always succeeds in unassigning a shift.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignEmployeeRequest {
    pub employee_id: Option<Uuid>,
}

/// Batch member for `BatchCreate`/auto-populate — identical shape to
/// `ScheduledShift` minus the generated id.
#[derive(Debug, Clone)]
pub struct NewScheduledShift {
    pub schedule_id: Uuid,
    pub shift_template_id: Option<Uuid>,
    pub role_id: Uuid,
    pub employee_id: Option<Uuid>,
    pub shift_date: NaiveDate,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
}
