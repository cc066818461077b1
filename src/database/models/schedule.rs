use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A published-or-draft plan for a contiguous date range at one restaurant.
/// A week-schedule has `end_date == start_date + 6 days`, but the type does
/// not enforce that — callers that want a week use `Schedule::week_range`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateScheduleRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl CreateScheduleRequest {
    pub fn validate_range(&self) -> Result<(), String> {
        if self.end_date < self.start_date {
            return Err("end_date must not be before start_date".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekQuery {
    /// The Sunday that starts the requested week.
    pub start: NaiveDate,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendScheduleResult {
    pub total_recipients: usize,
    pub successful: usize,
    pub failed: usize,
    pub failures: Vec<SendFailure>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendFailure {
    pub employee_id: Uuid,
    pub email: String,
    pub error: String,
}
