//! Orchestration that spans more than one repository: `AutoPopulate`
//! (`ShiftTemplateRepository` + `ScheduledShiftRepository`, batched in one
//! transaction) and schedule-send (`ScheduledShiftRepository` + `Mailer`).
//! Lifted into a service struct, rather than left as handler-level
//! orchestration, since both operations are reused verbatim by more than
//! one handler path.

use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::database::models::{
    Employee, NewScheduledShift, ScheduledShift, Schedule, SendFailure, SendScheduleResult,
};
use crate::database::repositories::{
    EmployeeRepository, ScheduleRepository, ScheduledShiftRepository, ShiftTemplateRepository,
};
use crate::error::AppError;
use crate::mailer::{MailMessage, Mailer};

#[derive(Clone)]
pub struct ScheduleService {
    schedule_repo: Arc<dyn ScheduleRepository>,
    shift_template_repo: Arc<dyn ShiftTemplateRepository>,
    scheduled_shift_repo: Arc<dyn ScheduledShiftRepository>,
    employee_repo: Arc<dyn EmployeeRepository>,
    mailer: Arc<dyn Mailer>,
}

impl ScheduleService {
    pub fn new(
        schedule_repo: Arc<dyn ScheduleRepository>,
        shift_template_repo: Arc<dyn ShiftTemplateRepository>,
        scheduled_shift_repo: Arc<dyn ScheduledShiftRepository>,
        employee_repo: Arc<dyn EmployeeRepository>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            schedule_repo,
            shift_template_repo,
            scheduled_shift_repo,
            employee_repo,
            mailer,
        }
    }

    /// `AutoPopulate`: for each date in the schedule's range,
    /// find templates matching that date's day-of-week and emit one
    /// `ScheduledShift` per role attached to the template (skipping
    /// templates with no roles attached). All rows are inserted in a single
    /// `BatchCreate`.
    pub async fn auto_populate(
        &self,
        restaurant_id: Uuid,
        schedule: &Schedule,
    ) -> Result<Vec<ScheduledShift>, AppError> {
        let templates = self.shift_template_repo.list_by_restaurant(restaurant_id).await?;

        let mut new_shifts = Vec::new();
        let mut date = schedule.start_date;
        while date <= schedule.end_date {
            let dow = date.format("%w").to_string().parse::<i16>().unwrap_or(0);
            for template in templates.iter().filter(|t| t.template.day_of_week == dow) {
                for role_id in &template.role_ids {
                    new_shifts.push(NewScheduledShift {
                        schedule_id: schedule.id,
                        shift_template_id: Some(template.template.id),
                        role_id: *role_id,
                        employee_id: None,
                        shift_date: date,
                        start_time: template.template.start_time.clone(),
                        end_time: template.template.end_time.clone(),
                    });
                }
            }
            date += chrono::Duration::days(1);
        }

        if new_shifts.is_empty() {
            return Ok(Vec::new());
        }

        self.scheduled_shift_repo.batch_create(&new_shifts).await
    }

    /// Schedule-send: one email per employee with shifts in
    /// this schedule, ordered by date then start time. A recipient's
    /// failure is recorded but does not abort the batch.
    pub async fn send_email(&self, schedule: &Schedule) -> Result<SendScheduleResult, AppError> {
        let shifts = self.scheduled_shift_repo.list_by_schedule(schedule.id).await?;

        let mut by_employee: HashMap<Uuid, Vec<ScheduledShift>> = HashMap::new();
        for shift in shifts {
            if let Some(employee_id) = shift.employee_id {
                by_employee.entry(employee_id).or_default().push(shift);
            }
        }

        let mut successful = 0;
        let mut failures = Vec::new();

        for (employee_id, mut shifts) in by_employee {
            shifts.sort_by_key(|s| (s.shift_date, s.start_time.clone()));

            let employee = match self.employee_repo.find_by_id(employee_id).await? {
                Some(employee) => employee,
                None => continue,
            };

            match self.send_one(&employee, &shifts).await {
                Ok(()) => successful += 1,
                Err(err) => failures.push(SendFailure {
                    employee_id,
                    email: employee.email,
                    error: err.to_string(),
                }),
            }
        }

        let total_recipients = successful + failures.len();
        Ok(SendScheduleResult {
            total_recipients,
            successful,
            failed: failures.len(),
            failures,
        })
    }

    async fn send_one(&self, employee: &Employee, shifts: &[ScheduledShift]) -> Result<(), AppError> {
        let mut vars = HashMap::new();
        vars.insert("shift_count".to_string(), shifts.len().to_string());
        for (i, shift) in shifts.iter().enumerate() {
            vars.insert(
                format!("shift_{i}"),
                format!(
                    "{} {}-{}",
                    shift.shift_date, shift.start_time, shift.end_time
                ),
            );
        }

        let message = MailMessage {
            template: "ScheduleTemplate".to_string(),
            to_name: employee.full_name.clone(),
            to_email: employee.email.clone(),
            vars,
            sandbox: false,
        };

        self.mailer.send(message).await
    }
}
