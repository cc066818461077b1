use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration as QueryTimeout;
use uuid::Uuid;

use crate::database::models::{
    CreateScheduledShiftRequest, NewScheduledShift, ScheduledShift, ScheduledShiftView,
    UpdateScheduledShiftRequest,
};
use crate::database::repositories::{EmployeeRepository, EmployeeRoleRepository, ScheduleRepository};
use crate::database::utils::{sql, with_timeout};
use crate::error::AppError;

#[async_trait]
pub trait ScheduledShiftRepository: Send + Sync {
    async fn create(
        &self,
        schedule_id: Uuid,
        req: &CreateScheduledShiftRequest,
    ) -> Result<ScheduledShift, AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ScheduledShift>, AppError>;
    async fn update(
        &self,
        id: Uuid,
        req: &UpdateScheduledShiftRequest,
    ) -> Result<ScheduledShift, AppError>;
    async fn delete(&self, id: Uuid) -> Result<(), AppError>;
    /// `employee_id: None` always unassigns. `Some(id)` is only accepted
    /// when the employee belongs to the same restaurant as the shift's
    /// schedule AND holds the shift's role (`AssignEmployee`). Tie-break: if
    /// both invariants fail, restaurant-mismatch wins and is reported as
    /// `Forbidden`; a role-only mismatch is reported as `InvalidAssignment`.
    async fn assign_employee(
        &self,
        shift_id: Uuid,
        employee_id: Option<Uuid>,
    ) -> Result<ScheduledShift, AppError>;
    /// Joined read-model for one restaurant's calendar week, ordered by
    /// date then start time.
    async fn list_by_restaurant_and_week(
        &self,
        restaurant_id: Uuid,
        week_start: NaiveDate,
    ) -> Result<Vec<ScheduledShiftView>, AppError>;
    async fn list_by_schedule(&self, schedule_id: Uuid) -> Result<Vec<ScheduledShift>, AppError>;
    /// All-or-nothing batch insert used by `BatchCreate` and
    /// `AutoPopulate` — duplicates (by the `(schedule_id,
    /// shift_template_id, shift_date, role_id)` uniqueness guard) abort the
    /// whole batch with `AppError::BadRequest`.
    async fn batch_create(
        &self,
        shifts: &[NewScheduledShift],
    ) -> Result<Vec<ScheduledShift>, AppError>;
}

#[derive(Clone)]
pub struct PgScheduledShiftRepository {
    pool: PgPool,
    query_timeout: QueryTimeout,
}

impl PgScheduledShiftRepository {
    pub fn new(pool: PgPool, query_timeout: QueryTimeout) -> Self {
        Self { pool, query_timeout }
    }

    async fn insert_tx(
        tx: &mut Transaction<'_, Postgres>,
        shift: &NewScheduledShift,
        query_timeout: QueryTimeout,
    ) -> Result<ScheduledShift, AppError> {
        let row = with_timeout(
            query_timeout,
            sqlx::query_as::<_, ScheduledShift>(&sql(r#"
                INSERT INTO
                    scheduled_shifts
                        (schedule_id, shift_template_id, role_id, employee_id, shift_date, start_time, end_time)
                VALUES
                    (?, ?, ?, ?, ?, ?, ?)
                RETURNING
                    id, schedule_id, shift_template_id, role_id, employee_id, shift_date,
                    start_time, end_time, notes
            "#))
            .bind(shift.schedule_id)
            .bind(shift.shift_template_id)
            .bind(shift.role_id)
            .bind(shift.employee_id)
            .bind(shift.shift_date)
            .bind(&shift.start_time)
            .bind(&shift.end_time)
            .fetch_one(&mut **tx),
        )
        .await?;

        Ok(row)
    }
}

#[async_trait]
impl ScheduledShiftRepository for PgScheduledShiftRepository {
    async fn create(
        &self,
        schedule_id: Uuid,
        req: &CreateScheduledShiftRequest,
    ) -> Result<ScheduledShift, AppError> {
        let shift = with_timeout(
            self.query_timeout,
            sqlx::query_as::<_, ScheduledShift>(&sql(r#"
                INSERT INTO
                    scheduled_shifts
                        (schedule_id, role_id, employee_id, shift_date, start_time, end_time, notes)
                VALUES
                    (?, ?, ?, ?, ?, ?, ?)
                RETURNING
                    id, schedule_id, shift_template_id, role_id, employee_id, shift_date,
                    start_time, end_time, notes
            "#))
            .bind(schedule_id)
            .bind(req.role_id)
            .bind(req.employee_id)
            .bind(req.shift_date)
            .bind(&req.start_time)
            .bind(&req.end_time)
            .bind(&req.notes)
            .fetch_one(&self.pool),
        )
        .await?;

        Ok(shift)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ScheduledShift>, AppError> {
        let shift = with_timeout(
            self.query_timeout,
            sqlx::query_as::<_, ScheduledShift>(&sql(r#"
                SELECT
                    id, schedule_id, shift_template_id, role_id, employee_id, shift_date,
                    start_time, end_time, notes
                FROM
                    scheduled_shifts
                WHERE
                    id = ?
            "#))
            .bind(id)
            .fetch_optional(&self.pool),
        )
        .await?;

        Ok(shift)
    }

    async fn update(
        &self,
        id: Uuid,
        req: &UpdateScheduledShiftRequest,
    ) -> Result<ScheduledShift, AppError> {
        let shift = with_timeout(
            self.query_timeout,
            sqlx::query_as::<_, ScheduledShift>(&sql(r#"
                UPDATE scheduled_shifts
                SET role_id = ?, shift_date = ?, start_time = ?, end_time = ?, notes = ?
                WHERE id = ?
                RETURNING
                    id, schedule_id, shift_template_id, role_id, employee_id, shift_date,
                    start_time, end_time, notes
            "#))
            .bind(req.role_id)
            .bind(req.shift_date)
            .bind(&req.start_time)
            .bind(&req.end_time)
            .bind(&req.notes)
            .bind(id)
            .fetch_optional(&self.pool),
        )
        .await?
        .ok_or_else(AppError::ownership_masked)?;

        Ok(shift)
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        with_timeout(
            self.query_timeout,
            sqlx::query(&sql("DELETE FROM scheduled_shifts WHERE id = ?"))
                .bind(id)
                .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn assign_employee(
        &self,
        shift_id: Uuid,
        employee_id: Option<Uuid>,
    ) -> Result<ScheduledShift, AppError> {
        let Some(employee_id) = employee_id else {
            let shift = with_timeout(
                self.query_timeout,
                sqlx::query_as::<_, ScheduledShift>(&sql(r#"
                    UPDATE scheduled_shifts
                    SET employee_id = NULL
                    WHERE id = ?
                    RETURNING
                        id, schedule_id, shift_template_id, role_id, employee_id, shift_date,
                        start_time, end_time, notes
                "#))
                .bind(shift_id)
                .fetch_optional(&self.pool),
            )
            .await?
            .ok_or_else(AppError::ownership_masked)?;

            return Ok(shift);
        };

        // Confirm the shift exists, then check the two invariants in the
        // tie-break order §4.6 requires: restaurant-membership first
        // (Forbidden on mismatch), role-membership second (InvalidAssignment
        // if both fail, restaurant-mismatch wins).
        let shift = self
            .find_by_id(shift_id)
            .await?
            .ok_or_else(AppError::ownership_masked)?;

        let restaurant_id: Uuid = with_timeout(
            self.query_timeout,
            sqlx::query_scalar(&sql("SELECT restaurant_id FROM schedules WHERE id = ?"))
                .bind(shift.schedule_id)
                .fetch_one(&self.pool),
        )
        .await?;

        let employee_restaurant_id: Option<Uuid> = with_timeout(
            self.query_timeout,
            sqlx::query_scalar(&sql("SELECT restaurant_id FROM employees WHERE id = ?"))
                .bind(employee_id)
                .fetch_optional(&self.pool),
        )
        .await?;

        if employee_restaurant_id != Some(restaurant_id) {
            return Err(AppError::Forbidden(
                "employee does not belong to this restaurant".to_string(),
            ));
        }

        let has_role: bool = with_timeout(
            self.query_timeout,
            sqlx::query_scalar(&sql(
                "SELECT EXISTS (SELECT 1 FROM employee_roles WHERE employee_id = ? AND role_id = ?)",
            ))
            .bind(employee_id)
            .bind(shift.role_id)
            .fetch_one(&self.pool),
        )
        .await?;

        if !has_role {
            return Err(AppError::InvalidAssignment(
                "employee does not have the required role for this shift".to_string(),
            ));
        }

        let shift = with_timeout(
            self.query_timeout,
            sqlx::query_as::<_, ScheduledShift>(&sql(r#"
                UPDATE scheduled_shifts
                SET employee_id = ?
                WHERE id = ?
                RETURNING
                    id, schedule_id, shift_template_id, role_id, employee_id, shift_date,
                    start_time, end_time, notes
            "#))
            .bind(employee_id)
            .bind(shift_id)
            .fetch_optional(&self.pool),
        )
        .await?
        .ok_or_else(AppError::ownership_masked)?;

        Ok(shift)
    }

    async fn list_by_restaurant_and_week(
        &self,
        restaurant_id: Uuid,
        week_start: NaiveDate,
    ) -> Result<Vec<ScheduledShiftView>, AppError> {
        let week_end = week_start + Duration::days(6);

        let shifts = with_timeout(
            self.query_timeout,
            sqlx::query_as::<_, ScheduledShiftView>(&sql(r#"
                SELECT
                    ss.id, ss.schedule_id, ss.shift_template_id, ss.role_id, ss.employee_id,
                    ss.shift_date, ss.start_time, ss.end_time, ss.notes,
                    r.name AS role_name,
                    e.full_name AS employee_name
                FROM
                    scheduled_shifts ss
                JOIN schedules s ON s.id = ss.schedule_id
                JOIN roles r ON r.id = ss.role_id
                LEFT JOIN employees e ON e.id = ss.employee_id
                WHERE
                    s.restaurant_id = ?
                    AND ss.shift_date BETWEEN ? AND ?
                ORDER BY
                    ss.shift_date, ss.start_time
            "#))
            .bind(restaurant_id)
            .bind(week_start)
            .bind(week_end)
            .fetch_all(&self.pool),
        )
        .await?;

        Ok(shifts)
    }

    async fn list_by_schedule(&self, schedule_id: Uuid) -> Result<Vec<ScheduledShift>, AppError> {
        let shifts = with_timeout(
            self.query_timeout,
            sqlx::query_as::<_, ScheduledShift>(&sql(r#"
                SELECT
                    id, schedule_id, shift_template_id, role_id, employee_id, shift_date,
                    start_time, end_time, notes
                FROM
                    scheduled_shifts
                WHERE
                    schedule_id = ?
                ORDER BY
                    shift_date, start_time
            "#))
            .bind(schedule_id)
            .fetch_all(&self.pool),
        )
        .await?;

        Ok(shifts)
    }

    async fn batch_create(
        &self,
        shifts: &[NewScheduledShift],
    ) -> Result<Vec<ScheduledShift>, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::from)?;

        let mut created = Vec::with_capacity(shifts.len());
        for shift in shifts {
            match Self::insert_tx(&mut tx, shift, self.query_timeout).await {
                Ok(row) => created.push(row),
                Err(err) => {
                    log::warn!("batch_create rolling back after error: {err}");
                    tx.rollback().await.ok();
                    return Err(match err {
                        AppError::BadRequest(_) => err,
                        other => other,
                    });
                }
            }
        }

        tx.commit().await.map_err(AppError::from)?;
        Ok(created)
    }
}

/// Holds references to the other in-memory stores it needs in order to
/// replicate the restaurant-then-role checks the Postgres implementation
/// runs for `assign_employee` — without them, an in-memory double would
/// accept any assignment and every test exercising it would be blind to the
/// restaurant/role invariants the spec requires.
pub struct InMemoryScheduledShiftRepository {
    shifts: Mutex<HashMap<Uuid, ScheduledShift>>,
    schedules: Arc<dyn ScheduleRepository>,
    employees: Arc<dyn EmployeeRepository>,
    employee_roles: Arc<dyn EmployeeRoleRepository>,
}

impl InMemoryScheduledShiftRepository {
    pub fn new(
        schedules: Arc<dyn ScheduleRepository>,
        employees: Arc<dyn EmployeeRepository>,
        employee_roles: Arc<dyn EmployeeRoleRepository>,
    ) -> Self {
        Self {
            shifts: Mutex::new(HashMap::new()),
            schedules,
            employees,
            employee_roles,
        }
    }
}

#[async_trait]
impl ScheduledShiftRepository for InMemoryScheduledShiftRepository {
    async fn create(
        &self,
        schedule_id: Uuid,
        req: &CreateScheduledShiftRequest,
    ) -> Result<ScheduledShift, AppError> {
        let shift = ScheduledShift {
            id: Uuid::new_v4(),
            schedule_id,
            shift_template_id: None,
            role_id: req.role_id,
            employee_id: req.employee_id,
            shift_date: req.shift_date,
            start_time: req.start_time.clone(),
            end_time: req.end_time.clone(),
            notes: req.notes.clone(),
        };
        self.shifts.lock().unwrap().insert(shift.id, shift.clone());
        Ok(shift)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ScheduledShift>, AppError> {
        Ok(self.shifts.lock().unwrap().get(&id).cloned())
    }

    async fn update(
        &self,
        id: Uuid,
        req: &UpdateScheduledShiftRequest,
    ) -> Result<ScheduledShift, AppError> {
        let mut shifts = self.shifts.lock().unwrap();
        let shift = shifts.get_mut(&id).ok_or_else(AppError::ownership_masked)?;
        shift.role_id = req.role_id;
        shift.shift_date = req.shift_date;
        shift.start_time = req.start_time.clone();
        shift.end_time = req.end_time.clone();
        shift.notes = req.notes.clone();
        Ok(shift.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.shifts.lock().unwrap().remove(&id);
        Ok(())
    }

    async fn assign_employee(
        &self,
        shift_id: Uuid,
        employee_id: Option<Uuid>,
    ) -> Result<ScheduledShift, AppError> {
        let (schedule_id, role_id) = {
            let shifts = self.shifts.lock().unwrap();
            let shift = shifts.get(&shift_id).ok_or_else(AppError::ownership_masked)?;
            (shift.schedule_id, shift.role_id)
        };

        if let Some(employee_id) = employee_id {
            let schedule = self
                .schedules
                .find_by_id(schedule_id)
                .await?
                .ok_or_else(AppError::ownership_masked)?;
            let employee = self.employees.find_by_id(employee_id).await?;

            // Tie-break per §4.6: restaurant-mismatch (or a missing
            // employee, which can't belong to any restaurant) wins over a
            // role mismatch and is reported as Forbidden.
            let belongs_to_restaurant = matches!(
                &employee,
                Some(e) if e.restaurant_id == schedule.restaurant_id
            );
            if !belongs_to_restaurant {
                return Err(AppError::Forbidden(
                    "employee does not belong to this restaurant".to_string(),
                ));
            }

            let has_role = self.employee_roles.has_role(employee_id, role_id).await?;
            if !has_role {
                return Err(AppError::InvalidAssignment(
                    "employee does not have the required role for this shift".to_string(),
                ));
            }
        }

        let mut shifts = self.shifts.lock().unwrap();
        let shift = shifts
            .get_mut(&shift_id)
            .ok_or_else(AppError::ownership_masked)?;
        shift.employee_id = employee_id;
        Ok(shift.clone())
    }

    async fn list_by_restaurant_and_week(
        &self,
        _restaurant_id: Uuid,
        week_start: NaiveDate,
    ) -> Result<Vec<ScheduledShiftView>, AppError> {
        let week_end = week_start + Duration::days(6);
        let mut shifts: Vec<_> = self
            .shifts
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.shift_date >= week_start && s.shift_date <= week_end)
            .map(|s| ScheduledShiftView {
                shift: s.clone(),
                role_name: String::new(),
                employee_name: None,
            })
            .collect();
        shifts.sort_by_key(|v| (v.shift.shift_date, v.shift.start_time.clone()));
        Ok(shifts)
    }

    async fn list_by_schedule(&self, schedule_id: Uuid) -> Result<Vec<ScheduledShift>, AppError> {
        let mut shifts: Vec<_> = self
            .shifts
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.schedule_id == schedule_id)
            .cloned()
            .collect();
        shifts.sort_by_key(|s| (s.shift_date, s.start_time.clone()));
        Ok(shifts)
    }

    async fn batch_create(
        &self,
        shifts: &[NewScheduledShift],
    ) -> Result<Vec<ScheduledShift>, AppError> {
        let mut store = self.shifts.lock().unwrap();
        let mut created = Vec::with_capacity(shifts.len());
        for shift in shifts {
            let duplicate = store.values().any(|s| {
                s.schedule_id == shift.schedule_id
                    && s.shift_template_id == shift.shift_template_id
                    && s.shift_date == shift.shift_date
                    && s.role_id == shift.role_id
            });
            if duplicate {
                return Err(AppError::BadRequest(
                    "schedule already populated for this date range".to_string(),
                ));
            }
            let row = ScheduledShift {
                id: Uuid::new_v4(),
                schedule_id: shift.schedule_id,
                shift_template_id: shift.shift_template_id,
                role_id: shift.role_id,
                employee_id: shift.employee_id,
                shift_date: shift.shift_date,
                start_time: shift.start_time.clone(),
                end_time: shift.end_time.clone(),
                notes: None,
            };
            store.insert(row.id, row.clone());
            created.push(row);
        }
        Ok(created)
    }
}
