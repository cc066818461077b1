use actix_web::{HttpResponse, web};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::database::models::{
    AssignEmployeeRequest, CreateScheduledShiftRequest, ScheduledShift, UpdateScheduledShiftRequest,
};
use crate::database::repositories::{ScheduleRepository, ScheduledShiftRepository};
use crate::error::AppError;
use crate::handlers::schedules::owned_schedule;
use crate::handlers::shared::ApiResponse;
use crate::middleware::auth::AuthenticatedUser;
use crate::middleware::restaurant_context::RestaurantContext;

/// `POST /v1/restaurants/{restaurantID}/schedules/{scheduleID}/shifts` —
/// `end_time == start_time` is rejected as `BadRequest`, same as a
/// zero-length range.
pub async fn create(
    schedule_repo: web::Data<Arc<dyn ScheduleRepository>>,
    shift_repo: web::Data<Arc<dyn ScheduledShiftRepository>>,
    ctx: RestaurantContext,
    user: AuthenticatedUser,
    path: web::Path<(Uuid, Uuid)>,
    req: web::Json<CreateScheduledShiftRequest>,
) -> Result<HttpResponse, AppError> {
    ctx.require_owner(&user)?;
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    req.validate_time_range().map_err(AppError::BadRequest)?;

    let (_, schedule_id) = path.into_inner();
    let schedule = owned_schedule(schedule_repo.get_ref(), &ctx, schedule_id).await?;

    let shift = shift_repo.create(schedule.id, &req).await?;
    Ok(ApiResponse::created(shift))
}

/// `GET /v1/restaurants/{restaurantID}/schedules/{scheduleID}/shifts`.
pub async fn list(
    schedule_repo: web::Data<Arc<dyn ScheduleRepository>>,
    shift_repo: web::Data<Arc<dyn ScheduledShiftRepository>>,
    ctx: RestaurantContext,
    user: AuthenticatedUser,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse, AppError> {
    ctx.require_owner(&user)?;
    let (_, schedule_id) = path.into_inner();
    let schedule = owned_schedule(schedule_repo.get_ref(), &ctx, schedule_id).await?;

    let shifts = shift_repo.list_by_schedule(schedule.id).await?;
    Ok(ApiResponse::success(shifts))
}

/// Resolves `{shiftID}`, masking a shift belonging to a different schedule
/// (and transitively, a different restaurant) as `NotFound`.
async fn owned_shift(
    repo: &Arc<dyn ScheduledShiftRepository>,
    schedule_id: Uuid,
    shift_id: Uuid,
) -> Result<ScheduledShift, AppError> {
    let shift = repo
        .find_by_id(shift_id)
        .await?
        .ok_or_else(AppError::ownership_masked)?;
    if shift.schedule_id != schedule_id {
        return Err(AppError::ownership_masked());
    }
    Ok(shift)
}

/// `GET /v1/restaurants/{restaurantID}/schedules/{scheduleID}/shifts/{shiftID}`.
pub async fn get(
    schedule_repo: web::Data<Arc<dyn ScheduleRepository>>,
    shift_repo: web::Data<Arc<dyn ScheduledShiftRepository>>,
    ctx: RestaurantContext,
    user: AuthenticatedUser,
    path: web::Path<(Uuid, Uuid, Uuid)>,
) -> Result<HttpResponse, AppError> {
    ctx.require_owner(&user)?;
    let (_, schedule_id, shift_id) = path.into_inner();
    let schedule = owned_schedule(schedule_repo.get_ref(), &ctx, schedule_id).await?;
    let shift = owned_shift(shift_repo.get_ref(), schedule.id, shift_id).await?;
    Ok(ApiResponse::success(shift))
}

/// `PUT /v1/restaurants/{restaurantID}/schedules/{scheduleID}/shifts/{shiftID}`.
pub async fn update(
    schedule_repo: web::Data<Arc<dyn ScheduleRepository>>,
    shift_repo: web::Data<Arc<dyn ScheduledShiftRepository>>,
    ctx: RestaurantContext,
    user: AuthenticatedUser,
    path: web::Path<(Uuid, Uuid, Uuid)>,
    req: web::Json<UpdateScheduledShiftRequest>,
) -> Result<HttpResponse, AppError> {
    ctx.require_owner(&user)?;
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    req.validate_time_range().map_err(AppError::BadRequest)?;

    let (_, schedule_id, shift_id) = path.into_inner();
    let schedule = owned_schedule(schedule_repo.get_ref(), &ctx, schedule_id).await?;
    owned_shift(shift_repo.get_ref(), schedule.id, shift_id).await?;

    let shift = shift_repo.update(shift_id, &req).await?;
    Ok(ApiResponse::success(shift))
}

/// `DELETE /v1/restaurants/{restaurantID}/schedules/{scheduleID}/shifts/{shiftID}`.
pub async fn delete(
    schedule_repo: web::Data<Arc<dyn ScheduleRepository>>,
    shift_repo: web::Data<Arc<dyn ScheduledShiftRepository>>,
    ctx: RestaurantContext,
    user: AuthenticatedUser,
    path: web::Path<(Uuid, Uuid, Uuid)>,
) -> Result<HttpResponse, AppError> {
    ctx.require_owner(&user)?;
    let (_, schedule_id, shift_id) = path.into_inner();
    let schedule = owned_schedule(schedule_repo.get_ref(), &ctx, schedule_id).await?;
    owned_shift(shift_repo.get_ref(), schedule.id, shift_id).await?;

    shift_repo.delete(shift_id).await?;
    Ok(ApiResponse::deleted())
}

/// `POST /v1/restaurants/{restaurantID}/schedules/{scheduleID}/shifts/{shiftID}/assign`
/// — `employeeId: null` always unassigns. A non-null id is rejected with
/// `Forbidden` if the employee doesn't belong to the restaurant, or
/// `InvalidAssignment` if it belongs to the restaurant but lacks the
/// shift's role.
pub async fn assign(
    schedule_repo: web::Data<Arc<dyn ScheduleRepository>>,
    shift_repo: web::Data<Arc<dyn ScheduledShiftRepository>>,
    ctx: RestaurantContext,
    user: AuthenticatedUser,
    path: web::Path<(Uuid, Uuid, Uuid)>,
    req: web::Json<AssignEmployeeRequest>,
) -> Result<HttpResponse, AppError> {
    ctx.require_owner(&user)?;
    let (_, schedule_id, shift_id) = path.into_inner();
    let schedule = owned_schedule(schedule_repo.get_ref(), &ctx, schedule_id).await?;
    owned_shift(shift_repo.get_ref(), schedule.id, shift_id).await?;

    let shift = shift_repo.assign_employee(shift_id, req.employee_id).await?;
    Ok(ApiResponse::success(shift))
}
