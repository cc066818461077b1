use actix_web::{HttpResponse, web};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::database::models::{CreateScheduleRequest, Schedule, WeekQuery};
use crate::database::repositories::{ScheduleRepository, ScheduledShiftRepository};
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::middleware::auth::AuthenticatedUser;
use crate::middleware::restaurant_context::RestaurantContext;
use crate::services::ScheduleService;

/// `POST /v1/restaurants/{restaurantID}/schedules`.
pub async fn create(
    repo: web::Data<Arc<dyn ScheduleRepository>>,
    ctx: RestaurantContext,
    user: AuthenticatedUser,
    req: web::Json<CreateScheduleRequest>,
) -> Result<HttpResponse, AppError> {
    ctx.require_owner(&user)?;
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    req.validate_range().map_err(AppError::BadRequest)?;

    let schedule = repo.create(ctx.restaurant.id, &req).await?;
    Ok(ApiResponse::created(schedule))
}

/// `GET /v1/restaurants/{restaurantID}/schedules`.
pub async fn list(
    repo: web::Data<Arc<dyn ScheduleRepository>>,
    ctx: RestaurantContext,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    ctx.require_owner(&user)?;
    let schedules = repo.list_by_restaurant(ctx.restaurant.id).await?;
    Ok(ApiResponse::success(schedules))
}

/// `GET /v1/restaurants/{restaurantID}/schedules/week?start=YYYY-MM-DD` —
/// the calendar read path, joined with role and employee names so the
/// client doesn't need follow-up lookups.
pub async fn week(
    repo: web::Data<Arc<dyn ScheduledShiftRepository>>,
    ctx: RestaurantContext,
    user: AuthenticatedUser,
    query: web::Query<WeekQuery>,
) -> Result<HttpResponse, AppError> {
    ctx.require_owner(&user)?;
    let shifts = repo
        .list_by_restaurant_and_week(ctx.restaurant.id, query.start)
        .await?;
    Ok(ApiResponse::success(shifts))
}

/// Resolves `{scheduleID}`, masking a schedule belonging to a different
/// restaurant as `NotFound`.
pub(crate) async fn owned_schedule(
    repo: &Arc<dyn ScheduleRepository>,
    ctx: &RestaurantContext,
    schedule_id: Uuid,
) -> Result<Schedule, AppError> {
    let schedule = repo
        .find_by_id(schedule_id)
        .await?
        .ok_or_else(AppError::ownership_masked)?;
    if schedule.restaurant_id != ctx.restaurant.id {
        return Err(AppError::ownership_masked());
    }
    Ok(schedule)
}

/// `GET /v1/restaurants/{restaurantID}/schedules/{scheduleID}`.
pub async fn get(
    repo: web::Data<Arc<dyn ScheduleRepository>>,
    ctx: RestaurantContext,
    user: AuthenticatedUser,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse, AppError> {
    ctx.require_owner(&user)?;
    let (_, schedule_id) = path.into_inner();
    let schedule = owned_schedule(repo.get_ref(), &ctx, schedule_id).await?;
    Ok(ApiResponse::success(schedule))
}

/// `DELETE /v1/restaurants/{restaurantID}/schedules/{scheduleID}` —
/// cascades to every `ScheduledShift` inside it.
pub async fn delete(
    repo: web::Data<Arc<dyn ScheduleRepository>>,
    ctx: RestaurantContext,
    user: AuthenticatedUser,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse, AppError> {
    ctx.require_owner(&user)?;
    let (_, schedule_id) = path.into_inner();
    owned_schedule(repo.get_ref(), &ctx, schedule_id).await?;

    repo.delete(schedule_id).await?;
    Ok(ApiResponse::deleted())
}

/// `POST /v1/restaurants/{restaurantID}/schedules/{scheduleID}/auto-populate`
/// — deterministic template-to-shift expansion, not schedule optimization.
/// A zero-length date range yields `200` with an empty array rather than
/// `201`, since nothing was created. A second call against an
/// already-populated schedule fails with `BadRequest`, surfaced from the
/// uniqueness guard on `scheduled_shifts`.
pub async fn auto_populate(
    schedule_repo: web::Data<Arc<dyn ScheduleRepository>>,
    service: web::Data<ScheduleService>,
    ctx: RestaurantContext,
    user: AuthenticatedUser,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse, AppError> {
    ctx.require_owner(&user)?;
    let (_, schedule_id) = path.into_inner();
    let schedule = owned_schedule(schedule_repo.get_ref(), &ctx, schedule_id).await?;

    let shifts = service.auto_populate(ctx.restaurant.id, &schedule).await?;
    if shifts.is_empty() {
        Ok(ApiResponse::success(shifts))
    } else {
        Ok(ApiResponse::created(shifts))
    }
}

/// `POST /v1/restaurants/{restaurantID}/schedules/{scheduleID}/send-email`
/// — one email per employee with shifts in this schedule. A single
/// recipient's failure does not abort the batch; the aggregate result
/// reports every failure individually.
pub async fn send_email(
    schedule_repo: web::Data<Arc<dyn ScheduleRepository>>,
    service: web::Data<ScheduleService>,
    ctx: RestaurantContext,
    user: AuthenticatedUser,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse, AppError> {
    ctx.require_owner(&user)?;
    let (_, schedule_id) = path.into_inner();
    let schedule = owned_schedule(schedule_repo.get_ref(), &ctx, schedule_id).await?;

    let result = service.send_email(&schedule).await?;
    Ok(ApiResponse::success(result))
}
