use actix_web::{HttpResponse, web};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::database::models::{
    AssignRolesRequest, CreateShiftTemplateRequest, ShiftTemplate, UpdateShiftTemplateRequest,
};
use crate::database::repositories::ShiftTemplateRepository;
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::middleware::auth::AuthenticatedUser;
use crate::middleware::restaurant_context::RestaurantContext;

/// `POST /v1/restaurants/{restaurantID}/shift-templates` — `end_time ==
/// start_time` is rejected as `BadRequest`, same as a zero-length range.
pub async fn create(
    repo: web::Data<Arc<dyn ShiftTemplateRepository>>,
    ctx: RestaurantContext,
    user: AuthenticatedUser,
    req: web::Json<CreateShiftTemplateRequest>,
) -> Result<HttpResponse, AppError> {
    ctx.require_owner(&user)?;
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    req.validate_time_range().map_err(AppError::BadRequest)?;

    let template = repo.create(ctx.restaurant.id, &req).await?;
    Ok(ApiResponse::created(template))
}

/// `GET /v1/restaurants/{restaurantID}/shift-templates`.
pub async fn list(
    repo: web::Data<Arc<dyn ShiftTemplateRepository>>,
    ctx: RestaurantContext,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    ctx.require_owner(&user)?;
    let templates = repo.list_by_restaurant(ctx.restaurant.id).await?;
    Ok(ApiResponse::success(templates))
}

/// Resolves `{templateID}`, masking a template belonging to a different
/// restaurant as `NotFound`.
async fn owned_template(
    repo: &Arc<dyn ShiftTemplateRepository>,
    ctx: &RestaurantContext,
    template_id: Uuid,
) -> Result<ShiftTemplate, AppError> {
    let template = repo
        .find_by_id(template_id)
        .await?
        .ok_or_else(AppError::ownership_masked)?;
    if template.restaurant_id != ctx.restaurant.id {
        return Err(AppError::ownership_masked());
    }
    Ok(template)
}

/// `PUT /v1/restaurants/{restaurantID}/shift-templates/{templateID}`.
pub async fn update(
    repo: web::Data<Arc<dyn ShiftTemplateRepository>>,
    ctx: RestaurantContext,
    user: AuthenticatedUser,
    path: web::Path<(Uuid, Uuid)>,
    req: web::Json<UpdateShiftTemplateRequest>,
) -> Result<HttpResponse, AppError> {
    ctx.require_owner(&user)?;
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    req.validate_time_range().map_err(AppError::BadRequest)?;

    let (_, template_id) = path.into_inner();
    owned_template(repo.get_ref(), &ctx, template_id).await?;

    let template = repo.update(template_id, &req).await?;
    Ok(ApiResponse::success(template))
}

/// `DELETE /v1/restaurants/{restaurantID}/shift-templates/{templateID}` —
/// nulls `shift_template_id` on any `ScheduledShift` sourced from this
/// template (the shift survives, loses its source link).
pub async fn delete(
    repo: web::Data<Arc<dyn ShiftTemplateRepository>>,
    ctx: RestaurantContext,
    user: AuthenticatedUser,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse, AppError> {
    ctx.require_owner(&user)?;
    let (_, template_id) = path.into_inner();
    owned_template(repo.get_ref(), &ctx, template_id).await?;

    repo.delete(template_id).await?;
    Ok(ApiResponse::deleted())
}

/// `GET /v1/restaurants/{restaurantID}/shift-templates/{templateID}/roles`.
pub async fn list_roles(
    repo: web::Data<Arc<dyn ShiftTemplateRepository>>,
    ctx: RestaurantContext,
    user: AuthenticatedUser,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse, AppError> {
    ctx.require_owner(&user)?;
    let (_, template_id) = path.into_inner();
    owned_template(repo.get_ref(), &ctx, template_id).await?;

    let role_ids = repo.role_ids(template_id).await?;
    Ok(ApiResponse::success(role_ids))
}

/// `PUT /v1/restaurants/{restaurantID}/shift-templates/{templateID}/roles`
/// — replaces the full attached-role set in one transaction: old
/// associations deleted and new ones inserted atomically, so a concurrent
/// reader sees either the entire old set or the entire new set.
pub async fn assign_roles(
    repo: web::Data<Arc<dyn ShiftTemplateRepository>>,
    ctx: RestaurantContext,
    user: AuthenticatedUser,
    path: web::Path<(Uuid, Uuid)>,
    req: web::Json<AssignRolesRequest>,
) -> Result<HttpResponse, AppError> {
    ctx.require_owner(&user)?;
    let (_, template_id) = path.into_inner();
    owned_template(repo.get_ref(), &ctx, template_id).await?;

    let role_ids = repo.assign_roles(template_id, &req.role_ids).await?;
    Ok(ApiResponse::success(role_ids))
}
