use actix_web::{HttpResponse, web};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::database::models::{CreateRoleRequest, UpdateRoleRequest};
use crate::database::repositories::{EmployeeRepository, EmployeeRoleRepository, RoleRepository};
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::middleware::auth::AuthenticatedUser;
use crate::middleware::restaurant_context::RestaurantContext;

/// `POST /v1/restaurants/{restaurantID}/roles`.
pub async fn create(
    repo: web::Data<Arc<dyn RoleRepository>>,
    ctx: RestaurantContext,
    user: AuthenticatedUser,
    req: web::Json<CreateRoleRequest>,
) -> Result<HttpResponse, AppError> {
    ctx.require_owner(&user)?;
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let role = repo.create(ctx.restaurant.id, &req).await?;
    Ok(ApiResponse::created(role))
}

/// `GET /v1/restaurants/{restaurantID}/roles`.
pub async fn list(
    repo: web::Data<Arc<dyn RoleRepository>>,
    ctx: RestaurantContext,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    ctx.require_owner(&user)?;
    let roles = repo.list_by_restaurant(ctx.restaurant.id).await?;
    Ok(ApiResponse::success(roles))
}

/// Resolves `{roleID}`, masking a role belonging to a different restaurant
/// as `NotFound` just like `RestaurantContext` masks unowned restaurants.
async fn owned_role(
    repo: &Arc<dyn RoleRepository>,
    ctx: &RestaurantContext,
    role_id: Uuid,
) -> Result<crate::database::models::Role, AppError> {
    let role = repo
        .find_by_id(role_id)
        .await?
        .ok_or_else(AppError::ownership_masked)?;
    if role.restaurant_id != ctx.restaurant.id {
        return Err(AppError::ownership_masked());
    }
    Ok(role)
}

/// `PUT /v1/restaurants/{restaurantID}/roles/{roleID}`.
pub async fn update(
    repo: web::Data<Arc<dyn RoleRepository>>,
    ctx: RestaurantContext,
    user: AuthenticatedUser,
    path: web::Path<(Uuid, Uuid)>,
    req: web::Json<UpdateRoleRequest>,
) -> Result<HttpResponse, AppError> {
    ctx.require_owner(&user)?;
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let (_, role_id) = path.into_inner();
    owned_role(repo.get_ref(), &ctx, role_id).await?;

    let role = repo.update(role_id, &req).await?;
    Ok(ApiResponse::success(role))
}

/// `DELETE /v1/restaurants/{restaurantID}/roles/{roleID}` — fails (mapped
/// from the `ON DELETE RESTRICT` foreign key) if any scheduled shift still
/// references the role.
pub async fn delete(
    repo: web::Data<Arc<dyn RoleRepository>>,
    ctx: RestaurantContext,
    user: AuthenticatedUser,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse, AppError> {
    ctx.require_owner(&user)?;
    let (_, role_id) = path.into_inner();
    owned_role(repo.get_ref(), &ctx, role_id).await?;

    repo.delete(role_id).await?;
    Ok(ApiResponse::deleted())
}

/// `GET /v1/restaurants/{restaurantID}/roles/{roleID}/employees` — the
/// employees currently holding this role via `EmployeeRole`.
pub async fn list_employees(
    role_repo: web::Data<Arc<dyn RoleRepository>>,
    employee_repo: web::Data<Arc<dyn EmployeeRepository>>,
    employee_role_repo: web::Data<Arc<dyn EmployeeRoleRepository>>,
    ctx: RestaurantContext,
    user: AuthenticatedUser,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse, AppError> {
    ctx.require_owner(&user)?;
    let (_, role_id) = path.into_inner();
    owned_role(role_repo.get_ref(), &ctx, role_id).await?;

    let employees = employee_repo.list_by_restaurant(ctx.restaurant.id).await?;
    let mut holders = Vec::new();
    for employee in employees {
        if employee_role_repo.has_role(employee.id, role_id).await? {
            holders.push(employee);
        }
    }
    Ok(ApiResponse::success(holders))
}
