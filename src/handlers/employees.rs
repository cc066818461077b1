use actix_web::{HttpResponse, web};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::database::models::{CreateEmployeeRequest, Employee, UpdateEmployeeRequest};
use crate::database::repositories::{EmployeeRepository, EmployeeRoleRepository, RoleRepository};
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::middleware::auth::AuthenticatedUser;
use crate::middleware::restaurant_context::RestaurantContext;

/// `POST /v1/restaurants/{restaurantID}/employees`.
pub async fn create(
    repo: web::Data<Arc<dyn EmployeeRepository>>,
    ctx: RestaurantContext,
    user: AuthenticatedUser,
    req: web::Json<CreateEmployeeRequest>,
) -> Result<HttpResponse, AppError> {
    ctx.require_owner(&user)?;
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let employee = repo.create(ctx.restaurant.id, &req).await?;
    Ok(ApiResponse::created(employee))
}

/// `GET /v1/restaurants/{restaurantID}/employees`.
pub async fn list(
    repo: web::Data<Arc<dyn EmployeeRepository>>,
    ctx: RestaurantContext,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    ctx.require_owner(&user)?;
    let employees = repo.list_by_restaurant(ctx.restaurant.id).await?;
    Ok(ApiResponse::success(employees))
}

/// Resolves `{employeeID}`, masking an employee belonging to a different
/// restaurant as `NotFound`, the same ownership-as-404 policy applied to
/// restaurants themselves.
async fn owned_employee(
    repo: &Arc<dyn EmployeeRepository>,
    ctx: &RestaurantContext,
    employee_id: Uuid,
) -> Result<Employee, AppError> {
    let employee = repo
        .find_by_id(employee_id)
        .await?
        .ok_or_else(AppError::ownership_masked)?;
    if employee.restaurant_id != ctx.restaurant.id {
        return Err(AppError::ownership_masked());
    }
    Ok(employee)
}

/// `GET /v1/restaurants/{restaurantID}/employees/{employeeID}`.
pub async fn get(
    repo: web::Data<Arc<dyn EmployeeRepository>>,
    ctx: RestaurantContext,
    user: AuthenticatedUser,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse, AppError> {
    ctx.require_owner(&user)?;
    let (_, employee_id) = path.into_inner();
    let employee = owned_employee(repo.get_ref(), &ctx, employee_id).await?;
    Ok(ApiResponse::success(employee))
}

/// `PUT /v1/restaurants/{restaurantID}/employees/{employeeID}`.
pub async fn update(
    repo: web::Data<Arc<dyn EmployeeRepository>>,
    ctx: RestaurantContext,
    user: AuthenticatedUser,
    path: web::Path<(Uuid, Uuid)>,
    req: web::Json<UpdateEmployeeRequest>,
) -> Result<HttpResponse, AppError> {
    ctx.require_owner(&user)?;
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let (_, employee_id) = path.into_inner();
    owned_employee(repo.get_ref(), &ctx, employee_id).await?;

    let employee = repo.update(employee_id, &req).await?;
    Ok(ApiResponse::success(employee))
}

/// `DELETE /v1/restaurants/{restaurantID}/employees/{employeeID}` — nulls
/// `employee_id` on any `ScheduledShift` referencing this employee (the
/// shift survives, becomes open); enforced by `ON DELETE SET NULL`.
pub async fn delete(
    repo: web::Data<Arc<dyn EmployeeRepository>>,
    ctx: RestaurantContext,
    user: AuthenticatedUser,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse, AppError> {
    ctx.require_owner(&user)?;
    let (_, employee_id) = path.into_inner();
    owned_employee(repo.get_ref(), &ctx, employee_id).await?;

    repo.delete(employee_id).await?;
    Ok(ApiResponse::deleted())
}

/// `GET /v1/restaurants/{restaurantID}/employees/{employeeID}/roles`.
pub async fn list_roles(
    employee_repo: web::Data<Arc<dyn EmployeeRepository>>,
    ctx: RestaurantContext,
    user: AuthenticatedUser,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse, AppError> {
    ctx.require_owner(&user)?;
    let (_, employee_id) = path.into_inner();
    owned_employee(employee_repo.get_ref(), &ctx, employee_id).await?;

    let role_ids = employee_repo.role_ids(employee_id).await?;
    Ok(ApiResponse::success(role_ids))
}

/// `POST /v1/restaurants/{restaurantID}/employees/{employeeID}/roles/{roleID}`
/// grants role membership. Both the employee and role must belong to the
/// restaurant in scope — `EmployeeRole` is a weak relation, not an
/// ownership edge, so each side is checked independently.
pub async fn grant_role(
    employee_repo: web::Data<Arc<dyn EmployeeRepository>>,
    role_repo: web::Data<Arc<dyn RoleRepository>>,
    employee_role_repo: web::Data<Arc<dyn EmployeeRoleRepository>>,
    ctx: RestaurantContext,
    user: AuthenticatedUser,
    path: web::Path<(Uuid, Uuid, Uuid)>,
) -> Result<HttpResponse, AppError> {
    ctx.require_owner(&user)?;
    let (_, employee_id, role_id) = path.into_inner();
    owned_employee(employee_repo.get_ref(), &ctx, employee_id).await?;

    let role = role_repo
        .find_by_id(role_id)
        .await?
        .ok_or_else(AppError::ownership_masked)?;
    if role.restaurant_id != ctx.restaurant.id {
        return Err(AppError::ownership_masked());
    }

    employee_role_repo.grant(employee_id, role_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// `DELETE /v1/restaurants/{restaurantID}/employees/{employeeID}/roles/{roleID}`.
pub async fn revoke_role(
    employee_repo: web::Data<Arc<dyn EmployeeRepository>>,
    employee_role_repo: web::Data<Arc<dyn EmployeeRoleRepository>>,
    ctx: RestaurantContext,
    user: AuthenticatedUser,
    path: web::Path<(Uuid, Uuid, Uuid)>,
) -> Result<HttpResponse, AppError> {
    ctx.require_owner(&user)?;
    let (_, employee_id, role_id) = path.into_inner();
    owned_employee(employee_repo.get_ref(), &ctx, employee_id).await?;

    employee_role_repo.revoke(employee_id, role_id).await?;
    Ok(HttpResponse::NoContent().finish())
}
