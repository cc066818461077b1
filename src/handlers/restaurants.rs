use actix_web::{HttpResponse, web};
use std::sync::Arc;
use validator::Validate;

use crate::cache::RestaurantCache;
use crate::database::models::{CreateRestaurantRequest, UpdateRestaurantRequest};
use crate::database::repositories::RestaurantRepository;
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::middleware::auth::AuthenticatedUser;
use crate::middleware::restaurant_context::RestaurantContext;

/// `POST /v1/restaurants` — the caller becomes the owner of the new
/// restaurant.
pub async fn create(
    repo: web::Data<Arc<dyn RestaurantRepository>>,
    user: AuthenticatedUser,
    req: web::Json<CreateRestaurantRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let restaurant = repo.create(user.user.id, &req).await?;
    Ok(ApiResponse::created(restaurant))
}

/// `GET /v1/restaurants` — restaurants owned by the caller.
pub async fn list(
    repo: web::Data<Arc<dyn RestaurantRepository>>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let restaurants = repo.list_by_owner(user.user.id).await?;
    Ok(ApiResponse::success(restaurants))
}

/// `GET /v1/restaurants/{restaurantID}`.
pub async fn get(
    ctx: RestaurantContext,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    ctx.require_owner(&user)?;
    Ok(ApiResponse::success(ctx.restaurant))
}

/// `PUT /v1/restaurants/{restaurantID}` — optimistic-concurrency update;
/// `req.version` must match the currently stored row. A successful write
/// invalidates the cache entry so the next read is never stale.
pub async fn update(
    repo: web::Data<Arc<dyn RestaurantRepository>>,
    cache: web::Data<Arc<dyn RestaurantCache>>,
    ctx: RestaurantContext,
    user: AuthenticatedUser,
    req: web::Json<UpdateRestaurantRequest>,
) -> Result<HttpResponse, AppError> {
    ctx.require_owner(&user)?;
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let restaurant = repo.update(ctx.restaurant.id, &req).await?;
    cache.invalidate(restaurant.id).await;
    Ok(ApiResponse::success(restaurant))
}

/// `DELETE /v1/restaurants/{restaurantID}`.
pub async fn delete(
    repo: web::Data<Arc<dyn RestaurantRepository>>,
    cache: web::Data<Arc<dyn RestaurantCache>>,
    ctx: RestaurantContext,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    ctx.require_owner(&user)?;
    cache.invalidate(ctx.restaurant.id).await;
    repo.delete(ctx.restaurant.id).await?;
    Ok(ApiResponse::deleted())
}
