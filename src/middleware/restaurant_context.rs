use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use actix_web::{FromRequest, HttpRequest, dev::Payload, web::Data};
use uuid::Uuid;

use crate::cache::RestaurantCache;
use crate::database::models::Restaurant;
use crate::database::repositories::RestaurantRepository;
use crate::error::AppError;
use crate::middleware::auth::AuthenticatedUser;

/// Request-scoped tenant context, assembled from the `{restaurant_id}` path
/// segment plus a cache-first lookup.
pub struct RestaurantContext {
    pub restaurant: Restaurant,
}

impl RestaurantContext {
    /// The "ownership-as-NotFound" policy: a caller who is not the owner
    /// gets exactly the same error as a caller asking about a restaurant id
    /// that doesn't exist.
    pub fn require_owner(&self, user: &AuthenticatedUser) -> Result<(), AppError> {
        if self.restaurant.owner_user_id != user.user.id {
            return Err(AppError::ownership_masked());
        }
        Ok(())
    }
}

impl FromRequest for RestaurantContext {
    type Error = AppError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        let mut payload = payload.take();

        Box::pin(async move {
            let restaurant_id: Uuid = req
                .match_info()
                .get("restaurant_id")
                .ok_or_else(|| {
                    AppError::BadRequest("missing restaurantId path segment".to_string())
                })?
                .parse()
                .map_err(|_| AppError::BadRequest("invalid restaurantId".to_string()))?;

            let cache = req.app_data::<Data<Arc<dyn RestaurantCache>>>();

            if let Some(cache) = cache {
                if let Some(restaurant) = cache.get(restaurant_id).await {
                    // Defense in depth: a cache hit is only trusted once we
                    // confirm the requesting principal still owns it. A
                    // mismatch (or an absent/invalid principal) falls
                    // through to the DB lookup below rather than trusting
                    // the cached row.
                    let owner_matches = AuthenticatedUser::from_request(&req, &mut payload)
                        .await
                        .map(|authenticated| authenticated.user.id == restaurant.owner_user_id)
                        .unwrap_or(false);

                    if owner_matches {
                        return Ok(RestaurantContext { restaurant });
                    }
                }
            }

            let repo = req
                .app_data::<Data<Arc<dyn RestaurantRepository>>>()
                .ok_or_else(|| {
                    AppError::Internal(anyhow::anyhow!("missing RestaurantRepository in app data"))
                })?;

            let restaurant = repo
                .find_by_id(restaurant_id)
                .await?
                .ok_or_else(AppError::ownership_masked)?;

            if let Some(cache) = cache {
                cache.set(restaurant.clone()).await;
            }

            Ok(RestaurantContext { restaurant })
        })
    }
}
