//! Write-through cache keyed by restaurant id, generalized from the
//! teacher's tag-based HTTP cache (`src/middleware/cache.rs`) down to a
//! single keyed-aggregate cache.

use async_trait::async_trait;
use moka::future::Cache;
use std::time::Duration;
use uuid::Uuid;

use crate::database::models::Restaurant;

#[async_trait]
pub trait RestaurantCache: Send + Sync {
    async fn get(&self, id: Uuid) -> Option<Restaurant>;
    async fn set(&self, restaurant: Restaurant);
    async fn invalidate(&self, id: Uuid);
}

/// Backs `RestaurantCache` with an in-process `moka` cache. The config key
/// this is built from is named `redis.*` for historical
/// reasons in the source system; RESA honors the Get/Set/Delete-with-TTL
/// interface rather than standing up a real Redis client (see DESIGN.md).
pub struct MokaRestaurantCache {
    cache: Cache<Uuid, Restaurant>,
}

impl MokaRestaurantCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Cache::builder().time_to_live(ttl).build(),
        }
    }
}

#[async_trait]
impl RestaurantCache for MokaRestaurantCache {
    async fn get(&self, id: Uuid) -> Option<Restaurant> {
        self.cache.get(&id).await
    }

    async fn set(&self, restaurant: Restaurant) {
        self.cache.insert(restaurant.id, restaurant).await;
    }

    async fn invalidate(&self, id: Uuid) {
        self.cache.invalidate(&id).await;
    }
}

/// Pass-through used when `cache.enabled=false`
/// and in tests that don't want cache staleness to matter.
#[derive(Default)]
pub struct NoopRestaurantCache;

#[async_trait]
impl RestaurantCache for NoopRestaurantCache {
    async fn get(&self, _id: Uuid) -> Option<Restaurant> {
        None
    }

    async fn set(&self, _restaurant: Restaurant) {}

    async fn invalidate(&self, _id: Uuid) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_restaurant() -> Restaurant {
        Restaurant {
            id: Uuid::new_v4(),
            owner_user_id: Uuid::new_v4(),
            name: "Test Diner".to_string(),
            address: "1 Main St".to_string(),
            phone: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            version: 1,
        }
    }

    #[tokio::test]
    async fn moka_cache_round_trips() {
        let cache = MokaRestaurantCache::new(Duration::from_secs(60));
        let restaurant = sample_restaurant();
        cache.set(restaurant.clone()).await;
        assert_eq!(cache.get(restaurant.id).await.unwrap().id, restaurant.id);
    }

    #[tokio::test]
    async fn moka_cache_invalidate_clears_entry() {
        let cache = MokaRestaurantCache::new(Duration::from_secs(60));
        let restaurant = sample_restaurant();
        cache.set(restaurant.clone()).await;
        cache.invalidate(restaurant.id).await;
        assert!(cache.get(restaurant.id).await.is_none());
    }

    #[tokio::test]
    async fn noop_cache_never_returns_a_hit() {
        let cache = NoopRestaurantCache;
        let restaurant = sample_restaurant();
        cache.set(restaurant.clone()).await;
        assert!(cache.get(restaurant.id).await.is_none());
    }
}
