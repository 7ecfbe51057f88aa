//! In-memory caching using moka
//!
//! Holds catalog records (packages and addons) and live checkout sessions.
//! Catalog prices change rarely, so the catalog is refreshed on a timer;
//! sessions expire after a period of inactivity, which discards abandoned checkouts.

use moka::future::Cache;
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::interval;
use tracing::{info, warn};
use uuid::Uuid;

use crate::pricing::models::{Addon, Package};
use crate::pricing::queries;
use crate::pricing::services::CheckoutSession;

/// Application cache holding catalog records and checkout sessions
#[derive(Clone)]
pub struct AppCache {
    /// Packages (id -> Package)
    pub packages: Cache<String, Arc<Package>>,
    /// Addons (id -> Addon)
    pub addons: Cache<String, Arc<Addon>>,
    /// Checkout sessions (session id -> session)
    pub sessions: Cache<Uuid, Arc<Mutex<CheckoutSession>>>,
}

impl AppCache {
    /// Create a new cache instance; sessions idle longer than `session_idle` are dropped
    pub fn new(session_idle: Duration) -> Self {
        Self {
            // Packages: 100 entries, 30 min TTL
            packages: Cache::builder()
                .max_capacity(100)
                .time_to_live(Duration::from_secs(30 * 60))
                .build(),

            // Addons: 500 entries, 30 min TTL
            addons: Cache::builder()
                .max_capacity(500)
                .time_to_live(Duration::from_secs(30 * 60))
                .build(),

            // Sessions: 10k concurrent checkouts, idle expiry only
            sessions: Cache::builder()
                .max_capacity(10_000)
                .time_to_idle(session_idle)
                .build(),
        }
    }

    /// Get cache statistics for monitoring
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            packages_size: self.packages.entry_count(),
            addons_size: self.addons.entry_count(),
            sessions_size: self.sessions.entry_count(),
        }
    }

    /// Invalidate catalog entries; sessions are kept
    pub fn invalidate_catalog(&self) {
        self.packages.invalidate_all();
        self.addons.invalidate_all();
        info!("Catalog caches invalidated");
    }

    /// Seed the catalog cache directly
    pub async fn insert_package(&self, package: Package) {
        self.packages
            .insert(package.id.clone(), Arc::new(package))
            .await;
    }

    pub async fn insert_addon(&self, addon: Addon) {
        self.addons.insert(addon.id.clone(), Arc::new(addon)).await;
    }
}

/// Cache statistics for monitoring endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub packages_size: u64,
    pub addons_size: u64,
    pub sessions_size: u64,
}

/// Start background catalog warmer
///
/// Warms the catalog on startup and refreshes every 10 minutes.
pub async fn start_cache_warmer(cache: AppCache, db: PgPool) {
    let mut interval = interval(Duration::from_secs(10 * 60));
    loop {
        // First tick completes immediately
        interval.tick().await;
        warm_catalog(&cache, &db).await;
    }
}

/// Load every active package and addon into the cache
async fn warm_catalog(cache: &AppCache, db: &PgPool) {
    info!("Starting catalog warm-up...");

    match queries::list_active_packages(db).await {
        Ok(packages) => {
            for package in packages {
                cache.insert_package(package).await;
            }
        }
        Err(e) => warn!("Failed to warm package cache: {}", e),
    }

    match queries::list_active_addons(db).await {
        Ok(addons) => {
            for addon in addons {
                cache.insert_addon(addon).await;
            }
        }
        Err(e) => warn!("Failed to warm addon cache: {}", e),
    }

    info!("Catalog warm-up complete. Stats: {:?}", cache.stats());
}
