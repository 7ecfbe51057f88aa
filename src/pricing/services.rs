//! Pricing service functions with database and cache access.
//!
//! Catalog lookups go to the cache first and the database second. Checkout
//! sessions each own a `PricingStore`; these functions resolve catalog
//! references and then drive the store's mutators.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::cache::AppCache;
use crate::error::AppError;

use super::models::{Addon, BookSize, Lamination, Package, PaperColor, PricingMode, ScenarioFees};
use super::queries;
use super::store::PricingStore;

/// Pricing error types surfaced to callers
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PricingError {
    #[error("metadata too large for provider limits ({size} bytes, limit {limit})")]
    MetadataTooLarge { size: usize, limit: usize },

    #[error("failed to serialize payment metadata: {0}")]
    Serialization(String),
}

/// A live checkout and its pricing state
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    pub id: Uuid,
    pub store: PricingStore,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CheckoutSession {
    pub fn new(mode: PricingMode, fees: ScenarioFees) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            store: PricingStore::with_fees(mode, fees),
            created_at: now,
            updated_at: now,
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Configuration choices applied together
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigurationUpdate {
    pub has_cover_design: Option<bool>,
    pub has_formatting: Option<bool>,
    pub book_size: Option<BookSize>,
    pub paper_color: Option<PaperColor>,
    pub lamination: Option<Lamination>,
}

// ==================== catalog ====================

/// Look up an active package by id
pub async fn get_package(pool: &PgPool, cache: &AppCache, id: &str) -> Result<Arc<Package>, AppError> {
    if let Some(cached) = cache.packages.get(id).await {
        debug!("Cache HIT for package: {}", id);
        return Ok(cached);
    }
    debug!("Cache MISS for package: {}", id);

    let package = queries::find_package(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("package {}", id)))?;
    let package = Arc::new(package);
    cache.packages.insert(id.to_string(), package.clone()).await;
    Ok(package)
}

/// Look up an active addon by id
pub async fn get_addon(pool: &PgPool, cache: &AppCache, id: &str) -> Result<Arc<Addon>, AppError> {
    if let Some(cached) = cache.addons.get(id).await {
        debug!("Cache HIT for addon: {}", id);
        return Ok(cached);
    }
    debug!("Cache MISS for addon: {}", id);

    let addon = queries::find_addon(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("addon {}", id)))?;
    let addon = Arc::new(addon);
    cache.addons.insert(id.to_string(), addon.clone()).await;
    Ok(addon)
}

/// Resolve several addons, preserving the requested order
pub async fn get_addons(pool: &PgPool, cache: &AppCache, ids: &[String]) -> Result<Vec<Addon>, AppError> {
    let mut addons = Vec::with_capacity(ids.len());
    for id in ids {
        addons.push((*get_addon(pool, cache, id).await?).clone());
    }
    Ok(addons)
}

// ==================== sessions ====================

pub async fn create_session(cache: &AppCache, mode: PricingMode, fees: ScenarioFees) -> CheckoutSession {
    let session = CheckoutSession::new(mode, fees);
    cache
        .sessions
        .insert(session.id, Arc::new(Mutex::new(session.clone())))
        .await;
    info!("Checkout session {} created ({} pricing)", session.id, mode);
    session
}

async fn load_session(cache: &AppCache, id: Uuid) -> Result<Arc<Mutex<CheckoutSession>>, AppError> {
    cache
        .sessions
        .get(&id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("checkout session {}", id)))
}

/// Run a mutation against a session's store and return the updated snapshot
async fn update_session<F>(cache: &AppCache, id: Uuid, mutate: F) -> Result<CheckoutSession, AppError>
where
    F: FnOnce(&mut PricingStore),
{
    let handle = load_session(cache, id).await?;
    let mut session = handle.lock().await;
    mutate(&mut session.store);
    session.touch();
    debug!(
        "Checkout session {} updated, total now {}",
        id,
        session.store.total_price()
    );
    Ok(session.clone())
}

pub async fn get_session(cache: &AppCache, id: Uuid) -> Result<CheckoutSession, AppError> {
    let handle = load_session(cache, id).await?;
    let session = handle.lock().await;
    Ok(session.clone())
}

pub async fn delete_session(cache: &AppCache, id: Uuid) -> Result<(), AppError> {
    load_session(cache, id).await?;
    cache.sessions.invalidate(&id).await;
    info!("Checkout session {} discarded", id);
    Ok(())
}

pub async fn select_package(
    pool: &PgPool,
    cache: &AppCache,
    id: Uuid,
    package_id: Option<&str>,
) -> Result<CheckoutSession, AppError> {
    let package = match package_id {
        Some(package_id) => Some((*get_package(pool, cache, package_id).await?).clone()),
        None => None,
    };
    update_session(cache, id, |store| store.set_selected_package(package)).await
}

pub async fn set_addons(
    pool: &PgPool,
    cache: &AppCache,
    id: Uuid,
    addon_ids: &[String],
) -> Result<CheckoutSession, AppError> {
    let addons = get_addons(pool, cache, addon_ids).await?;
    update_session(cache, id, |store| store.set_selected_addons(addons)).await
}

pub async fn toggle_addon(
    pool: &PgPool,
    cache: &AppCache,
    id: Uuid,
    addon_id: &str,
) -> Result<CheckoutSession, AppError> {
    let addon = (*get_addon(pool, cache, addon_id).await?).clone();
    update_session(cache, id, |store| store.toggle_selected_addon(addon)).await
}

pub async fn remove_addon(cache: &AppCache, id: Uuid, addon_id: &str) -> Result<CheckoutSession, AppError> {
    update_session(cache, id, |store| store.remove_selected_addon(addon_id)).await
}

pub async fn update_configuration(
    cache: &AppCache,
    id: Uuid,
    update: ConfigurationUpdate,
) -> Result<CheckoutSession, AppError> {
    update_session(cache, id, |store| {
        store.set_has_cover_design(update.has_cover_design);
        store.set_has_formatting(update.has_formatting);
        store.set_book_size(update.book_size);
        store.set_paper_color(update.paper_color);
        store.set_lamination(update.lamination);
    })
    .await
}

pub async fn apply_formatting_cost(
    cache: &AppCache,
    id: Uuid,
    word_count: Decimal,
    price_per_word: Decimal,
) -> Result<CheckoutSession, AppError> {
    update_session(cache, id, |store| store.apply_formatting_cost(word_count, price_per_word)).await
}

pub async fn apply_coupon(
    cache: &AppCache,
    id: Uuid,
    code: &str,
    discount_amount: Decimal,
) -> Result<CheckoutSession, AppError> {
    update_session(cache, id, |store| store.apply_coupon(code, discount_amount)).await
}

pub async fn clear_coupon(cache: &AppCache, id: Uuid) -> Result<CheckoutSession, AppError> {
    update_session(cache, id, PricingStore::clear_coupon).await
}

pub async fn reset_session(cache: &AppCache, id: Uuid) -> Result<CheckoutSession, AppError> {
    update_session(cache, id, PricingStore::reset).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    #[test]
    fn test_pricing_error_display() {
        let err = PricingError::MetadataTooLarge { size: 612, limit: 500 };
        assert!(err.to_string().contains("metadata too large for provider limits"));
        assert!(err.to_string().contains("612"));

        let err = PricingError::Serialization("boom".to_string());
        assert!(err.to_string().contains("boom"));
    }

    #[tokio::test]
    async fn test_session_lifecycle_without_catalog() {
        let cache = AppCache::new(Duration::from_secs(60));
        let session = create_session(&cache, PricingMode::ScenarioAware, ScenarioFees::default()).await;

        let updated = apply_coupon(&cache, session.id, " SAVE ", dec!(100)).await.unwrap();
        assert_eq!(updated.store.selection().coupon_code.as_deref(), Some("SAVE"));
        assert!(updated.updated_at >= session.updated_at);

        let updated = update_configuration(
            &cache,
            session.id,
            ConfigurationUpdate {
                has_cover_design: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.store.addon_total(), dec!(25000));

        let reset = reset_session(&cache, session.id).await.unwrap();
        assert_eq!(reset.store.total_price(), Decimal::ZERO);
        assert_eq!(reset.store.mode(), PricingMode::ScenarioAware);

        delete_session(&cache, session.id).await.unwrap();
        assert!(matches!(get_session(&cache, session.id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let cache = AppCache::new(Duration::from_secs(60));
        let result = clear_coupon(&cache, Uuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
