//! Database queries for the publishing catalog.
//!
//! The catalog tables belong to the admin backend; these queries only read
//! them. Prices are cast to NUMERIC so they decode as `Decimal` regardless of
//! the column's storage type.

use sqlx::PgPool;

use crate::error::AppError;

use super::models::{Addon, AddonRow, Package};

/// Find an active package by id
pub async fn find_package(pool: &PgPool, id: &str) -> Result<Option<Package>, AppError> {
    let package = sqlx::query_as::<_, Package>(
        r#"
        SELECT
            id,
            name,
            slug,
            "basePrice"::numeric AS base_price,
            "includesISBN" AS includes_isbn
        FROM "Package"
        WHERE id = $1
          AND "isActive" = true
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(package)
}

/// List all active packages
pub async fn list_active_packages(pool: &PgPool) -> Result<Vec<Package>, AppError> {
    let packages = sqlx::query_as::<_, Package>(
        r#"
        SELECT
            id,
            name,
            slug,
            "basePrice"::numeric AS base_price,
            "includesISBN" AS includes_isbn
        FROM "Package"
        WHERE "isActive" = true
        ORDER BY "basePrice" ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(packages)
}

/// Find an active addon by id
pub async fn find_addon(pool: &PgPool, id: &str) -> Result<Option<Addon>, AppError> {
    let row = sqlx::query_as::<_, AddonRow>(
        r#"
        SELECT
            id,
            slug,
            name,
            "type"::text AS addon_type,
            price::numeric AS price,
            "pricingType"::text AS pricing_type,
            "pricePerWord"::numeric AS price_per_word
        FROM "Addon"
        WHERE id = $1
          AND "isActive" = true
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(Addon::from))
}

/// List all active addons
pub async fn list_active_addons(pool: &PgPool) -> Result<Vec<Addon>, AppError> {
    let rows = sqlx::query_as::<_, AddonRow>(
        r#"
        SELECT
            id,
            slug,
            name,
            "type"::text AS addon_type,
            price::numeric AS price,
            "pricingType"::text AS pricing_type,
            "pricePerWord"::numeric AS price_per_word
        FROM "Addon"
        WHERE "isActive" = true
        ORDER BY name ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Addon::from).collect())
}
