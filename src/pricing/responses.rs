//! Response DTOs for pricing API endpoints.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::metadata::{AddonBreakdownLine, PaymentMetadata, ProviderMetadata};
use super::models::PricingMode;
use super::services::CheckoutSession;
use super::store::{PricingStore, Selection};

/// Derived prices for a selection
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    pub mode: PricingMode,
    #[serde(with = "rust_decimal::serde::str")]
    pub base_price: Decimal,
    pub addon_breakdown: Vec<AddonBreakdownLine>,
    #[serde(with = "rust_decimal::serde::str")]
    pub addon_total: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub discount_amount: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_price: Decimal,
    pub payment_metadata: PaymentMetadata,
}

impl From<&PricingStore> for QuoteResponse {
    fn from(store: &PricingStore) -> Self {
        QuoteResponse {
            mode: store.mode(),
            base_price: store.base_price(),
            addon_breakdown: store.addon_breakdown(),
            addon_total: store.addon_total(),
            discount_amount: store.effective_discount(),
            total_price: store.total_price(),
            payment_metadata: store.to_payment_metadata(),
        }
    }
}

/// Checkout session state and its quote
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub selection: Selection,
    pub quote: QuoteResponse,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&CheckoutSession> for SessionResponse {
    fn from(session: &CheckoutSession) -> Self {
        SessionResponse {
            session_id: session.id,
            selection: session.store.selection().clone(),
            quote: QuoteResponse::from(&session.store),
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}

/// Metadata fitted to a provider's size limit
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderMetadataResponse {
    pub minimized: bool,
    pub limit: usize,
    pub metadata: ProviderMetadata,
}

/// Generic error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error_type: String,
    pub message: String,
}
