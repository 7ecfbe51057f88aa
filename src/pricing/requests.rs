//! Request DTOs for pricing API endpoints.

use rust_decimal::Decimal;
use serde::Deserialize;

use super::models::{Addon, BookSize, Lamination, Package, PaperColor, PricingMode};
use super::services::ConfigurationUpdate;
use super::store::PricingStore;

/// Complete selection snapshot for a stateless quote
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    #[serde(default)]
    pub mode: Option<PricingMode>,
    #[serde(default)]
    pub package: Option<Package>,
    #[serde(default)]
    pub addons: Vec<Addon>,
    #[serde(default)]
    pub has_cover_design: Option<bool>,
    #[serde(default)]
    pub has_formatting: Option<bool>,
    #[serde(default)]
    pub book_size: Option<BookSize>,
    #[serde(default)]
    pub paper_color: Option<PaperColor>,
    #[serde(default)]
    pub lamination: Option<Lamination>,
    #[serde(default)]
    pub formatting_word_count: Decimal,
    #[serde(default)]
    pub formatting_price_per_word: Decimal,
    #[serde(default)]
    pub coupon_code: Option<String>,
    #[serde(default)]
    pub discount_amount: Decimal,
}

impl QuoteRequest {
    /// Replay the snapshot through a fresh store's mutators
    pub fn into_store(self, default_store: PricingStore) -> PricingStore {
        let mut store = match self.mode {
            Some(mode) if mode != default_store.mode() => {
                PricingStore::with_fees(mode, default_store.fees())
            }
            _ => default_store,
        };
        store.set_selected_package(self.package);
        store.set_selected_addons(self.addons);
        store.set_has_cover_design(self.has_cover_design);
        store.set_has_formatting(self.has_formatting);
        store.set_book_size(self.book_size);
        store.set_paper_color(self.paper_color);
        store.set_lamination(self.lamination);
        store.apply_formatting_cost(self.formatting_word_count, self.formatting_price_per_word);
        match self.coupon_code {
            Some(code) => store.apply_coupon(&code, self.discount_amount),
            None => store.clear_coupon(),
        }
        store
    }
}

/// Provider limit override for metadata endpoints
#[derive(Debug, Deserialize)]
pub struct MetadataQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Request to open a checkout session
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub mode: Option<PricingMode>,
}

/// Request to select (or clear) the package
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectPackageRequest {
    #[serde(default)]
    pub package_id: Option<String>,
}

/// Request to replace the addon selection
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetAddonsRequest {
    pub addon_ids: Vec<String>,
}

/// Request to toggle one addon
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleAddonRequest {
    pub addon_id: String,
}

/// Request to replace the book configuration; absent fields become undecided
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateConfigurationRequest {
    #[serde(default)]
    pub has_cover_design: Option<bool>,
    #[serde(default)]
    pub has_formatting: Option<bool>,
    #[serde(default)]
    pub book_size: Option<BookSize>,
    #[serde(default)]
    pub paper_color: Option<PaperColor>,
    #[serde(default)]
    pub lamination: Option<Lamination>,
}

impl From<UpdateConfigurationRequest> for ConfigurationUpdate {
    fn from(req: UpdateConfigurationRequest) -> Self {
        ConfigurationUpdate {
            has_cover_design: req.has_cover_design,
            has_formatting: req.has_formatting,
            book_size: req.book_size,
            paper_color: req.paper_color,
            lamination: req.lamination,
        }
    }
}

/// Request to apply manuscript formatting inputs
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyFormattingRequest {
    pub word_count: Decimal,
    #[serde(default)]
    pub price_per_word: Decimal,
}

/// Request to apply a coupon already validated upstream
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyCouponRequest {
    pub code: String,
    #[serde(default)]
    pub discount_amount: Decimal,
}
