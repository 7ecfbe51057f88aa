//! Payment metadata sent to the payment initialization endpoint.
//!
//! Some providers cap their metadata field, so the full record can be swapped
//! for a minimized projection. If even that does not fit the request fails;
//! nothing is ever truncated.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::calculators::LineSource;
use super::models::{BookSize, Lamination, PaperColor};
use super::services::PricingError;
use super::store::PricingStore;

/// Provider metadata limit in bytes when none is configured
pub const DEFAULT_METADATA_LIMIT: usize = 500;

/// Display line of the addon breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddonBreakdownLine {
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

/// Chargeable line with provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataAddon {
    pub id: Option<String>,
    pub slug: String,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub source: LineSource,
}

/// Chargeable line reduced to what reconciliation needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompactAddon {
    pub id: Option<String>,
    pub slug: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

/// Full pricing snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMetadata {
    pub has_cover: bool,
    pub has_formatting: bool,
    pub tier: Option<String>,
    pub package_id: Option<String>,
    pub package_slug: Option<String>,
    pub package_name: Option<String>,
    #[serde(rename = "includesISBN")]
    pub includes_isbn: bool,
    pub book_size: Option<BookSize>,
    pub paper_color: Option<PaperColor>,
    pub lamination: Option<Lamination>,
    pub formatting_word_count: u64,
    pub coupon_code: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub discount_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub base_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub addon_total: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_price: Decimal,
    pub addons: Vec<MetadataAddon>,
    pub addon_breakdown: Vec<AddonBreakdownLine>,
}

/// Scalar fields plus compacted addons
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinimalPaymentMetadata {
    pub has_cover: bool,
    pub has_formatting: bool,
    pub tier: Option<String>,
    pub package_id: Option<String>,
    pub package_slug: Option<String>,
    pub package_name: Option<String>,
    #[serde(rename = "includesISBN")]
    pub includes_isbn: bool,
    pub book_size: Option<BookSize>,
    pub paper_color: Option<PaperColor>,
    pub lamination: Option<Lamination>,
    pub formatting_word_count: u64,
    pub coupon_code: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub discount_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub base_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub addon_total: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_price: Decimal,
    pub addons: Vec<CompactAddon>,
}

/// Metadata as it will be embedded in the provider request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProviderMetadata {
    Full(PaymentMetadata),
    Minimal(MinimalPaymentMetadata),
}

impl ProviderMetadata {
    pub fn is_minimized(&self) -> bool {
        matches!(self, ProviderMetadata::Minimal(_))
    }
}

/// Serialized JSON length in bytes
pub fn encoded_len<T: Serialize>(value: &T) -> Result<usize, PricingError> {
    serde_json::to_vec(value)
        .map(|bytes| bytes.len())
        .map_err(|e| PricingError::Serialization(e.to_string()))
}

impl PaymentMetadata {
    pub(crate) fn from_store(store: &PricingStore) -> Self {
        let selection = store.selection();
        let package = selection.selected_package.as_ref();
        let lines = store.charge_lines();

        let addon_breakdown = lines
            .iter()
            .map(|line| AddonBreakdownLine {
                name: line.name.clone(),
                price: line.price,
            })
            .collect();
        let addons = lines
            .into_iter()
            .map(|line| MetadataAddon {
                id: line.addon_id,
                slug: line.slug,
                name: line.name,
                price: line.price,
                source: line.source,
            })
            .collect();

        PaymentMetadata {
            has_cover: selection.has_cover_design.unwrap_or(false),
            has_formatting: selection.has_formatting.unwrap_or(false),
            tier: package.map(|p| p.slug.clone()),
            package_id: package.map(|p| p.id.clone()),
            package_slug: package.map(|p| p.slug.clone()),
            package_name: package.map(|p| p.name.clone()),
            includes_isbn: package.map(|p| p.includes_isbn).unwrap_or(false),
            book_size: selection.book_size,
            paper_color: selection.paper_color,
            lamination: selection.lamination,
            formatting_word_count: selection.formatting_word_count,
            coupon_code: selection.coupon_code.clone(),
            discount_amount: store.effective_discount(),
            base_price: store.base_price(),
            addon_total: store.addon_total(),
            total_price: store.total_price(),
            addons,
            addon_breakdown,
        }
    }

    /// Project onto the scalar fields and compact addon entries
    pub fn minimize(&self) -> MinimalPaymentMetadata {
        MinimalPaymentMetadata {
            has_cover: self.has_cover,
            has_formatting: self.has_formatting,
            tier: self.tier.clone(),
            package_id: self.package_id.clone(),
            package_slug: self.package_slug.clone(),
            package_name: self.package_name.clone(),
            includes_isbn: self.includes_isbn,
            book_size: self.book_size,
            paper_color: self.paper_color,
            lamination: self.lamination,
            formatting_word_count: self.formatting_word_count,
            coupon_code: self.coupon_code.clone(),
            discount_amount: self.discount_amount,
            base_price: self.base_price,
            addon_total: self.addon_total,
            total_price: self.total_price,
            addons: self
                .addons
                .iter()
                .map(|a| CompactAddon {
                    id: a.id.clone(),
                    slug: a.slug.clone(),
                    price: a.price,
                })
                .collect(),
        }
    }

    /// Choose the richest representation that fits within `limit` bytes.
    pub fn fit(&self, limit: usize) -> Result<ProviderMetadata, PricingError> {
        let full_len = encoded_len(self)?;
        if full_len <= limit {
            return Ok(ProviderMetadata::Full(self.clone()));
        }

        let minimal = self.minimize();
        let minimal_len = encoded_len(&minimal)?;
        if minimal_len <= limit {
            warn!(
                "Payment metadata is {} bytes (limit {}), sending minimized {} bytes",
                full_len, limit, minimal_len
            );
            return Ok(ProviderMetadata::Minimal(minimal));
        }

        Err(PricingError::MetadataTooLarge {
            size: minimal_len,
            limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::models::{Addon, Package, PricingMode, PricingType};
    use rust_decimal_macros::dec;

    fn addon(id: &str, name: &str, price: Decimal) -> Addon {
        Addon {
            id: id.to_string(),
            slug: name.to_lowercase().replace(' ', "-"),
            name: name.to_string(),
            addon_type: None,
            price,
            pricing_type: PricingType::Fixed,
            price_per_word: None,
            is_auto_included: false,
        }
    }

    fn populated_store() -> PricingStore {
        let mut store = PricingStore::new(PricingMode::ScenarioAware);
        store.set_selected_package(Some(Package {
            id: "clx9pkg000standard".to_string(),
            name: "Standard Publishing".to_string(),
            slug: "standard-publishing".to_string(),
            base_price: dec!(100000),
            includes_isbn: true,
        }));
        store.set_selected_addons(vec![
            addon("clx9add000marketing", "Marketing Kit", dec!(5000)),
            addon("clx9add000copies", "Author Copies", dec!(12000)),
        ]);
        store.set_has_cover_design(Some(false));
        store.set_has_formatting(Some(true));
        store.apply_coupon("WELCOME", dec!(15000));
        store
    }

    #[test]
    fn test_metadata_matches_derivations() {
        let store = populated_store();
        let metadata = store.to_payment_metadata();

        assert_eq!(metadata.total_price, store.total_price());
        assert_eq!(metadata.base_price, store.base_price());
        assert_eq!(metadata.addon_total, store.addon_total());
        assert_eq!(metadata.addon_breakdown, store.addon_breakdown());
        assert!(!metadata.has_cover);
        assert!(metadata.has_formatting);
        assert!(metadata.includes_isbn);
        assert_eq!(metadata.tier.as_deref(), Some("standard-publishing"));
        assert_eq!(metadata.addons.len(), 3);
        assert_eq!(metadata.addons[2].source, LineSource::Scenario);
        assert_eq!(metadata.addons[2].id, None);
    }

    #[test]
    fn test_metadata_serializes_camel_case_numbers() {
        let metadata = populated_store().to_payment_metadata();
        let json = serde_json::to_value(&metadata).unwrap();

        assert_eq!(json["includesISBN"], serde_json::json!(true));
        assert_eq!(json["basePrice"].as_f64(), Some(100000.0));
        assert_eq!(json["addons"][0]["source"], serde_json::json!("selected"));
        assert_eq!(json["couponCode"], serde_json::json!("WELCOME"));
    }

    #[test]
    fn test_empty_store_metadata() {
        let metadata = PricingStore::default().to_payment_metadata();
        assert_eq!(metadata.package_id, None);
        assert_eq!(metadata.total_price, Decimal::ZERO);
        assert!(metadata.addons.is_empty());
    }

    #[test]
    fn test_fit_keeps_full_when_room() {
        let metadata = populated_store().to_payment_metadata();
        let fitted = metadata.fit(8192).unwrap();
        assert_eq!(fitted, ProviderMetadata::Full(metadata));
    }

    #[test]
    fn test_fit_falls_back_to_minimal() {
        let metadata = populated_store().to_payment_metadata();
        let full_len = encoded_len(&metadata).unwrap();
        let minimal_len = encoded_len(&metadata.minimize()).unwrap();
        assert!(minimal_len < full_len);

        let fitted = metadata.fit(minimal_len).unwrap();
        assert!(fitted.is_minimized());
    }

    #[test]
    fn test_fit_rejects_oversized() {
        let metadata = populated_store().to_payment_metadata();
        match metadata.fit(64) {
            Err(PricingError::MetadataTooLarge { size, limit }) => {
                assert_eq!(limit, 64);
                assert!(size > 64);
            }
            other => panic!("expected MetadataTooLarge, got {:?}", other),
        }
    }
}
