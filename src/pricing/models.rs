//! Catalog and configuration models for the pricing engine.
//!
//! `Package` and `Addon` mirror the catalog API's response bodies. The `*Row`
//! types use sqlx's FromRow derive for direct database deserialization and are
//! converted into the engine-facing types, normalizing unknown tags on the way.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

/// Cover fee charged by the scenario-aware engine when no cover addon is selected.
pub const DEFAULT_COVER_FEE: Decimal = dec!(25000);

/// Formatting fee charged by the scenario-aware engine when neither a word
/// count nor a formatting addon is available.
pub const DEFAULT_FORMATTING_FEE: Decimal = dec!(20000);

/// Publishing package (read-only reference data)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub base_price: Decimal,
    #[serde(rename = "includesISBN", default)]
    pub includes_isbn: bool,
}

/// Explicit addon classification from the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddonType {
    Cover,
    Formatting,
    Isbn,
    Other,
}

impl FromStr for AddonType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cover" => Ok(AddonType::Cover),
            "formatting" => Ok(AddonType::Formatting),
            "isbn" => Ok(AddonType::Isbn),
            "other" => Ok(AddonType::Other),
            _ => Err(()),
        }
    }
}

/// How an addon's price is determined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingType {
    #[default]
    Fixed,
    PerWord,
}

impl FromStr for PricingType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixed" => Ok(PricingType::Fixed),
            "per_word" | "perword" => Ok(PricingType::PerWord),
            _ => Err(()),
        }
    }
}

/// Optional purchasable extra (read-only reference data)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Addon {
    pub id: String,
    pub slug: String,
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub addon_type: Option<AddonType>,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default)]
    pub pricing_type: PricingType,
    #[serde(default)]
    pub price_per_word: Option<Decimal>,
    #[serde(default)]
    pub is_auto_included: bool,
}

/// Addon record as stored in the catalog database
#[derive(Debug, Clone, FromRow)]
pub struct AddonRow {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub addon_type: Option<String>,
    pub price: Decimal,
    pub pricing_type: String,
    pub price_per_word: Option<Decimal>,
}

impl From<AddonRow> for Addon {
    fn from(row: AddonRow) -> Self {
        Addon {
            id: row.id,
            slug: row.slug,
            name: row.name,
            // Unknown tags fall back to heuristic classification
            addon_type: row.addon_type.as_deref().and_then(|t| t.parse().ok()),
            price: row.price,
            pricing_type: row.pricing_type.parse().unwrap_or_default(),
            price_per_word: row.price_per_word,
            is_auto_included: false,
        }
    }
}

/// Trim size of the printed book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookSize {
    #[serde(rename = "A5")]
    A5,
    #[serde(rename = "A4")]
    A4,
    #[serde(rename = "5x8")]
    FiveByEight,
    #[serde(rename = "6x9")]
    SixByNine,
}

/// Interior paper stock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaperColor {
    White,
    Cream,
}

/// Cover lamination finish
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lamination {
    Matte,
    Gloss,
}

/// Which add-on charging semantics a store applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PricingMode {
    /// Only explicitly selected add-ons are charged
    #[default]
    #[serde(rename = "selected")]
    Selected,
    /// Cover and formatting charges are also derived from the configuration flags
    #[serde(rename = "scenario")]
    ScenarioAware,
}

impl FromStr for PricingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "selected" => Ok(PricingMode::Selected),
            "scenario" | "scenario_aware" => Ok(PricingMode::ScenarioAware),
            other => Err(format!("unknown pricing mode '{}'", other)),
        }
    }
}

impl fmt::Display for PricingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PricingMode::Selected => write!(f, "selected"),
            PricingMode::ScenarioAware => write!(f, "scenario"),
        }
    }
}

/// Fallback fees used for scenario-inferred charges
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioFees {
    pub cover: Decimal,
    pub formatting: Decimal,
}

impl Default for ScenarioFees {
    fn default() -> Self {
        Self {
            cover: DEFAULT_COVER_FEE,
            formatting: DEFAULT_FORMATTING_FEE,
        }
    }
}
