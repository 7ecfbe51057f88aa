//! Pricing engine module for the publishing checkout.
//!
//! Derives an order's total from the selected package, add-ons, book
//! configuration, manuscript formatting inputs and coupon. The engine itself
//! (`calculators`, `store`, `metadata`) is pure; `services` and `routes` wire
//! it to the catalog database and the HTTP API.

pub mod calculators;
pub mod metadata;
pub mod models;
pub mod queries;
pub mod requests;
pub mod responses;
pub mod routes;
pub mod services;
pub mod store;

// Re-export commonly used items
pub use calculators::{round_money, ChargeLine, LineSource};
pub use metadata::{PaymentMetadata, ProviderMetadata, DEFAULT_METADATA_LIMIT};
pub use models::{Addon, AddonType, Package, PricingMode, PricingType, ScenarioFees};
pub use routes::router;
pub use services::{CheckoutSession, PricingError};
pub use store::{PricingStore, Selection};
