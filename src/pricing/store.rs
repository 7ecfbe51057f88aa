//! Checkout pricing store.
//!
//! `PricingStore` owns one checkout's selection and derives prices from it on
//! demand. Mutators normalize their input and never fail; derivations are pure
//! and recomputed on every call.

use rust_decimal::Decimal;
use serde::Serialize;

use super::calculators::{
    calculate_total, effective_discount, normalize_money, normalize_word_count,
    scenario_charge_lines, selected_charge_lines, sum_lines, ChargeLine, FormattingInputs,
    ScenarioFlags,
};
use super::metadata::{AddonBreakdownLine, PaymentMetadata};
use super::models::{Addon, BookSize, Lamination, Package, PaperColor, PricingMode, ScenarioFees};

/// Mutable selection owned by a checkout
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub selected_package: Option<Package>,
    pub selected_addons: Vec<Addon>,
    pub has_cover_design: Option<bool>,
    pub has_formatting: Option<bool>,
    pub book_size: Option<BookSize>,
    pub paper_color: Option<PaperColor>,
    pub lamination: Option<Lamination>,
    pub formatting_word_count: u64,
    pub formatting_price_per_word: Decimal,
    pub coupon_code: Option<String>,
    pub discount_amount: Decimal,
}

/// Pricing state container for a single checkout
#[derive(Debug, Clone, PartialEq)]
pub struct PricingStore {
    mode: PricingMode,
    fees: ScenarioFees,
    selection: Selection,
}

impl Default for PricingStore {
    fn default() -> Self {
        Self::new(PricingMode::default())
    }
}

impl PricingStore {
    /// Create an empty store using the default scenario fees
    pub fn new(mode: PricingMode) -> Self {
        Self::with_fees(mode, ScenarioFees::default())
    }

    pub fn with_fees(mode: PricingMode, fees: ScenarioFees) -> Self {
        Self {
            mode,
            fees,
            selection: Selection::default(),
        }
    }

    pub fn mode(&self) -> PricingMode {
        self.mode
    }

    pub fn fees(&self) -> ScenarioFees {
        self.fees
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    // ==================== mutators ====================

    /// Replace the package. Addon selection is left untouched.
    pub fn set_selected_package(&mut self, package: Option<Package>) {
        self.selection.selected_package = package;
    }

    pub fn set_has_cover_design(&mut self, value: Option<bool>) {
        self.selection.has_cover_design = value;
    }

    pub fn set_has_formatting(&mut self, value: Option<bool>) {
        self.selection.has_formatting = value;
    }

    pub fn set_book_size(&mut self, value: Option<BookSize>) {
        self.selection.book_size = value;
    }

    pub fn set_paper_color(&mut self, value: Option<PaperColor>) {
        self.selection.paper_color = value;
    }

    pub fn set_lamination(&mut self, value: Option<Lamination>) {
        self.selection.lamination = value;
    }

    /// Replace the whole addon selection, de-duplicated by id.
    ///
    /// A repeated id keeps the position of its first occurrence and the
    /// contents of its last.
    pub fn set_selected_addons(&mut self, addons: Vec<Addon>) {
        let mut deduped: Vec<Addon> = Vec::with_capacity(addons.len());
        for addon in addons {
            match deduped.iter().position(|a| a.id == addon.id) {
                Some(index) => deduped[index] = addon,
                None => deduped.push(addon),
            }
        }
        self.selection.selected_addons = deduped;
    }

    /// Remove the addon if it is selected, append it otherwise.
    pub fn toggle_selected_addon(&mut self, addon: Addon) {
        match self.position_of(&addon.id) {
            Some(index) => {
                self.selection.selected_addons.remove(index);
            }
            None => self.selection.selected_addons.push(addon),
        }
    }

    pub fn remove_selected_addon(&mut self, addon_id: &str) {
        if let Some(index) = self.position_of(addon_id) {
            self.selection.selected_addons.remove(index);
        }
    }

    /// Record the manuscript word count and per-word rate.
    ///
    /// Fractional word counts are truncated; negatives become zero.
    pub fn apply_formatting_cost(&mut self, word_count: Decimal, price_per_word: Decimal) {
        self.selection.formatting_word_count = normalize_word_count(word_count);
        self.selection.formatting_price_per_word = price_per_word.max(Decimal::ZERO);
    }

    /// Record a coupon. Validity is checked upstream; an empty code clears it.
    pub fn apply_coupon(&mut self, code: &str, discount_amount: Decimal) {
        let code = code.trim();
        self.selection.coupon_code = (!code.is_empty()).then(|| code.to_string());
        self.selection.discount_amount = normalize_money(discount_amount);
    }

    pub fn clear_coupon(&mut self) {
        self.selection.coupon_code = None;
        self.selection.discount_amount = Decimal::ZERO;
    }

    /// Restore the initial empty selection. Mode and fees are kept.
    pub fn reset(&mut self) {
        self.selection = Selection::default();
    }

    pub fn reset_configuration(&mut self) {
        self.reset();
    }

    fn position_of(&self, addon_id: &str) -> Option<usize> {
        self.selection
            .selected_addons
            .iter()
            .position(|a| a.id == addon_id)
    }

    // ==================== derivations ====================

    pub fn base_price(&self) -> Decimal {
        self.selection
            .selected_package
            .as_ref()
            .map(|p| normalize_money(p.base_price))
            .unwrap_or(Decimal::ZERO)
    }

    /// Chargeable lines: selected first, then scenario-inferred.
    pub fn charge_lines(&self) -> Vec<ChargeLine> {
        let selection = &self.selection;
        let formatting = FormattingInputs {
            word_count: selection.formatting_word_count,
            price_per_word: selection.formatting_price_per_word,
        };
        let flags = ScenarioFlags {
            has_cover_design: selection.has_cover_design,
            has_formatting: selection.has_formatting,
        };

        match self.mode {
            PricingMode::Selected => selected_charge_lines(
                &selection.selected_addons,
                selection.selected_package.as_ref(),
                formatting,
                None,
            ),
            PricingMode::ScenarioAware => {
                let mut lines = selected_charge_lines(
                    &selection.selected_addons,
                    selection.selected_package.as_ref(),
                    formatting,
                    Some(flags),
                );
                lines.extend(scenario_charge_lines(
                    &selection.selected_addons,
                    flags,
                    formatting,
                    self.fees,
                ));
                lines
            }
        }
    }

    pub fn addon_breakdown(&self) -> Vec<AddonBreakdownLine> {
        self.charge_lines()
            .into_iter()
            .map(|line| AddonBreakdownLine {
                name: line.name,
                price: line.price,
            })
            .collect()
    }

    pub fn addon_total(&self) -> Decimal {
        sum_lines(&self.charge_lines())
    }

    pub fn subtotal(&self) -> Decimal {
        normalize_money(self.base_price().saturating_add(self.addon_total()))
    }

    /// Discount actually deducted, capped at the subtotal
    pub fn effective_discount(&self) -> Decimal {
        effective_discount(self.selection.discount_amount, self.subtotal())
    }

    pub fn total_price(&self) -> Decimal {
        calculate_total(
            self.base_price(),
            self.addon_total(),
            self.selection.discount_amount,
        )
    }

    /// Snapshot of everything the payment initialization endpoint needs
    pub fn to_payment_metadata(&self) -> PaymentMetadata {
        PaymentMetadata::from_store(self)
    }
}
