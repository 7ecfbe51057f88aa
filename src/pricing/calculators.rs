//! Core pricing calculation functions.
//!
//! Pure functions for pricing math - no database access, no failure modes.
//! Invalid numeric input is normalized (clamped or zeroed) rather than rejected.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::models::{Addon, AddonType, Package, PricingType, ScenarioFees};

/// Decimal places used for every currency amount.
pub const MONEY_PLACES: u32 = 2;

/// Round to specified decimal places, halves away from zero.
///
/// # Examples
/// ```
/// use rust_decimal_macros::dec;
/// use bookpress_checkout::pricing::round_money;
///
/// assert_eq!(round_money(dec!(2.5), 0), dec!(3));
/// assert_eq!(round_money(dec!(1.005), 2), dec!(1.01));
/// assert_eq!(round_money(dec!(1.234), 2), dec!(1.23));
/// ```
pub fn round_money(amount: Decimal, places: u32) -> Decimal {
    amount.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero)
}

/// Round to currency precision and clamp negatives to zero.
pub fn normalize_money(amount: Decimal) -> Decimal {
    round_money(amount, MONEY_PLACES).max(Decimal::ZERO)
}

/// Truncate a word count to a non-negative whole number.
pub fn normalize_word_count(value: Decimal) -> u64 {
    if value <= Decimal::ZERO {
        return 0;
    }
    value.trunc().to_u64().unwrap_or(u64::MAX)
}

/// Heuristic classifier for catalog records without an explicit type tag.
///
/// Matches whole words of the slug and name, so "Author Information Pack" is
/// not a formatting addon. Only consulted when `Addon::addon_type` is absent.
pub fn infer_addon_type(slug: &str, name: &str) -> AddonType {
    if has_word(slug, name, &["isbn"]) {
        AddonType::Isbn
    } else if has_word(slug, name, &["cover"]) {
        AddonType::Cover
    } else if has_word(slug, name, &["format", "formatting"]) {
        AddonType::Formatting
    } else {
        AddonType::Other
    }
}

fn has_word(slug: &str, name: &str, words: &[&str]) -> bool {
    slug.split(|c: char| !c.is_alphanumeric())
        .chain(name.split(|c: char| !c.is_alphanumeric()))
        .any(|token| words.iter().any(|word| token.eq_ignore_ascii_case(word)))
}

/// Effective classification of an addon: explicit tag first, heuristic second.
pub fn addon_kind(addon: &Addon) -> AddonType {
    addon
        .addon_type
        .unwrap_or_else(|| infer_addon_type(&addon.slug, &addon.name))
}

/// ISBN detection: the explicit tag, or an `isbn` word in the slug or name
/// even when the record is tagged otherwise.
pub fn is_isbn_addon(addon: &Addon) -> bool {
    addon_kind(addon) == AddonType::Isbn || has_word(&addon.slug, &addon.name, &["isbn"])
}

/// Per-word inputs known to the store at pricing time
#[derive(Debug, Clone, Copy, Default)]
pub struct FormattingInputs {
    pub word_count: u64,
    pub price_per_word: Decimal,
}

/// Resolve the price of a single addon.
///
/// Per-word addons use `word_count x rate` once both are positive, where the
/// rate supplied with the manuscript wins over the addon's own catalog rate.
/// Everything else falls back to the flat `price`.
pub fn resolve_addon_price(addon: &Addon, formatting: FormattingInputs) -> Decimal {
    if addon.pricing_type == PricingType::PerWord && formatting.word_count > 0 {
        let rate = if formatting.price_per_word > Decimal::ZERO {
            Some(formatting.price_per_word)
        } else {
            addon.price_per_word.filter(|r| *r > Decimal::ZERO)
        };
        if let Some(rate) = rate {
            return normalize_money(Decimal::from(formatting.word_count).saturating_mul(rate));
        }
    }
    normalize_money(addon.price)
}

/// Where a charge line came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineSource {
    Selected,
    Scenario,
}

/// A chargeable addon contribution
#[derive(Debug, Clone, PartialEq)]
pub struct ChargeLine {
    pub addon_id: Option<String>,
    pub slug: String,
    pub name: String,
    pub price: Decimal,
    pub source: LineSource,
}

/// Configuration flags that trigger scenario-inferred charges
#[derive(Debug, Clone, Copy, Default)]
pub struct ScenarioFlags {
    pub has_cover_design: Option<bool>,
    pub has_formatting: Option<bool>,
}

impl ScenarioFlags {
    fn charges_cover(&self) -> bool {
        self.has_cover_design == Some(false)
    }

    fn charges_formatting(&self) -> bool {
        self.has_formatting == Some(false)
    }

    /// Whether a selected addon of this kind is replaced by a scenario line
    fn replaces(&self, kind: AddonType) -> bool {
        match kind {
            AddonType::Cover => self.charges_cover(),
            AddonType::Formatting => self.charges_formatting(),
            _ => false,
        }
    }
}

/// Whether an addon may be charged at all for the given package.
///
/// Auto-included addons are never charged; ISBN addons are suppressed when
/// the package already bundles ISBN registration.
pub fn is_chargeable(addon: &Addon, package: Option<&Package>) -> bool {
    if addon.is_auto_included {
        return false;
    }
    let bundles_isbn = package.map(|p| p.includes_isbn).unwrap_or(false);
    !(bundles_isbn && is_isbn_addon(addon))
}

/// Build charge lines for explicitly selected addons.
///
/// `scenario` is `Some` for the scenario-aware engine, in which case cover and
/// formatting addons replaced by a scenario line are left out.
pub fn selected_charge_lines(
    addons: &[Addon],
    package: Option<&Package>,
    formatting: FormattingInputs,
    scenario: Option<ScenarioFlags>,
) -> Vec<ChargeLine> {
    addons
        .iter()
        .filter(|addon| is_chargeable(addon, package))
        .filter(|addon| {
            scenario
                .map(|flags| !flags.replaces(addon_kind(addon)))
                .unwrap_or(true)
        })
        .filter_map(|addon| {
            let price = resolve_addon_price(addon, formatting);
            (price > Decimal::ZERO).then(|| ChargeLine {
                addon_id: Some(addon.id.clone()),
                slug: addon.slug.clone(),
                name: addon.name.clone(),
                price,
                source: LineSource::Selected,
            })
        })
        .collect()
}

/// Synthesize cover and formatting lines from the configuration flags.
pub fn scenario_charge_lines(
    addons: &[Addon],
    flags: ScenarioFlags,
    formatting: FormattingInputs,
    fees: ScenarioFees,
) -> Vec<ChargeLine> {
    let mut lines = Vec::new();

    if flags.charges_cover() {
        let line = match pick_of_kind(addons, AddonType::Cover, formatting) {
            Some(addon) => scenario_line_from(addon, resolve_addon_price(addon, formatting)),
            None => ChargeLine {
                addon_id: None,
                slug: "cover-design".to_string(),
                name: "Cover Design".to_string(),
                price: normalize_money(fees.cover),
                source: LineSource::Scenario,
            },
        };
        lines.push(line);
    }

    if flags.charges_formatting() {
        let by_words = (formatting.word_count > 0 && formatting.price_per_word > Decimal::ZERO)
            .then(|| {
                normalize_money(
                    Decimal::from(formatting.word_count).saturating_mul(formatting.price_per_word),
                )
            });
        let line = match (pick_of_kind(addons, AddonType::Formatting, formatting), by_words) {
            (Some(addon), Some(price)) => scenario_line_from(addon, price),
            (Some(addon), None) => scenario_line_from(addon, resolve_addon_price(addon, formatting)),
            (None, price) => ChargeLine {
                addon_id: None,
                slug: "book-formatting".to_string(),
                name: "Book Formatting".to_string(),
                price: price.unwrap_or_else(|| normalize_money(fees.formatting)),
                source: LineSource::Scenario,
            },
        };
        lines.push(line);
    }

    lines.retain(|line| line.price > Decimal::ZERO);
    lines
}

/// The addon a scenario line is charged as: highest resolved price, lowest id
/// on ties. Selection order never matters.
fn pick_of_kind(addons: &[Addon], kind: AddonType, formatting: FormattingInputs) -> Option<&Addon> {
    addons
        .iter()
        .filter(|addon| !addon.is_auto_included && addon_kind(addon) == kind)
        .max_by(|a, b| {
            resolve_addon_price(a, formatting)
                .cmp(&resolve_addon_price(b, formatting))
                .then_with(|| b.id.cmp(&a.id))
        })
}

fn scenario_line_from(addon: &Addon, price: Decimal) -> ChargeLine {
    ChargeLine {
        addon_id: Some(addon.id.clone()),
        slug: addon.slug.clone(),
        name: addon.name.clone(),
        price,
        source: LineSource::Scenario,
    }
}

/// Sum line prices at currency precision.
pub fn sum_lines(lines: &[ChargeLine]) -> Decimal {
    let total = lines
        .iter()
        .fold(Decimal::ZERO, |acc, line| acc.saturating_add(line.price));
    round_money(total, MONEY_PLACES)
}

/// Discount actually applied: never more than the subtotal.
pub fn effective_discount(discount: Decimal, subtotal: Decimal) -> Decimal {
    discount.max(Decimal::ZERO).min(subtotal.max(Decimal::ZERO))
}

/// Grand total after discount, never negative.
pub fn calculate_total(base_price: Decimal, addon_total: Decimal, discount: Decimal) -> Decimal {
    let subtotal = base_price.saturating_add(addon_total);
    let total = subtotal.saturating_sub(effective_discount(discount, subtotal));
    normalize_money(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::models::{DEFAULT_COVER_FEE, DEFAULT_FORMATTING_FEE};
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

    fn package(includes_isbn: bool) -> Package {
        Package {
            id: "pkg_1".to_string(),
            name: "Author Starter".to_string(),
            slug: "author-starter".to_string(),
            base_price: dec!(100000),
            includes_isbn,
        }
    }

    // ==================== round_money tests ====================

    #[test]
    fn test_round_money_halves_away_from_zero() {
        assert_eq!(round_money(dec!(2.5), 0), dec!(3));
        assert_eq!(round_money(dec!(3.5), 0), dec!(4));
        assert_eq!(round_money(dec!(2.345), 2), dec!(2.35));
        assert_eq!(round_money(dec!(-2.5), 0), dec!(-3));
    }

    #[test]
    fn test_round_money_normal_rounding() {
        assert_eq!(round_money(dec!(1.234), 2), dec!(1.23));
        assert_eq!(round_money(dec!(1.236), 2), dec!(1.24));
        assert_eq!(round_money(dec!(999999.995), 2), dec!(1000000.00));
    }

    #[test]
    fn test_round_money_avoids_drift_across_lines() {
        let lines: Vec<ChargeLine> = (0..10)
            .map(|i| ChargeLine {
                addon_id: Some(i.to_string()),
                slug: "x".to_string(),
                name: "x".to_string(),
                price: normalize_money(dec!(0.1)),
                source: LineSource::Selected,
            })
            .collect();
        assert_eq!(sum_lines(&lines), dec!(1.00));
    }

    // ==================== normalization tests ====================

    #[test]
    fn test_normalize_money_clamps_negatives() {
        assert_eq!(normalize_money(dec!(-12.5)), Decimal::ZERO);
        assert_eq!(normalize_money(dec!(12.255)), dec!(12.26));
    }

    #[test]
    fn test_normalize_word_count() {
        assert_eq!(normalize_word_count(dec!(1500.9)), 1500);
        assert_eq!(normalize_word_count(dec!(-3)), 0);
        assert_eq!(normalize_word_count(dec!(0)), 0);
    }

    // ==================== classification tests ====================

    #[test]
    fn test_explicit_type_wins_over_heuristic() {
        let mut a = addon("a1", "ISBN Registration", dec!(5000));
        a.addon_type = Some(AddonType::Other);
        assert_eq!(addon_kind(&a), AddonType::Other);
    }

    #[test]
    fn test_heuristic_classification() {
        assert_eq!(infer_addon_type("isbn-registration", "ISBN"), AddonType::Isbn);
        assert_eq!(infer_addon_type("premium-cover", "Premium Cover"), AddonType::Cover);
        assert_eq!(infer_addon_type("typesetting", "Book Formatting"), AddonType::Formatting);
        assert_eq!(infer_addon_type("marketing", "Marketing Kit"), AddonType::Other);
    }

    #[test]
    fn test_heuristic_matches_whole_words_only() {
        assert_eq!(infer_addon_type("author-information-pack", "Author Information Pack"), AddonType::Other);
        assert_eq!(infer_addon_type("discovery-listing", "Discovery Listing"), AddonType::Other);
        assert_eq!(infer_addon_type("format-check", "Format Check"), AddonType::Formatting);
        assert_eq!(infer_addon_type("hard_cover", "Hard Cover"), AddonType::Cover);
    }

    #[test]
    fn test_isbn_word_counts_despite_other_tag() {
        let mut a = addon("a1", "Registration", dec!(7500));
        a.slug = "isbn-registration".to_string();
        a.addon_type = Some(AddonType::Other);
        assert_eq!(addon_kind(&a), AddonType::Other);
        assert!(is_isbn_addon(&a));

        let lines = selected_charge_lines(&[a.clone()], Some(&package(true)), FormattingInputs::default(), None);
        assert!(lines.is_empty());

        let lines = selected_charge_lines(&[a], Some(&package(false)), FormattingInputs::default(), None);
        assert_eq!(lines[0].price, dec!(7500));
    }

    // ==================== price resolution tests ====================

    #[test]
    fn test_resolve_fixed_price() {
        let a = addon("a1", "Marketing Kit", dec!(5000));
        let formatting = FormattingInputs { word_count: 1500, price_per_word: dec!(2) };
        assert_eq!(resolve_addon_price(&a, formatting), dec!(5000));
    }

    #[test]
    fn test_resolve_per_word_prefers_manuscript_rate() {
        let mut a = addon("a1", "Formatting", dec!(7000));
        a.pricing_type = PricingType::PerWord;
        a.price_per_word = Some(dec!(0.5));

        let formatting = FormattingInputs { word_count: 1500, price_per_word: dec!(2) };
        assert_eq!(resolve_addon_price(&a, formatting), dec!(3000));

        let formatting = FormattingInputs { word_count: 1500, price_per_word: Decimal::ZERO };
        assert_eq!(resolve_addon_price(&a, formatting), dec!(750));

        let formatting = FormattingInputs { word_count: 0, price_per_word: dec!(2) };
        assert_eq!(resolve_addon_price(&a, formatting), dec!(7000));
    }

    // ==================== charge line tests ====================

    #[test]
    fn test_auto_included_never_charged() {
        let mut a = addon("a1", "Proof Copy", dec!(3000));
        a.is_auto_included = true;
        let lines = selected_charge_lines(&[a], None, FormattingInputs::default(), None);
        assert!(lines.is_empty());
    }

    #[test]
    fn test_isbn_suppressed_by_package() {
        let isbn = addon("a1", "ISBN Registration", dec!(5000));

        let with = package(true);
        let lines = selected_charge_lines(&[isbn.clone()], Some(&with), FormattingInputs::default(), None);
        assert!(lines.is_empty());

        let without = package(false);
        let lines = selected_charge_lines(&[isbn], Some(&without), FormattingInputs::default(), None);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].price, dec!(5000));
    }

    #[test]
    fn test_zero_priced_lines_dropped() {
        let a = addon("a1", "Free Bookmark", dec!(0));
        let lines = selected_charge_lines(&[a], None, FormattingInputs::default(), None);
        assert!(lines.is_empty());
    }

    #[test]
    fn test_scenario_replaces_selected_cover() {
        let cover = addon("c1", "Premium Cover", dec!(30000));
        let flags = ScenarioFlags { has_cover_design: Some(false), has_formatting: Some(true) };

        let selected = selected_charge_lines(&[cover.clone()], None, FormattingInputs::default(), Some(flags));
        assert!(selected.is_empty());

        let scenario = scenario_charge_lines(&[cover], flags, FormattingInputs::default(), ScenarioFees::default());
        assert_eq!(scenario.len(), 1);
        assert_eq!(scenario[0].price, dec!(30000));
        assert_eq!(scenario[0].addon_id.as_deref(), Some("c1"));
        assert_eq!(scenario[0].source, LineSource::Scenario);
    }

    #[test]
    fn test_scenario_cover_ignores_selection_order() {
        let flags = ScenarioFlags { has_cover_design: Some(false), has_formatting: None };
        let c1 = addon("c1", "Premium Cover", dec!(30000));
        let c2 = addon("c2", "Basic Cover", dec!(10000));

        let forward = scenario_charge_lines(&[c1.clone(), c2.clone()], flags, FormattingInputs::default(), ScenarioFees::default());
        let reverse = scenario_charge_lines(&[c2, c1], flags, FormattingInputs::default(), ScenarioFees::default());
        assert_eq!(forward, reverse);
        assert_eq!(forward[0].addon_id.as_deref(), Some("c1"));
        assert_eq!(forward[0].price, dec!(30000));
    }

    #[test]
    fn test_scenario_unrelated_addon_keeps_default_formatting_fee() {
        let info = addon("a1", "Author Information Pack", dec!(5000));
        let flags = ScenarioFlags { has_cover_design: None, has_formatting: Some(false) };

        let selected = selected_charge_lines(&[info.clone()], None, FormattingInputs::default(), Some(flags));
        let scenario = scenario_charge_lines(&[info], flags, FormattingInputs::default(), ScenarioFees::default());
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].price, dec!(5000));
        assert_eq!(scenario[0].addon_id, None);
        assert_eq!(sum_lines(&selected) + sum_lines(&scenario), dec!(25000));
    }

    #[test]
    fn test_scenario_default_fees() {
        let flags = ScenarioFlags { has_cover_design: Some(false), has_formatting: Some(false) };
        let lines = scenario_charge_lines(&[], flags, FormattingInputs::default(), ScenarioFees::default());

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].price, DEFAULT_COVER_FEE);
        assert_eq!(lines[0].addon_id, None);
        assert_eq!(lines[1].price, DEFAULT_FORMATTING_FEE);
    }

    #[test]
    fn test_scenario_formatting_prefers_word_count() {
        let fmt = addon("f1", "Book Formatting", dec!(9000));
        let flags = ScenarioFlags { has_cover_design: None, has_formatting: Some(false) };
        let formatting = FormattingInputs { word_count: 1000, price_per_word: dec!(3) };

        let lines = scenario_charge_lines(&[fmt.clone()], flags, formatting, ScenarioFees::default());
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].price, dec!(3000));

        let lines = scenario_charge_lines(&[fmt], flags, FormattingInputs::default(), ScenarioFees::default());
        assert_eq!(lines[0].price, dec!(9000));
    }

    #[test]
    fn test_scenario_undecided_flags_charge_nothing() {
        let flags = ScenarioFlags::default();
        let lines = scenario_charge_lines(&[], flags, FormattingInputs::default(), ScenarioFees::default());
        assert!(lines.is_empty());
    }

    // ==================== total tests ====================

    #[test]
    fn test_calculate_total_clamps_discount() {
        assert_eq!(calculate_total(dec!(100000), dec!(5000), dec!(15000)), dec!(90000));
        assert_eq!(calculate_total(dec!(100), dec!(0), dec!(500)), dec!(0));
        assert_eq!(effective_discount(dec!(500), dec!(100)), dec!(100));
        assert_eq!(effective_discount(dec!(-5), dec!(100)), dec!(0));
    }
}
