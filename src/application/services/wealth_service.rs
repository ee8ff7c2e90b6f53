//! Wealth Resolver - Starting wealth in lieu of starting equipment
//!
//! Resolution is a pure function of the form snapshot. Formula errors never
//! fail character creation: the source falls back to equipment and a warning
//! is returned for the caller to surface.

use rand::Rng;
use tracing::warn;

use crate::domain::services::roll_wealth;
use crate::domain::value_objects::{Currency, EquipmentSource, FormSubmission, WealthDecision};

#[derive(Debug, Clone, PartialEq)]
pub struct WealthResolution {
    pub decision: WealthDecision,
    pub warning: Option<String>,
}

impl WealthResolution {
    fn equipment(source: EquipmentSource) -> Self {
        Self {
            decision: WealthDecision::equipment(source),
            warning: None,
        }
    }
}

pub struct WealthResolver {
    enabled: bool,
}

impl WealthResolver {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn resolve(&self, form: &FormSubmission, source: EquipmentSource) -> WealthResolution {
        self.resolve_with_rng(form, source, &mut rand::thread_rng())
    }

    pub fn resolve_with_rng<R: Rng>(
        &self,
        form: &FormSubmission,
        source: EquipmentSource,
        rng: &mut R,
    ) -> WealthResolution {
        if !self.enabled || !form.uses_starting_wealth(source) {
            return WealthResolution::equipment(source);
        }

        let Some(formula) = form.wealth_formula(source) else {
            warn!(%source, "Starting wealth requested without a formula");
            return WealthResolution {
                warning: Some(format!("No starting wealth formula for {source}; using equipment instead")),
                ..WealthResolution::equipment(source)
            };
        };

        match roll_wealth(&formula, rng) {
            Ok(currency) => WealthResolution {
                decision: WealthDecision::wealth(source, currency),
                warning: None,
            },
            Err(e) => {
                warn!(%source, formula = %formula, error = %e, "Failed to evaluate wealth formula");
                WealthResolution {
                    warning: Some(format!("Could not roll {source} starting wealth '{formula}': {e}")),
                    ..WealthResolution::equipment(source)
                }
            }
        }
    }
}

/// Total currency granted across wealth decisions. Each rolled amount fits
/// in an `i64`, so two sources never saturate.
pub fn total_wealth<'a>(decisions: impl IntoIterator<Item = &'a WealthDecision>) -> Currency {
    decisions
        .into_iter()
        .filter(|d| d.use_wealth)
        .filter_map(|d| d.currency)
        .fold(Currency::default(), Currency::saturating_add)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn test_toggle_off_defers_to_equipment() {
        let form = FormSubmission::new().with("starting-wealth-formula-class", "5d4*10");
        let resolution = WealthResolver::new(true).resolve_with_rng(&form, EquipmentSource::Class, &mut rng());
        assert!(!resolution.decision.use_wealth);
        assert!(resolution.warning.is_none());
    }

    #[test]
    fn test_toggle_on_rolls_formula() {
        let form = FormSubmission::new()
            .with("use-starting-wealth-background", true)
            .with("starting-wealth-formula-background", "50 gp");
        let resolution =
            WealthResolver::new(true).resolve_with_rng(&form, EquipmentSource::Background, &mut rng());
        assert!(resolution.decision.use_wealth);
        assert_eq!(resolution.decision.currency.map(|c| c.gp), Some(50));
    }

    #[test]
    fn test_bad_formula_is_not_fatal() {
        let form = FormSubmission::new()
            .with("use-starting-wealth-class", "on")
            .with("starting-wealth-formula-class", "5d4 * ?");
        let resolution = WealthResolver::new(true).resolve_with_rng(&form, EquipmentSource::Class, &mut rng());
        assert!(!resolution.decision.use_wealth);
        assert!(resolution.warning.is_some());
    }

    #[test]
    fn test_disabled_setting_ignores_toggle() {
        let form = FormSubmission::new()
            .with("use-starting-wealth-class", true)
            .with("starting-wealth-formula-class", "10");
        let resolution = WealthResolver::new(false).resolve_with_rng(&form, EquipmentSource::Class, &mut rng());
        assert!(!resolution.decision.use_wealth);
    }

    #[test]
    fn test_total_wealth_sums_wealth_sources_only() {
        let decisions = [
            WealthDecision::wealth(EquipmentSource::Background, Currency { gp: 50, ..Default::default() }),
            WealthDecision::equipment(EquipmentSource::Class),
        ];
        assert_eq!(total_wealth(&decisions).gp, 50);
    }
}
