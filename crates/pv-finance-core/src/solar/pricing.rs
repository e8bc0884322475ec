use std::time::Instant;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::SolarFinanceError;
use crate::solar::config::TariffFinancingConfig;
use crate::solar::metrics::{evaluate_plant, PlantEvaluationInput};
use crate::solar::plant::{check_unit_price, PlantEconomics};
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::SolarFinanceResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Inputs for the reverse pricing calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingCeilingInput {
    /// Current blended system cost per watt
    pub system_cost_per_watt: Money,
    /// Project IRR achieved at the current cost
    pub project_irr: Rate,
    /// Project IRR the offer must still deliver
    pub target_project_irr: Rate,
    /// Development fee per watt included in the system cost
    pub development_fee_per_watt: Money,
}

/// Highest sustainable prices under the linear IRR-to-cost approximation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingCeiling {
    /// Maximum blended system cost per watt
    pub ceiling_cost: Money,
    /// ceiling_cost - current system cost
    pub ceiling_headroom: Money,
    /// Maximum development fee per watt with all other components fixed
    pub max_soft_cost: Money,
    /// max_soft_cost - current development fee
    pub soft_cost_headroom: Money,
}

/// Plant evaluation followed by the ceiling at the configured target IRR.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingAppraisalInput {
    pub plant: PlantEconomics,
    #[serde(default)]
    pub config: TariffFinancingConfig,
    /// Development fee per watt included in the plant's system cost
    pub development_fee_per_watt: Money,
}

/// Evaluated IRR alongside the ceiling derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingAppraisal {
    pub project_irr: Rate,
    pub target_project_irr: Rate,
    pub system_cost_per_watt: Money,
    #[serde(flatten)]
    pub ceiling: PricingCeiling,
}

// ---------------------------------------------------------------------------
// Core computation
// ---------------------------------------------------------------------------

/// Scale the system cost by `project_irr / target_project_irr`.
///
/// This is a first-order approximation: IRR is treated as linear in cost
/// around the current operating point. The simulator is not re-run at the
/// ceiling price.
pub fn pricing_ceiling(input: &PricingCeilingInput) -> SolarFinanceResult<PricingCeiling> {
    if input.target_project_irr <= Decimal::ZERO {
        return Err(SolarFinanceError::DegenerateTargetIrr {
            target: input.target_project_irr,
        });
    }
    check_unit_price("system_cost_per_watt", input.system_cost_per_watt)?;
    if input.development_fee_per_watt < Decimal::ZERO
        || input.development_fee_per_watt > input.system_cost_per_watt
    {
        return Err(SolarFinanceError::invalid(
            "development_fee_per_watt",
            "Development fee must be between zero and the system cost",
        ));
    }

    let out_of_range = || {
        SolarFinanceError::invalid(
            "project_irr",
            "Ceiling cost is out of range for the given IRR and target",
        )
    };
    let ceiling_cost = input
        .system_cost_per_watt
        .checked_mul(input.project_irr)
        .and_then(|scaled| scaled.checked_div(input.target_project_irr))
        .ok_or_else(out_of_range)?;
    let fixed_components = input.system_cost_per_watt - input.development_fee_per_watt;
    let max_soft_cost = ceiling_cost
        .checked_sub(fixed_components)
        .ok_or_else(out_of_range)?;

    Ok(PricingCeiling {
        ceiling_cost,
        ceiling_headroom: ceiling_cost
            .checked_sub(input.system_cost_per_watt)
            .ok_or_else(out_of_range)?,
        max_soft_cost,
        soft_cost_headroom: max_soft_cost
            .checked_sub(input.development_fee_per_watt)
            .ok_or_else(out_of_range)?,
    })
}

/// Evaluate a plant, then solve its pricing ceiling against
/// `config.target_project_irr`.
pub fn appraise_pricing_ceiling(
    input: &PricingAppraisalInput,
) -> SolarFinanceResult<ComputationOutput<PricingAppraisal>> {
    let start = Instant::now();

    let target = input.config.target_project_irr;
    if target <= Decimal::ZERO {
        return Err(SolarFinanceError::DegenerateTargetIrr { target });
    }

    let evaluation = evaluate_plant(&PlantEvaluationInput {
        plant: input.plant.clone(),
        config: input.config.clone(),
    })?;
    let project_irr = evaluation.result.project_irr;
    let mut warnings: Vec<String> = Vec::new();

    let ceiling = pricing_ceiling(&PricingCeilingInput {
        system_cost_per_watt: input.plant.system_cost_per_watt,
        project_irr,
        target_project_irr: target,
        development_fee_per_watt: input.development_fee_per_watt,
    })?;

    if ceiling.max_soft_cost < Decimal::ZERO {
        warnings.push(format!(
            "Target IRR of {target} is unreachable even with zero development fee"
        ));
    }

    let output = PricingAppraisal {
        project_irr,
        target_project_irr: target,
        system_cost_per_watt: input.plant.system_cost_per_watt,
        ceiling,
    };

    // Evaluation warnings were already logged by `evaluate_plant`
    let elapsed = start.elapsed().as_micros() as u64;
    let mut appraisal = with_metadata(
        "Pricing Ceiling (linear IRR scaling)",
        &serde_json::json!({
            "system_cost_per_watt": input.plant.system_cost_per_watt.to_string(),
            "development_fee_per_watt": input.development_fee_per_watt.to_string(),
            "target_project_irr": target.to_string(),
            "approximation": "ceiling = cost × project_irr / target_irr",
        }),
        warnings,
        elapsed,
        output,
    );
    let mut all_warnings = evaluation.warnings;
    all_warnings.append(&mut appraisal.warnings);
    appraisal.warnings = all_warnings;
    Ok(appraisal)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solar::plant::ModuleTechnology;
    use rust_decimal_macros::dec;

    fn scenario_c() -> PricingCeilingInput {
        PricingCeilingInput {
            system_cost_per_watt: dec!(4.00),
            project_irr: dec!(0.080),
            target_project_irr: dec!(0.065),
            development_fee_per_watt: dec!(0.10),
        }
    }

    #[test]
    fn test_scenario_c_ceiling() {
        let ceiling = pricing_ceiling(&scenario_c()).unwrap();
        assert_eq!(ceiling.ceiling_cost, dec!(4.00) * dec!(0.080) / dec!(0.065));
        assert!((ceiling.ceiling_cost - dec!(4.923)).abs() < dec!(0.001));
    }

    #[test]
    fn test_soft_cost_is_ceiling_minus_fixed_components() {
        let ceiling = pricing_ceiling(&scenario_c()).unwrap();
        // Fixed components are 4.00 - 0.10 = 3.90
        assert_eq!(ceiling.max_soft_cost, ceiling.ceiling_cost - dec!(3.90));
        assert_eq!(
            ceiling.soft_cost_headroom,
            ceiling.max_soft_cost - dec!(0.10)
        );
        // Both headrooms equal the same absolute uplift
        assert_eq!(ceiling.soft_cost_headroom, ceiling.ceiling_headroom);
    }

    #[test]
    fn test_irr_at_target_leaves_no_headroom() {
        let input = PricingCeilingInput {
            project_irr: dec!(0.065),
            ..scenario_c()
        };
        let ceiling = pricing_ceiling(&input).unwrap();
        assert_eq!(ceiling.ceiling_cost, dec!(4.00));
        assert_eq!(ceiling.ceiling_headroom, Decimal::ZERO);
    }

    #[test]
    fn test_zero_target_is_degenerate() {
        let input = PricingCeilingInput {
            target_project_irr: Decimal::ZERO,
            ..scenario_c()
        };
        let err = pricing_ceiling(&input).unwrap_err();
        assert!(matches!(err, SolarFinanceError::DegenerateTargetIrr { .. }));
    }

    #[test]
    fn test_negative_target_is_degenerate() {
        let input = PricingCeilingInput {
            target_project_irr: dec!(-0.02),
            ..scenario_c()
        };
        assert!(matches!(
            pricing_ceiling(&input),
            Err(SolarFinanceError::DegenerateTargetIrr { .. })
        ));
    }

    #[test]
    fn test_development_fee_above_cost_rejected() {
        let input = PricingCeilingInput {
            development_fee_per_watt: dec!(4.50),
            ..scenario_c()
        };
        assert!(matches!(
            pricing_ceiling(&input),
            Err(SolarFinanceError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_extreme_irr_ratio_is_an_error() {
        let input = PricingCeilingInput {
            project_irr: Decimal::MAX,
            target_project_irr: dec!(0.0000000001),
            ..scenario_c()
        };
        match pricing_ceiling(&input) {
            Err(SolarFinanceError::InvalidConfiguration { field, .. }) => {
                assert_eq!(field, "project_irr");
            }
            other => panic!("Expected InvalidConfiguration, got {other:?}"),
        }
    }

    #[test]
    fn test_appraisal_uses_evaluated_irr() {
        let input = PricingAppraisalInput {
            plant: PlantEconomics::with_technology(
                dec!(1000),
                dec!(2.50),
                dec!(0.12),
                ModuleTechnology::Topcon,
            ),
            config: TariffFinancingConfig::default(),
            development_fee_per_watt: dec!(0.10),
        };
        let result = appraise_pricing_ceiling(&input).unwrap();
        let out = &result.result;
        assert_eq!(out.target_project_irr, dec!(0.065));
        assert_eq!(
            out.ceiling.ceiling_cost,
            dec!(2.50) * out.project_irr / dec!(0.065)
        );
        // A project clearing its target can afford a higher price
        assert!(out.ceiling.ceiling_cost > dec!(2.50));
    }

    #[test]
    fn test_appraisal_flags_unreachable_target() {
        let mut config = TariffFinancingConfig::default();
        config.target_project_irr = dec!(0.40);
        let input = PricingAppraisalInput {
            plant: PlantEconomics::with_technology(
                dec!(1000),
                dec!(2.50),
                dec!(0.12),
                ModuleTechnology::Topcon,
            ),
            config,
            development_fee_per_watt: dec!(0.10),
        };
        let result = appraise_pricing_ceiling(&input).unwrap();
        assert!(result.result.ceiling.max_soft_cost < Decimal::ZERO);

        // Evaluation warnings come first, each exactly once
        let below = result
            .warnings
            .iter()
            .filter(|w| w.contains("below the 0.40 target"))
            .count();
        assert_eq!(below, 1, "got {:?}", result.warnings);
        assert!(
            result
                .warnings
                .last()
                .is_some_and(|w| w.contains("unreachable even with zero development fee")),
            "got {:?}",
            result.warnings
        );
    }

    #[test]
    fn test_appraisal_zero_target_is_degenerate() {
        let mut config = TariffFinancingConfig::default();
        config.target_project_irr = Decimal::ZERO;
        let input = PricingAppraisalInput {
            plant: PlantEconomics::with_technology(
                dec!(500),
                dec!(3.00),
                dec!(0.12),
                ModuleTechnology::BackContact,
            ),
            config,
            development_fee_per_watt: dec!(0.10),
        };
        assert!(matches!(
            appraise_pricing_ceiling(&input),
            Err(SolarFinanceError::DegenerateTargetIrr { .. })
        ));
    }
}
