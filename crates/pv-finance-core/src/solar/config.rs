use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::SolarFinanceError;
use crate::solar::plant::{check_fraction, check_unit_price};
use crate::solar::regime::PROJECT_LIFE_YEARS;
use crate::types::{Money, Rate};
use crate::SolarFinanceResult;

const HOURS_PER_YEAR: u32 = 8760;

/// Tariff and financing assumptions shared by every plant in one evaluation.
///
/// Missing fields fall back to [`Default`], so a JSON document only needs
/// the assumptions it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TariffFinancingConfig {
    /// Full-load-equivalent hours per year
    pub utilization_hours: u32,
    /// Blended retail tariff for self-consumed energy (currency/kWh, VAT inclusive)
    pub retail_tariff: Money,
    /// Share of generation consumed on site
    pub self_use_fraction: Rate,
    /// Share of billed revenue actually collected from the host
    pub collection_rate: Rate,
    /// Debt / total investment
    pub debt_ratio: Rate,
    /// Annual loan interest rate
    pub loan_rate: Rate,
    /// Annuity loan term in years
    pub loan_term_years: u32,
    /// Year-1 operating cost per installed watt, escalated annually
    pub opex_per_watt: Money,
    /// Share of total investment whose embedded VAT is creditable
    pub vat_credit_basis: Rate,
    /// Project IRR the pricing ceiling is solved against
    pub target_project_irr: Rate,
}

impl Default for TariffFinancingConfig {
    fn default() -> Self {
        TariffFinancingConfig {
            utilization_hours: 1100,
            retail_tariff: dec!(0.55),
            self_use_fraction: dec!(0.70),
            collection_rate: dec!(0.98),
            debt_ratio: dec!(0.70),
            loan_rate: dec!(0.032),
            loan_term_years: 10,
            opex_per_watt: dec!(0.05),
            vat_credit_basis: Decimal::ONE,
            target_project_irr: dec!(0.065),
        }
    }
}

impl TariffFinancingConfig {
    /// Reject out-of-range assumptions. Nothing is clamped.
    pub fn validate(&self) -> SolarFinanceResult<()> {
        if self.utilization_hours == 0 || self.utilization_hours > HOURS_PER_YEAR {
            return Err(SolarFinanceError::invalid(
                "utilization_hours",
                format!("Utilization hours must be between 1 and {HOURS_PER_YEAR}"),
            ));
        }
        check_unit_price("retail_tariff", self.retail_tariff)?;
        check_fraction("self_use_fraction", self.self_use_fraction)?;
        check_fraction("collection_rate", self.collection_rate)?;
        check_fraction("debt_ratio", self.debt_ratio)?;
        check_fraction("loan_rate", self.loan_rate)?;
        check_fraction("vat_credit_basis", self.vat_credit_basis)?;

        if self.loan_term_years < 1 || self.loan_term_years > PROJECT_LIFE_YEARS {
            return Err(SolarFinanceError::invalid(
                "loan_term_years",
                format!(
                    "Loan term must be between 1 and {PROJECT_LIFE_YEARS} years, got {}",
                    self.loan_term_years
                ),
            ));
        }
        check_unit_price("opex_per_watt", self.opex_per_watt)?;
        if self.target_project_irr < Decimal::ZERO {
            return Err(SolarFinanceError::invalid(
                "target_project_irr",
                "Target project IRR cannot be negative",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        TariffFinancingConfig::default().validate().unwrap();
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let cfg: TariffFinancingConfig =
            serde_json::from_str(r#"{"debt_ratio": "0.5", "loan_term_years": 8}"#).unwrap();
        assert_eq!(cfg.debt_ratio, dec!(0.5));
        assert_eq!(cfg.loan_term_years, 8);
        assert_eq!(cfg.utilization_hours, 1100);
        assert_eq!(cfg.retail_tariff, dec!(0.55));
    }

    #[test]
    fn test_loan_term_out_of_range() {
        let cfg = TariffFinancingConfig {
            loan_term_years: 26,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = TariffFinancingConfig {
            loan_term_years: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_fraction_out_of_range() {
        let cfg = TariffFinancingConfig {
            self_use_fraction: dec!(1.2),
            ..Default::default()
        };
        let err = cfg.validate().unwrap_err();
        match err {
            SolarFinanceError::InvalidConfiguration { field, .. } => {
                assert_eq!(field, "self_use_fraction");
            }
            other => panic!("Expected InvalidConfiguration, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_collection_rate_is_allowed() {
        let cfg = TariffFinancingConfig {
            collection_rate: Decimal::ZERO,
            ..Default::default()
        };
        cfg.validate().unwrap();
    }

    #[test]
    fn test_zero_utilization_rejected() {
        let cfg = TariffFinancingConfig {
            utilization_hours: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = TariffFinancingConfig {
            utilization_hours: 8761,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_tariff_above_ceiling_rejected() {
        let cfg = TariffFinancingConfig {
            retail_tariff: dec!(5000),
            ..Default::default()
        };
        match cfg.validate().unwrap_err() {
            SolarFinanceError::InvalidConfiguration { field, .. } => {
                assert_eq!(field, "retail_tariff");
            }
            other => panic!("Expected InvalidConfiguration, got {other:?}"),
        }
    }
}
