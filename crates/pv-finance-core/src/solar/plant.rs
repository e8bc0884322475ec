use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::SolarFinanceError;
use crate::solar::regime::{MAX_CAPACITY_KW, MAX_UNIT_PRICE, PROJECT_LIFE_YEARS, WATTS_PER_KW};
use crate::types::{Money, Rate};
use crate::SolarFinanceResult;

// ---------------------------------------------------------------------------
// Degradation
// ---------------------------------------------------------------------------

/// Module output degradation: a one-off first-year step-down followed by a
/// straight-line annual decline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegradationProfile {
    /// Output lost in year 1 (decimal, e.g. 0.01 = 1%)
    pub first_year: Rate,
    /// Additional output lost each subsequent year
    pub annual_linear: Rate,
}

impl DegradationProfile {
    /// Fraction of nameplate output delivered in `year` (1-based).
    ///
    /// Year 1 applies only the first-year loss; later years subtract
    /// `(year - 1) × annual_linear` on top of it.
    pub fn factor(&self, year: u32) -> Decimal {
        let elapsed = Decimal::from(year.saturating_sub(1));
        Decimal::ONE - self.first_year - elapsed * self.annual_linear
    }

    pub fn validate(&self) -> SolarFinanceResult<()> {
        check_fraction("degradation.first_year", self.first_year)?;
        check_fraction("degradation.annual_linear", self.annual_linear)?;

        let final_factor = self.factor(PROJECT_LIFE_YEARS);
        if final_factor < Decimal::ZERO {
            return Err(SolarFinanceError::invalid(
                "degradation",
                format!(
                    "Profile implies negative output by year {PROJECT_LIFE_YEARS} \
                     (factor {final_factor})"
                ),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Module technology presets
// ---------------------------------------------------------------------------

/// Module technologies offered by the scheme designer, with their warranted
/// degradation and usable power density.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleTechnology {
    /// N-type TOPCon
    Topcon,
    /// Back-contact (BC)
    BackContact,
}

impl ModuleTechnology {
    pub fn degradation(&self) -> DegradationProfile {
        match self {
            ModuleTechnology::Topcon => DegradationProfile {
                first_year: dec!(0.01),
                annual_linear: dec!(0.004),
            },
            ModuleTechnology::BackContact => DegradationProfile {
                first_year: dec!(0.01),
                annual_linear: dec!(0.0035),
            },
        }
    }

    /// Installed DC watts per square metre of usable roof.
    pub fn power_density_w_per_m2(&self) -> Decimal {
        match self {
            ModuleTechnology::Topcon => dec!(225),
            ModuleTechnology::BackContact => dec!(240),
        }
    }

    /// Installed capacity (kW) that fits on `area_m2` of confirmed roof area.
    pub fn capacity_kw_for_area(&self, area_m2: Decimal) -> SolarFinanceResult<Decimal> {
        if area_m2 < Decimal::ZERO {
            return Err(SolarFinanceError::invalid(
                "area_m2",
                "Roof area cannot be negative",
            ));
        }
        area_m2
            .checked_mul(self.power_density_w_per_m2())
            .map(|watts| watts / WATTS_PER_KW)
            .ok_or_else(|| SolarFinanceError::invalid("area_m2", "Roof area is out of range"))
    }
}

impl fmt::Display for ModuleTechnology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleTechnology::Topcon => write!(f, "TOPCon"),
            ModuleTechnology::BackContact => write!(f, "BC"),
        }
    }
}

impl FromStr for ModuleTechnology {
    type Err = SolarFinanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "topcon" => Ok(ModuleTechnology::Topcon),
            "bc" | "back-contact" | "back_contact" => Ok(ModuleTechnology::BackContact),
            other => Err(SolarFinanceError::invalid(
                "technology",
                format!("Unknown module technology '{other}' (expected topcon or back-contact)"),
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Plant economics
// ---------------------------------------------------------------------------

/// Static economics of one candidate plant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlantEconomics {
    /// Installed DC capacity in kW
    pub capacity_kw: Decimal,
    /// Blended all-in system cost per watt, VAT inclusive
    pub system_cost_per_watt: Money,
    /// Inverter unit cost per watt, charged again at the replacement year
    pub inverter_unit_cost_per_watt: Money,
    /// Output degradation profile
    pub degradation: DegradationProfile,
}

impl PlantEconomics {
    /// Plant using the degradation profile of a preset technology.
    pub fn with_technology(
        capacity_kw: Decimal,
        system_cost_per_watt: Money,
        inverter_unit_cost_per_watt: Money,
        technology: ModuleTechnology,
    ) -> Self {
        PlantEconomics {
            capacity_kw,
            system_cost_per_watt,
            inverter_unit_cost_per_watt,
            degradation: technology.degradation(),
        }
    }

    /// Capacity expressed in watts.
    pub fn capacity_watts(&self) -> Decimal {
        self.capacity_kw * WATTS_PER_KW
    }

    /// Gross (VAT inclusive) capital cost.
    pub fn total_investment(&self) -> Money {
        self.capacity_watts() * self.system_cost_per_watt
    }

    pub fn validate(&self) -> SolarFinanceResult<()> {
        if self.capacity_kw <= Decimal::ZERO || self.capacity_kw > MAX_CAPACITY_KW {
            return Err(SolarFinanceError::invalid(
                "capacity_kw",
                format!("Installed capacity must be positive and at most {MAX_CAPACITY_KW} kW"),
            ));
        }
        check_unit_price("system_cost_per_watt", self.system_cost_per_watt)?;
        check_unit_price("inverter_unit_cost_per_watt", self.inverter_unit_cost_per_watt)?;
        self.degradation.validate()
    }
}

/// Reject negative prices and prices above [`MAX_UNIT_PRICE`].
pub(crate) fn check_unit_price(field: &str, value: Money) -> SolarFinanceResult<()> {
    if value < Decimal::ZERO || value > MAX_UNIT_PRICE {
        return Err(SolarFinanceError::invalid(
            field,
            format!("Must be between 0 and {MAX_UNIT_PRICE}, got {value}"),
        ));
    }
    Ok(())
}

/// Reject values outside [0, 1].
pub(crate) fn check_fraction(field: &str, value: Decimal) -> SolarFinanceResult<()> {
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(SolarFinanceError::invalid(
            field,
            format!("Must be between 0 and 1, got {value}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topcon_plant() -> PlantEconomics {
        PlantEconomics::with_technology(
            dec!(1000),
            dec!(2.50),
            dec!(0.12),
            ModuleTechnology::Topcon,
        )
    }

    #[test]
    fn test_first_year_factor() {
        let profile = ModuleTechnology::Topcon.degradation();
        assert_eq!(profile.factor(1), dec!(0.99));
    }

    #[test]
    fn test_linear_decline_after_first_year() {
        let profile = ModuleTechnology::Topcon.degradation();
        // 1 - 0.01 - 24 * 0.004
        assert_eq!(profile.factor(25), dec!(0.894));
        assert_eq!(profile.factor(2), dec!(0.986));
    }

    #[test]
    fn test_factor_non_increasing() {
        let profile = ModuleTechnology::BackContact.degradation();
        for year in 2..=PROJECT_LIFE_YEARS {
            assert!(profile.factor(year) <= profile.factor(year - 1));
        }
    }

    #[test]
    fn test_profile_going_negative_rejected() {
        let profile = DegradationProfile {
            first_year: dec!(0.05),
            annual_linear: dec!(0.05),
        };
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_capacity_from_roof_area() {
        let cap = ModuleTechnology::Topcon
            .capacity_kw_for_area(dec!(4000))
            .unwrap();
        assert_eq!(cap, dec!(900));
        let cap_bc = ModuleTechnology::BackContact
            .capacity_kw_for_area(dec!(4000))
            .unwrap();
        assert_eq!(cap_bc, dec!(960));
    }

    #[test]
    fn test_technology_from_str() {
        assert_eq!(
            "TOPCon".parse::<ModuleTechnology>().unwrap(),
            ModuleTechnology::Topcon
        );
        assert_eq!(
            "back-contact".parse::<ModuleTechnology>().unwrap(),
            ModuleTechnology::BackContact
        );
        assert!("perc".parse::<ModuleTechnology>().is_err());
    }

    #[test]
    fn test_total_investment() {
        assert_eq!(topcon_plant().total_investment(), dec!(2_500_000));
    }

    #[test]
    fn test_validation_zero_capacity() {
        let mut plant = topcon_plant();
        plant.capacity_kw = Decimal::ZERO;
        let err = plant.validate().unwrap_err();
        match err {
            SolarFinanceError::InvalidConfiguration { field, .. } => {
                assert_eq!(field, "capacity_kw");
            }
            other => panic!("Expected InvalidConfiguration, got {other:?}"),
        }
    }

    #[test]
    fn test_validation_capacity_above_ceiling() {
        let mut plant = topcon_plant();
        plant.capacity_kw = dec!(100_000_000_000_000_000_000_000);
        match plant.validate().unwrap_err() {
            SolarFinanceError::InvalidConfiguration { field, .. } => {
                assert_eq!(field, "capacity_kw");
            }
            other => panic!("Expected InvalidConfiguration, got {other:?}"),
        }

        plant.capacity_kw = MAX_CAPACITY_KW;
        plant.validate().unwrap();
    }

    #[test]
    fn test_validation_system_cost_above_ceiling() {
        let mut plant = topcon_plant();
        plant.system_cost_per_watt = dec!(1000.01);
        match plant.validate().unwrap_err() {
            SolarFinanceError::InvalidConfiguration { field, .. } => {
                assert_eq!(field, "system_cost_per_watt");
            }
            other => panic!("Expected InvalidConfiguration, got {other:?}"),
        }
    }

    #[test]
    fn test_huge_roof_area_rejected() {
        let area = Decimal::MAX / dec!(10);
        assert!(ModuleTechnology::Topcon.capacity_kw_for_area(area).is_err());
    }

    #[test]
    fn test_validation_negative_inverter_cost() {
        let mut plant = topcon_plant();
        plant.inverter_unit_cost_per_watt = dec!(-0.01);
        assert!(plant.validate().is_err());
    }
}
