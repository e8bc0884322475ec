//! Fixed regulatory and modelling constants.
//!
//! The engine models a single tax regime (Guangdong C&I distributed solar).
//! These values are policy assumptions, not caller configuration.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::types::{Money, Rate};

/// Operating years in every pro-forma.
pub const PROJECT_LIFE_YEARS: u32 = 25;

/// Regional coal-benchmark tariff paid for exported energy (currency/kWh).
pub const BENCHMARK_FEED_IN_TARIFF: Money = dec!(0.453);

/// VAT rate embedded in both capital cost and electricity sales.
pub const VAT_RATE: Rate = dec!(0.13);

/// Urban-construction and education surcharges, levied on net VAT payable.
pub const SURCHARGE_RATE: Rate = dec!(0.12);

/// Annual straight-line allowance against total investment.
pub const DEPRECIATION_RATE: Rate = dec!(0.0475);

/// Corporate income tax rate.
pub const INCOME_TAX_RATE: Rate = dec!(0.25);

/// Annual escalation applied to operating cost.
pub const OPEX_ESCALATION: Rate = dec!(0.02);

/// Operating year in which the inverter fleet is replaced.
pub const INVERTER_REPLACEMENT_YEAR: u32 = 10;

/// DSCR reported for years with no scheduled debt service.
pub const DSCR_SENTINEL: Decimal = dec!(3.0);

/// Largest plant the engine accepts (10 GW). Keeps every schedule figure
/// inside `Decimal` range.
pub const MAX_CAPACITY_KW: Decimal = dec!(10_000_000);

/// Largest per-watt cost or per-kWh tariff the engine accepts.
pub const MAX_UNIT_PRICE: Money = dec!(1000);

/// Watts per kilowatt.
pub(crate) const WATTS_PER_KW: Decimal = dec!(1000);

/// VAT contained in a gross (VAT-inclusive) amount.
pub fn embedded_vat(gross: Money) -> Money {
    gross / (Decimal::ONE + VAT_RATE) * VAT_RATE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_vat_back_calculation() {
        // 113 gross carries 13 of VAT
        let vat = embedded_vat(dec!(113));
        assert!((vat - dec!(13)).abs() < dec!(0.0000001), "got {vat}");
    }
}
