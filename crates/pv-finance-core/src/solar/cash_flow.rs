use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use serde::{Deserialize, Serialize};

use crate::solar::config::TariffFinancingConfig;
use crate::solar::plant::PlantEconomics;
use crate::solar::regime::{
    embedded_vat, BENCHMARK_FEED_IN_TARIFF, DEPRECIATION_RATE, DSCR_SENTINEL, INCOME_TAX_RATE,
    INVERTER_REPLACEMENT_YEAR, OPEX_ESCALATION, PROJECT_LIFE_YEARS, SURCHARGE_RATE,
};
use crate::time_value;
use crate::types::Money;
use crate::SolarFinanceResult;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// One operating year of the pro-forma.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnualCashFlowRow {
    /// Operating year (1-based)
    pub year: u32,
    /// Fraction of nameplate output delivered this year
    pub degradation_factor: Decimal,
    /// Energy generated (kWh)
    pub generation_kwh: Decimal,
    /// Revenue actually collected, VAT inclusive
    pub revenue: Money,
    /// VAT embedded in collected revenue
    pub output_vat: Money,
    /// VAT paid in cash after the input credit is applied
    pub vat_payable: Money,
    /// Unused input VAT credit carried into next year
    pub vat_credit_remaining: Money,
    /// Surcharges on VAT payable
    pub surcharge: Money,
    /// Escalated operating cost
    pub opex: Money,
    /// Inverter replacement capex (replacement year only)
    pub inverter_replacement: Money,
    /// Interest on the opening loan balance
    pub interest: Money,
    /// Income tax, floored at zero
    pub income_tax: Money,
    /// Cash flow available for debt service
    pub cfads: Money,
    /// Scheduled annuity payment (zero outside the loan term)
    pub debt_service: Money,
    /// Debt service coverage ratio, or the sentinel when nothing is due
    pub dscr: Decimal,
    /// Cash flow to equity after debt service
    pub equity_cash_flow: Money,
    /// Loan principal outstanding at year end
    pub outstanding_principal: Money,
}

/// Full 25-year pro-forma plus the capital structure it was built on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowSchedule {
    pub rows: Vec<AnnualCashFlowRow>,
    pub total_investment: Money,
    pub equity_investment: Money,
    pub loan_amount: Money,
    pub input_vat_credit: Money,
    pub annual_debt_service: Money,
}

// ---------------------------------------------------------------------------
// Core computation
// ---------------------------------------------------------------------------

/// Build the annual pro-forma for one plant.
///
/// Carries two running balances through the horizon: the loan principal,
/// amortized by a level annuity over the loan term, and the input VAT credit,
/// which offsets output VAT until exhausted and is never replenished.
pub fn simulate(
    plant: &PlantEconomics,
    config: &TariffFinancingConfig,
) -> SolarFinanceResult<CashFlowSchedule> {
    plant.validate()?;
    config.validate()?;

    let capacity_watts = plant.capacity_watts();
    let total_investment = plant.total_investment();
    let input_vat_credit = embedded_vat(total_investment * config.vat_credit_basis);
    let equity_investment = total_investment * (Decimal::ONE - config.debt_ratio);
    let loan_amount = total_investment * config.debt_ratio;
    let loan_term = config.loan_term_years;

    let annual_debt_service = if loan_amount > Decimal::ZERO {
        time_value::pmt(config.loan_rate, loan_term, -loan_amount, Decimal::ZERO)?
    } else {
        Decimal::ZERO
    };

    let blended_tariff = config.retail_tariff * config.self_use_fraction
        + BENCHMARK_FEED_IN_TARIFF * (Decimal::ONE - config.self_use_fraction);
    let base_opex = capacity_watts * config.opex_per_watt;
    let depreciation = total_investment * DEPRECIATION_RATE;
    let escalation = Decimal::ONE + OPEX_ESCALATION;

    log::debug!(
        "simulate: investment {total_investment}, loan {loan_amount}, \
         annuity {annual_debt_service}, input VAT credit {input_vat_credit}"
    );

    let mut rows: Vec<AnnualCashFlowRow> = Vec::with_capacity(PROJECT_LIFE_YEARS as usize);
    let mut outstanding = loan_amount;
    let mut vat_credit = input_vat_credit;

    for year in 1..=PROJECT_LIFE_YEARS {
        let in_loan_term = year <= loan_term;

        // Generation and revenue
        let degradation_factor = plant.degradation.factor(year);
        let generation_kwh =
            plant.capacity_kw * Decimal::from(config.utilization_hours) * degradation_factor;
        let gross_revenue = generation_kwh * blended_tariff;
        let revenue = gross_revenue * config.collection_rate;

        // VAT: output VAT is netted against the remaining input credit
        let output_vat = embedded_vat(revenue);
        let vat_payable = (output_vat - vat_credit).max(Decimal::ZERO);
        vat_credit -= vat_credit.min(output_vat);
        let surcharge = vat_payable * SURCHARGE_RATE;

        // Costs
        let opex = base_opex * escalation.powu(u64::from(year - 1));
        let inverter_replacement = if year == INVERTER_REPLACEMENT_YEAR {
            capacity_watts * plant.inverter_unit_cost_per_watt
        } else {
            Decimal::ZERO
        };
        let interest = if in_loan_term {
            outstanding * config.loan_rate
        } else {
            Decimal::ZERO
        };

        // Income tax, no loss carry-forward
        let taxable_income = (revenue - output_vat)
            - opex
            - inverter_replacement
            - interest
            - depreciation
            - surcharge;
        let income_tax = (taxable_income * INCOME_TAX_RATE).max(Decimal::ZERO);

        let cfads =
            revenue - opex - inverter_replacement - vat_payable - surcharge - income_tax;

        let debt_service = if in_loan_term {
            annual_debt_service
        } else {
            Decimal::ZERO
        };
        let dscr = if in_loan_term && annual_debt_service > Decimal::ZERO {
            cfads / annual_debt_service
        } else {
            DSCR_SENTINEL
        };
        let equity_cash_flow = cfads - debt_service;

        if in_loan_term {
            outstanding -= annual_debt_service - interest;
        }

        rows.push(AnnualCashFlowRow {
            year,
            degradation_factor,
            generation_kwh,
            revenue,
            output_vat,
            vat_payable,
            vat_credit_remaining: vat_credit,
            surcharge,
            opex,
            inverter_replacement,
            interest,
            income_tax,
            cfads,
            debt_service,
            dscr,
            equity_cash_flow,
            outstanding_principal: outstanding,
        });
    }

    Ok(CashFlowSchedule {
        rows,
        total_investment,
        equity_investment,
        loan_amount,
        input_vat_credit,
        annual_debt_service,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
