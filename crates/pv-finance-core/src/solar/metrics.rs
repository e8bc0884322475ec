use std::iter;
use std::time::Instant;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::SolarFinanceError;
use crate::solar::cash_flow::{simulate, AnnualCashFlowRow};
use crate::solar::config::TariffFinancingConfig;
use crate::solar::plant::PlantEconomics;
use crate::time_value;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::SolarFinanceResult;

const IRR_GUESS: Rate = dec!(0.08);
const DSCR_COVENANT: Decimal = dec!(1.2);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Return and coverage metrics extracted from a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    /// Unlevered IRR on total investment vs CFADS
    pub project_irr: Rate,
    /// Levered IRR on equity vs equity cash flow
    pub equity_irr: Rate,
    /// Lowest DSCR across the horizon (sentinel years included)
    pub min_dscr: Decimal,
}

/// Plant and assumptions for one evaluation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlantEvaluationInput {
    pub plant: PlantEconomics,
    #[serde(default)]
    pub config: TariffFinancingConfig,
}

/// Complete evaluation of one plant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub project_irr: Rate,
    pub equity_irr: Rate,
    pub min_dscr: Decimal,
    pub total_investment: Money,
    pub equity_investment: Money,
    pub annual_debt_service: Money,
    pub rows: Vec<AnnualCashFlowRow>,
}

// ---------------------------------------------------------------------------
// Core computation
// ---------------------------------------------------------------------------

/// Project IRR, equity IRR and minimum DSCR for a simulated schedule.
///
/// Both IRRs prefix the annual series with the period-0 outlay. Either one
/// failing fails the whole evaluation.
pub fn evaluate(
    rows: &[AnnualCashFlowRow],
    total_investment: Money,
    equity_investment: Money,
) -> SolarFinanceResult<EvaluationMetrics> {
    let Some(min_dscr) = rows.iter().map(|r| r.dscr).min() else {
        return Err(SolarFinanceError::DegenerateCashFlowSeries(
            "schedule has no operating years".into(),
        ));
    };

    let project_irr = irr_on_outlay(
        total_investment,
        rows.iter().map(|r| r.cfads),
        "Project IRR",
    )?;
    let equity_irr = irr_on_outlay(
        equity_investment,
        rows.iter().map(|r| r.equity_cash_flow),
        "Equity IRR",
    )?;

    Ok(EvaluationMetrics {
        project_irr,
        equity_irr,
        min_dscr,
    })
}

/// Simulate and evaluate one plant, wrapped in the standard output envelope.
pub fn evaluate_plant(
    input: &PlantEvaluationInput,
) -> SolarFinanceResult<ComputationOutput<EvaluationResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let schedule = simulate(&input.plant, &input.config)?;
    let metrics = evaluate(
        &schedule.rows,
        schedule.total_investment,
        schedule.equity_investment,
    )?;

    // ── Warnings ─────────────────────────────────────────────────────
    let serviced_min_dscr = schedule
        .rows
        .iter()
        .filter(|r| r.debt_service > Decimal::ZERO)
        .map(|r| r.dscr)
        .min();
    if let Some(dscr) = serviced_min_dscr {
        if dscr < DSCR_COVENANT {
            warnings.push(format!(
                "Minimum DSCR of {} is below {DSCR_COVENANT}x, lender covenant risk",
                dscr.round_dp(2)
            ));
        }
    }

    let target = input.config.target_project_irr;
    if target > Decimal::ZERO && metrics.project_irr < target {
        warnings.push(format!(
            "Project IRR of {} is below the {} target",
            metrics.project_irr.round_dp(4),
            target
        ));
    }

    let negative_years: Vec<String> = schedule
        .rows
        .iter()
        .filter(|r| r.cfads < Decimal::ZERO)
        .map(|r| r.year.to_string())
        .collect();
    if !negative_years.is_empty() {
        warnings.push(format!(
            "CFADS is negative in year(s) {}",
            negative_years.join(", ")
        ));
    }

    let result = EvaluationResult {
        project_irr: metrics.project_irr,
        equity_irr: metrics.equity_irr,
        min_dscr: metrics.min_dscr,
        total_investment: schedule.total_investment,
        equity_investment: schedule.equity_investment,
        annual_debt_service: schedule.annual_debt_service,
        rows: schedule.rows,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Rooftop Solar Project Finance (25-year pro-forma)",
        &serde_json::json!({
            "capacity_kw": input.plant.capacity_kw.to_string(),
            "system_cost_per_watt": input.plant.system_cost_per_watt.to_string(),
            "utilization_hours": input.config.utilization_hours,
            "self_use_fraction": input.config.self_use_fraction.to_string(),
            "collection_rate": input.config.collection_rate.to_string(),
            "debt_ratio": input.config.debt_ratio.to_string(),
            "loan_rate": input.config.loan_rate.to_string(),
            "loan_term_years": input.config.loan_term_years,
        }),
        warnings,
        elapsed,
        result,
    ))
}

/// IRR of a period-0 `outlay` followed by `inflows`.
///
/// A series with nothing invested has no return to solve for.
fn irr_on_outlay(
    outlay: Money,
    inflows: impl Iterator<Item = Money>,
    label: &str,
) -> SolarFinanceResult<Rate> {
    if outlay <= Decimal::ZERO {
        return Err(SolarFinanceError::DegenerateCashFlowSeries(format!(
            "{label}: initial outlay is {outlay}, nothing is invested"
        )));
    }
    let flows: Vec<Money> = iter::once(-outlay).chain(inflows).collect();
    time_value::irr(&flows, IRR_GUESS).map_err(|e| labelled(e, label))
}

/// Name which series failed in root-finder errors.
fn labelled(err: SolarFinanceError, label: &str) -> SolarFinanceError {
    match err {
        SolarFinanceError::DegenerateCashFlowSeries(reason) => {
            SolarFinanceError::DegenerateCashFlowSeries(format!("{label}: {reason}"))
        }
        SolarFinanceError::NonConvergentRootFind {
            iterations,
            last_delta,
            ..
        } => SolarFinanceError::NonConvergentRootFind {
            function: label.to_string(),
            iterations,
            last_delta,
        },
        other => other,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
