use std::collections::HashSet;
use std::time::Instant;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::SolarFinanceError;
use crate::solar::cash_flow::simulate;
use crate::solar::config::TariffFinancingConfig;
use crate::solar::metrics::evaluate;
use crate::solar::plant::PlantEconomics;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::SolarFinanceResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One candidate scheme (technology and equipment selection) for a site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemeInput {
    pub name: String,
    pub plant: PlantEconomics,
}

/// Candidate schemes evaluated against one shared configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioInput {
    #[serde(default)]
    pub config: TariffFinancingConfig,
    pub schemes: Vec<SchemeInput>,
}

/// Headline figures for one evaluated scheme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemeSummary {
    pub name: String,
    pub capacity_kw: Decimal,
    pub system_cost_per_watt: Money,
    pub total_investment: Money,
    pub project_irr: Rate,
    pub equity_irr: Rate,
    pub min_dscr: Decimal,
    /// Year-1 generation (kWh)
    pub first_year_generation_kwh: Decimal,
}

/// Investment-weighted reduction over finalized schemes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioAggregate {
    pub scheme_count: usize,
    pub total_capacity_kw: Decimal,
    pub total_investment: Money,
    pub weighted_project_irr: Rate,
    pub weighted_equity_irr: Rate,
    pub min_dscr: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioOutput {
    pub schemes: Vec<SchemeSummary>,
    /// Scheme with the highest project IRR
    pub best_scheme: String,
    pub aggregate: PortfolioAggregate,
}

// ---------------------------------------------------------------------------
// Core computation
// ---------------------------------------------------------------------------

/// Evaluate one scheme into its summary.
pub fn summarize_scheme(
    scheme: &SchemeInput,
    config: &TariffFinancingConfig,
) -> SolarFinanceResult<SchemeSummary> {
    let schedule = simulate(&scheme.plant, config)?;
    let metrics = evaluate(
        &schedule.rows,
        schedule.total_investment,
        schedule.equity_investment,
    )?;

    Ok(SchemeSummary {
        name: scheme.name.clone(),
        capacity_kw: scheme.plant.capacity_kw,
        system_cost_per_watt: scheme.plant.system_cost_per_watt,
        total_investment: schedule.total_investment,
        project_irr: metrics.project_irr,
        equity_irr: metrics.equity_irr,
        min_dscr: metrics.min_dscr,
        first_year_generation_kwh: schedule
            .rows
            .first()
            .map(|r| r.generation_kwh)
            .unwrap_or(Decimal::ZERO),
    })
}

/// Investment-weighted average IRRs and portfolio-wide minimum DSCR.
pub fn aggregate(summaries: &[SchemeSummary]) -> SolarFinanceResult<PortfolioAggregate> {
    let Some(min_dscr) = summaries.iter().map(|s| s.min_dscr).min() else {
        return Err(SolarFinanceError::invalid(
            "schemes",
            "At least one scheme is required",
        ));
    };

    let total_investment: Money = summaries.iter().map(|s| s.total_investment).sum();
    if total_investment <= Decimal::ZERO {
        return Err(SolarFinanceError::invalid(
            "total_investment",
            "Portfolio investment must be positive to weight returns",
        ));
    }

    Ok(PortfolioAggregate {
        scheme_count: summaries.len(),
        total_capacity_kw: summaries.iter().map(|s| s.capacity_kw).sum(),
        total_investment,
        weighted_project_irr: weighted_average(summaries, total_investment, |s| s.project_irr),
        weighted_equity_irr: weighted_average(summaries, total_investment, |s| s.equity_irr),
        min_dscr,
    })
}

fn weighted_average(
    summaries: &[SchemeSummary],
    total_investment: Money,
    rate: impl Fn(&SchemeSummary) -> Rate,
) -> Rate {
    summaries
        .iter()
        .map(|s| rate(s) * s.total_investment)
        .sum::<Decimal>()
        / total_investment
}

/// Evaluate every scheme under the shared configuration, rank them and
/// aggregate the result.
pub fn compare_schemes(
    input: &PortfolioInput,
) -> SolarFinanceResult<ComputationOutput<PortfolioOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let mut seen = HashSet::new();
    for scheme in &input.schemes {
        if !seen.insert(scheme.name.as_str()) {
            return Err(SolarFinanceError::invalid(
                "schemes",
                format!("Duplicate scheme name '{}'", scheme.name),
            ));
        }
    }

    let schemes = input
        .schemes
        .iter()
        .map(|s| summarize_scheme(s, &input.config))
        .collect::<SolarFinanceResult<Vec<_>>>()?;
    let aggregate = aggregate(&schemes)?;

    let best_scheme = schemes
        .iter()
        .max_by(|a, b| a.project_irr.cmp(&b.project_irr))
        .map(|s| s.name.clone())
        .unwrap_or_default();

    let target = input.config.target_project_irr;
    for s in &schemes {
        if target > Decimal::ZERO && s.project_irr < target {
            warnings.push(format!(
                "Scheme '{}' project IRR of {} is below the {} target",
                s.name,
                s.project_irr.round_dp(4),
                target
            ));
        }
    }

    let output = PortfolioOutput {
        schemes,
        best_scheme,
        aggregate,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Scheme Comparison (investment-weighted IRR)",
        &serde_json::json!({
            "scheme_count": input.schemes.len(),
            "target_project_irr": target.to_string(),
            "weighting": "total_investment",
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
