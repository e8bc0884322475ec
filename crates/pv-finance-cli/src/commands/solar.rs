use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use pv_finance_core::solar::portfolio::{self, PortfolioInput};
use pv_finance_core::solar::{
    self, ModuleTechnology, PlantEconomics, PlantEvaluationInput, PricingAppraisalInput,
    TariffFinancingConfig,
};

use crate::input;

/// Plant flags shared by every single-plant command
#[derive(Args)]
pub struct PlantArgs {
    /// Installed capacity in kW
    #[arg(long)]
    pub capacity_kw: Option<Decimal>,

    /// Confirmed roof area in m² (capacity derived from module power density)
    #[arg(long, conflicts_with = "capacity_kw")]
    pub area_m2: Option<Decimal>,

    /// Blended system cost per watt
    #[arg(long)]
    pub system_cost: Option<Decimal>,

    /// Inverter unit cost per watt, paid again at the replacement year
    #[arg(long, default_value = "0.12")]
    pub inverter_cost: Decimal,

    /// Module technology (topcon or back-contact)
    #[arg(long, default_value = "topcon")]
    pub technology: String,
}

/// Tariff and financing overrides; anything omitted keeps its default
#[derive(Args)]
pub struct ConfigArgs {
    /// Full-load-equivalent hours per year
    #[arg(long)]
    pub utilization_hours: Option<u32>,

    /// Blended retail tariff (per kWh)
    #[arg(long)]
    pub retail_tariff: Option<Decimal>,

    /// Self-consumption fraction (e.g. 0.7)
    #[arg(long)]
    pub self_use: Option<Decimal>,

    /// Billing collection rate (e.g. 0.98)
    #[arg(long)]
    pub collection_rate: Option<Decimal>,

    /// Debt / total investment (e.g. 0.7)
    #[arg(long)]
    pub debt_ratio: Option<Decimal>,

    /// Annual loan interest rate (e.g. 0.032)
    #[arg(long)]
    pub loan_rate: Option<Decimal>,

    /// Loan term in years
    #[arg(long)]
    pub loan_term: Option<u32>,

    /// Year-1 operating cost per watt
    #[arg(long)]
    pub opex_per_watt: Option<Decimal>,

    /// Target project IRR for the pricing ceiling (e.g. 0.065)
    #[arg(long)]
    pub target_irr: Option<Decimal>,
}

impl ConfigArgs {
    fn apply(&self, mut config: TariffFinancingConfig) -> TariffFinancingConfig {
        if let Some(v) = self.utilization_hours {
            config.utilization_hours = v;
        }
        if let Some(v) = self.retail_tariff {
            config.retail_tariff = v;
        }
        if let Some(v) = self.self_use {
            config.self_use_fraction = v;
        }
        if let Some(v) = self.collection_rate {
            config.collection_rate = v;
        }
        if let Some(v) = self.debt_ratio {
            config.debt_ratio = v;
        }
        if let Some(v) = self.loan_rate {
            config.loan_rate = v;
        }
        if let Some(v) = self.loan_term {
            config.loan_term_years = v;
        }
        if let Some(v) = self.opex_per_watt {
            config.opex_per_watt = v;
        }
        if let Some(v) = self.target_irr {
            config.target_project_irr = v;
        }
        config
    }
}

fn plant_from_flags(args: &PlantArgs) -> Result<PlantEconomics, Box<dyn std::error::Error>> {
    let technology: ModuleTechnology = args.technology.parse()?;
    let capacity_kw = match (args.capacity_kw, args.area_m2) {
        (Some(kw), _) => kw,
        (None, Some(area)) => technology.capacity_kw_for_area(area)?,
        (None, None) => return Err("--capacity-kw or --area-m2 is required (or provide --input)".into()),
    };
    let system_cost = args
        .system_cost
        .ok_or("--system-cost is required (or provide --input)")?;

    Ok(PlantEconomics::with_technology(
        capacity_kw,
        system_cost,
        args.inverter_cost,
        technology,
    ))
}

/// File first, then piped stdin, then flags.
fn load_plant_input(
    path: &Option<String>,
    plant: &PlantArgs,
    config: &ConfigArgs,
) -> Result<PlantEvaluationInput, Box<dyn std::error::Error>> {
    if let Some(ref path) = path {
        input::file::read_json(path)
    } else if let Some(data) = input::stdin::read_stdin()? {
        Ok(serde_json::from_value(data)?)
    } else {
        Ok(PlantEvaluationInput {
            plant: plant_from_flags(plant)?,
            config: config.apply(TariffFinancingConfig::default()),
        })
    }
}

/// Arguments for a full plant evaluation
#[derive(Args)]
pub struct EvaluateArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub plant: PlantArgs,

    #[command(flatten)]
    pub config: ConfigArgs,
}

pub fn run_evaluate(args: EvaluateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let plant_input = load_plant_input(&args.input, &args.plant, &args.config)?;
    let result = solar::evaluate_plant(&plant_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for printing the annual schedule
#[derive(Args)]
pub struct ScheduleArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub plant: PlantArgs,

    #[command(flatten)]
    pub config: ConfigArgs,
}

pub fn run_schedule(args: ScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let plant_input = load_plant_input(&args.input, &args.plant, &args.config)?;
    let schedule = solar::simulate(&plant_input.plant, &plant_input.config)?;
    Ok(serde_json::to_value(schedule.rows)?)
}

/// Arguments for the pricing ceiling
#[derive(Args)]
pub struct CeilingArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub plant: PlantArgs,

    #[command(flatten)]
    pub config: ConfigArgs,

    /// Development fee per watt included in the system cost
    #[arg(long, default_value = "0.10")]
    pub development_fee: Decimal,
}

pub fn run_ceiling(args: CeilingArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let appraisal_input: PricingAppraisalInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        PricingAppraisalInput {
            plant: plant_from_flags(&args.plant)?,
            config: args.config.apply(TariffFinancingConfig::default()),
            development_fee_per_watt: args.development_fee,
        }
    };
    let result = solar::appraise_pricing_ceiling(&appraisal_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for comparing candidate schemes
#[derive(Args)]
pub struct CompareArgs {
    /// Path to JSON input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_compare(args: CompareArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let portfolio_input: PortfolioInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file.json> or stdin required for scheme comparison".into());
    };
    let result = portfolio::compare_schemes(&portfolio_input)?;
    Ok(serde_json::to_value(result)?)
}
