pub mod cash_flow;
pub mod config;
pub mod metrics;
pub mod plant;
pub mod pricing;
pub mod regime;

#[cfg(feature = "portfolio")]
pub mod portfolio;

pub use cash_flow::{simulate, AnnualCashFlowRow, CashFlowSchedule};
pub use config::TariffFinancingConfig;
pub use metrics::{evaluate, evaluate_plant, EvaluationMetrics, EvaluationResult, PlantEvaluationInput};
pub use plant::{DegradationProfile, ModuleTechnology, PlantEconomics};
pub use pricing::{
    appraise_pricing_ceiling, pricing_ceiling, PricingAppraisal, PricingAppraisalInput, PricingCeiling,
    PricingCeilingInput,
};
