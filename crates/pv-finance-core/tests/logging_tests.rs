use std::sync::Mutex;

use log::{Level, LevelFilter, Log, Metadata, Record};
use pv_finance_core::solar::{
    self, ModuleTechnology, PlantEconomics, PricingAppraisalInput, TariffFinancingConfig,
};
use rust_decimal_macros::dec;

/// Collects every warning emitted through the `log` facade.
struct CapturingLogger {
    lines: Mutex<Vec<String>>,
}

impl Log for CapturingLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Warn
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            if let Ok(mut lines) = self.lines.lock() {
                lines.push(record.args().to_string());
            }
        }
    }

    fn flush(&self) {}
}

static LOGGER: CapturingLogger = CapturingLogger {
    lines: Mutex::new(Vec::new()),
};

#[test]
fn test_appraisal_logs_each_warning_once() {
    log::set_logger(&LOGGER).unwrap();
    log::set_max_level(LevelFilter::Warn);

    let config = TariffFinancingConfig {
        target_project_irr: dec!(0.4321),
        ..Default::default()
    };
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
    let result = solar::appraise_pricing_ceiling(&input).unwrap();

    let lines = LOGGER.lines.lock().unwrap();
    for warning in &result.warnings {
        let logged = lines.iter().filter(|l| l.ends_with(warning.as_str())).count();
        assert_eq!(logged, 1, "'{warning}' logged {logged} times: {lines:?}");
    }
    assert!(lines.iter().any(|l| l.contains("below the 0.4321 target")));
    assert!(lines.iter().any(|l| l.contains("unreachable")));
}
