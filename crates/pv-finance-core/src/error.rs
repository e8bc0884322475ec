use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SolarFinanceError {
    #[error("Invalid configuration: {field} — {reason}")]
    InvalidConfiguration { field: String, reason: String },

    #[error("Degenerate cash-flow series: {0}")]
    DegenerateCashFlowSeries(String),

    #[error("Root-find failure: {function} did not converge after {iterations} iterations (delta: {last_delta})")]
    NonConvergentRootFind {
        function: String,
        iterations: u32,
        last_delta: Decimal,
    },

    #[error("Degenerate target IRR: {target} must be greater than zero")]
    DegenerateTargetIrr { target: Decimal },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl SolarFinanceError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        SolarFinanceError::InvalidConfiguration {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for SolarFinanceError {
    fn from(e: serde_json::Error) -> Self {
        SolarFinanceError::SerializationError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_json_error_converts() {
        let err: SolarFinanceError = serde_json::from_str::<serde_json::Value>("{ not json")
            .unwrap_err()
            .into();
        assert!(matches!(err, SolarFinanceError::SerializationError(_)));
    }

    #[test]
    fn test_messages_name_the_field() {
        let err = SolarFinanceError::invalid("loan_term_years", "Loan term must be 1 to 25 years");
        assert!(err.to_string().contains("loan_term_years"));

        let err = SolarFinanceError::DegenerateTargetIrr { target: dec!(0) };
        assert!(err.to_string().contains("greater than zero"));
    }
}
