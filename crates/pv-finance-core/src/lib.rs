pub mod error;
pub mod solar;
pub mod time_value;
pub mod types;

pub use error::SolarFinanceError;
pub use types::*;

/// Standard result type for all pv-finance operations
pub type SolarFinanceResult<T> = Result<T, SolarFinanceError>;
