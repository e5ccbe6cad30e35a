pub mod absorption;
pub mod calendar;
pub mod cash_flow;
pub mod coerce;
pub mod error;
pub mod time_value;
pub mod types;

#[cfg(feature = "proforma")]
pub mod proforma;

#[cfg(feature = "burn_schedule")]
pub mod burn_schedule;

#[cfg(feature = "timeline")]
pub mod timeline;

pub use error::ProformaError;
pub use types::*;

/// Standard result type for all proforma operations
pub type ProformaResult<T> = Result<T, ProformaError>;
