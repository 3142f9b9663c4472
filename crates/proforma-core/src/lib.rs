pub mod assumptions;
pub mod calendar;
pub mod coerce;
pub mod error;
pub mod expenses;
pub mod financing;
pub mod project;
pub mod proforma;
pub mod projection;
pub mod returns;
pub mod revenue;
pub mod scenarios;
pub mod time_value;
pub mod types;

pub use error::ProFormaError;
pub use types::*;

/// Standard result type for all pro-forma operations
pub type ProFormaResult<T> = Result<T, ProFormaError>;
