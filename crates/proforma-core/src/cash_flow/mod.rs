pub mod analysis;
pub mod peak_capital;
pub mod series;

pub use analysis::{run_irr, run_peak_capital, IrrReport, MonthlySeriesInput};
pub use peak_capital::PeakCapital;
pub use series::{CashFlowEvent, CashFlowSeries, MonthlyCashFlow};
