pub mod aggregate;
pub mod financing;
pub mod inputs;

pub use aggregate::{aggregate, run_proforma, ProformaMetrics, ProductTypeSummary};
pub use inputs::{ProductType, ProformaInputs};
