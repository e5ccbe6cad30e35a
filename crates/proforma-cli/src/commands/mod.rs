pub mod absorption;
pub mod cash_flow;
pub mod proforma;
