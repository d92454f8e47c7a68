pub mod amortization;
pub mod assistant;
pub mod risk;
