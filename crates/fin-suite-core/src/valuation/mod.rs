pub mod cost_of_capital;
pub mod dcf;
pub mod npv;
pub mod payback;
