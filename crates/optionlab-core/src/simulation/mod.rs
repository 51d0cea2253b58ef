pub mod breakeven;
#[cfg(feature = "memo")]
pub mod cache;
pub mod grid;
pub mod payoff;
pub mod risk;
pub mod simulator;
