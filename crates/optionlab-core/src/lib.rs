pub mod error;
pub mod math;
pub mod pricing;
pub mod simulation;
pub mod strategy;
pub mod types;

#[cfg(feature = "export")]
pub mod export;

pub use error::OptionLabError;
pub use pricing::black_scholes::compute_option_price;
pub use pricing::greeks::{compute_greeks, OptionGreeks};
pub use simulation::simulator::{simulate_strategy, simulate_with_config, PlResult};
pub use strategy::leg::{Direction, EvaluationMode, MarketParameters, OptionLeg, OptionType, Strategy};
pub use strategy::validation::validate_strategy;
pub use types::*;

#[cfg(feature = "export")]
pub use export::csv::{parse_csv, summarize_rows, to_csv_string, write_csv};

#[cfg(feature = "memo")]
pub use simulation::cache::SimulationCache;

/// Standard result type for all option-lab operations
pub type OptionLabResult<T> = Result<T, OptionLabError>;
