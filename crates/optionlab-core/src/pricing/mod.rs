pub mod black_scholes;
pub mod greeks;
pub mod implied_vol;
