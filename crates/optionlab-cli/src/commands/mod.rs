pub mod pricing;
pub mod strategy;
