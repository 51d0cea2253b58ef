pub mod leg;
pub mod presets;
pub mod validation;
