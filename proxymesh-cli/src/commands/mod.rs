//! Subcommand implementations

pub mod generate;
pub mod normalize_values;
