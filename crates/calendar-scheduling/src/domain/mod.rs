//! Domain layer: commands and scheduling rules.

pub mod commands;
pub mod conflict;
