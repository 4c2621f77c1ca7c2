//! Lorewright - tabletop RPG content generation
//!
//! Core library providing the flow registry, prompt rendering, model
//! execution, block orchestration and formatting for game-master tools.

pub mod config;
pub mod core;


pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
