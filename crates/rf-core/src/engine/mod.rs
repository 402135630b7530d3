//! Motor de transiciones (start / update / insert child) y su builder.

pub mod builder;
pub mod core;

pub use self::core::RulesEngine;
pub use builder::EngineBuilder;
