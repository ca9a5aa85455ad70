// src/lib.rs

pub mod c_api;
pub mod core;
pub mod fuzzy;
pub mod persistence;
pub mod ranking;

pub use crate::core::engine::{ControlMessage, HighlightEngine, InitOutcome};
