#![forbid(unsafe_code)]

pub mod model;
pub mod scoring;
pub mod time;
pub mod tips;

pub use scoring::{RoundStat, ScoreAggregator};
pub use time::Clock;
