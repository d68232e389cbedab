#![forbid(unsafe_code)]

pub mod bank;
pub mod evaluator;
pub mod filtering;
pub mod model;
pub mod navigation;
pub mod shuffle;
pub mod time;

pub use time::Clock;
