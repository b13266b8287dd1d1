pub mod arena;
pub mod color;
pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod logging;
pub mod round;
pub mod types;
