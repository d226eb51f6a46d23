pub mod constants;
pub mod engine;
pub mod ghost;
pub mod grid;
pub mod high_score_store;
pub mod rng;
pub mod schedule;
pub mod server_utils;
pub mod types;
