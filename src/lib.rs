//! LADDER: power-ladder round tracker and betting strategy simulator
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod countdown;
pub mod types;
pub mod feed;
pub mod strategy;
pub mod engine;
pub mod dashboard;
