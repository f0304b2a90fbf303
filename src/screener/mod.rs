// src/screener/mod.rs
pub mod chart;
pub mod chips;
pub mod controller;
pub mod filter;
pub mod params;
pub mod performance;
pub mod registry;
pub mod results;
