// src/connectors/mod.rs
pub mod messages;
pub mod rest;
pub mod traits;
