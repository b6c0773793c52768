//! Fukuoka open-data API: filtered queries over hourly air-quality
//! measurements and dam water levels, plus the CSV importers that load them.

pub mod common;
pub mod config;
pub mod entity;
pub mod error;
pub mod import;
pub mod routes;
pub mod services;
pub mod telemetry;
