//! sea-orm entities for the air-quality and dam tables.

pub mod dam_levels;
pub mod dams;
pub mod measurement_types;
pub mod measurements;
pub mod stations;
