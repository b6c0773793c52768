//! Filter normalizers and query builders behind the HTTP handlers.

pub mod dams;
pub mod measurements;
mod params;
pub mod rate_limit;
