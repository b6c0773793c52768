mod handlers;
mod types;

pub use handlers::list_dam_levels;
pub use types::DamLevelResponse;

// Re-export utoipa path struct for OpenAPI documentation
pub use handlers::__path_list_dam_levels;
