mod handlers;

pub use handlers::list_measurements;

// Re-export utoipa path struct for OpenAPI documentation
pub use handlers::__path_list_measurements;
