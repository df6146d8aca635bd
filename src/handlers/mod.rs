pub mod health_handlers;
pub mod path_handlers;
