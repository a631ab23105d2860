//! Core types shared across the codebase.

mod route;
mod state;

pub use route::{RoutePath, RoutePathError};
pub use state::{is_shutdown, register_server, setup_shutdown_handler};
