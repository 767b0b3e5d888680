//! HTTP surface: Axum routes, handlers, and wire DTOs.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::{AppState, AuthenticatedUser};
pub use routes::app_router;
