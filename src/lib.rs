pub mod auth;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod resource;
pub mod routes;
pub mod services;
pub mod state;
pub mod types;

pub use routes::app;
pub use state::AppState;
