//! Fleet tracking core
//!
//! Store de posiciones, reconciliador de marcadores, bucle de refresco y
//! evaluador de geocercas, expuestos por una API axum.

pub mod config;
pub mod controllers;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

pub use routes::create_router;
pub use state::AppState;
