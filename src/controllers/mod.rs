//! Controladores
//!
//! Validan las requests, llaman a los servicios y construyen las respuestas.

pub mod auth_controller;
pub mod geofence_controller;
pub mod vehicle_controller;
