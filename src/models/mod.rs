//! Modelos del sistema
//!
//! Este módulo contiene los modelos de datos que comparten los stores,
//! los bucles de seguimiento y la API.

pub mod auth;
pub mod geofence;
pub mod marker;
pub mod vehicle;
