//! Objetos de transferencia de la API HTTP

pub mod api_response;
pub mod auth_dto;
pub mod geofence_dto;
pub mod map_dto;
pub mod vehicle_dto;
