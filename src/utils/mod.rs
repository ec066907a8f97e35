//! Utilidades del sistema
//!
//! Este módulo contiene utilidades para manejo de errores, validación
//! y cálculos geográficos.

pub mod errors;
pub mod geo;
pub mod validation;
