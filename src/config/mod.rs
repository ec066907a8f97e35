//! Configuración del proyecto
//!
//! Este módulo contiene las variables de entorno y los parámetros
//! de los bucles de seguimiento.

pub mod environment;

pub use environment::*;
