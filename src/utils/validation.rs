//! Utilidades de validación
//!
//! Este módulo contiene funciones helper para validación de datos
//! usadas por los derives de `validator`.

use std::sync::OnceLock;

use regex::Regex;
use validator::ValidationError;

/// Matrículas: letras, dígitos, espacios y guiones
fn license_plate_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9฀-๿][A-Za-z0-9฀-๿ \-]{1,18}[A-Za-z0-9฀-๿]$")
            .expect("license plate regex is valid")
    })
}

/// Validar formato de matrícula
pub fn validate_license_plate(value: &str) -> Result<(), ValidationError> {
    if !license_plate_regex().is_match(value.trim()) {
        let mut error = ValidationError::new("license_plate");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar que un string no esté vacío
pub fn validate_not_empty(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("not_empty");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_license_plates() {
        assert!(validate_license_plate("AB-1234").is_ok());
        assert!(validate_license_plate("1กข 2345").is_ok());
        assert!(validate_license_plate("-AB").is_err());
        assert!(validate_license_plate("").is_err());
        assert!(validate_license_plate("AB_12").is_err());
    }

    #[test]
    fn test_not_empty() {
        assert!(validate_not_empty("Depot").is_ok());
        assert!(validate_not_empty("   ").is_err());
    }
}
