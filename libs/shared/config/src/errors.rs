// [libs/shared/config/src/errors.rs]
/*!
 * =================================================================
 * APARATO: CONFIG ERROR CATALOG (V3.0)
 * CLASIFICACIÓN: SHARED UTILITY (ESTRATO L4)
 * RESPONSABILIDAD: DIAGNÓSTICOS MULTILINEA CON REDACCIÓN SENSIBLE
 * =================================================================
 */

use thiserror::Error;

/// Marcador que sustituye todo valor sensible en los diagnósticos.
pub const REDACTED_PLACEHOLDER: &str = "*redacted*";

#[derive(Error, Debug)]
pub enum ConfigError {
    /// El valor de una fuente no parsea o no valida contra el tipo.
    ///
    /// El mensaje es multilinea por contrato: nombra la clave, la
    /// fuente que produjo el valor, el valor (redactado si aplica),
    /// el problema y la cadena de documentación de la clave.
    #[error(
        "[L4_CONFIG_FAULT]: Invalid value for configuration key '{key}'.\n  Source: {source_label}\n  Value: {rendered_value}\n  Problem: {problem}\n  Docs: {docs}"
    )]
    InvalidValue {
        key: String,
        source_label: String,
        rendered_value: String,
        problem: String,
        docs: String,
    },

    /// Ninguna fuente aportó un valor y la clave no declara default.
    #[error(
        "[L4_CONFIG_FAULT]: Missing required configuration key '{key}'.\n  Checked: environment variable {env_name}, database overrides, defaults\n  Docs: {docs}"
    )]
    MissingValue { key: String, env_name: String, docs: String },
}

impl ConfigError {
    /// Clave cuya resolución falló; el CLI la nombra en su salida.
    pub fn key(&self) -> &str {
        match self {
            ConfigError::InvalidValue { key, .. } => key,
            ConfigError::MissingValue { key, .. } => key,
        }
    }
}
// FIN DEL ARCHIVO [libs/shared/config/src/errors.rs]
