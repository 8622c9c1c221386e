// [libs/shared/config/src/resolver.rs]
/*!
 * =================================================================
 * APARATO: CONFIG RESOLUTION ENGINE (V5.0 - PRECEDENCE SEALED)
 * CLASIFICACIÓN: SHARED UTILITY (ESTRATO L4)
 * RESPONSABILIDAD: PRECEDENCIA env > db > default Y PARSEO TOTAL
 *
 * # Mathematical Proof (Precedence Determinism):
 * Para una clave dada, la fuente ganadora es función exclusiva de la
 * presencia en el snapshot de entorno y en los overrides de base de
 * datos; dos resoluciones con los mismos snapshots producen el mismo
 * valor y la misma etiqueta de fuente.
 * =================================================================
 */

use std::collections::BTreeMap;

use crate::definition::{ConfigValue, KeyDefinition, ValueType};
use crate::errors::{ConfigError, REDACTED_PLACEHOLDER};

/// Fuente que aportó el valor ganador de una resolución.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionSource {
    Environment(String),
    Database,
    Default,
}

impl ResolutionSource {
    fn label(&self) -> String {
        match self {
            ResolutionSource::Environment(variable) => format!("environment variable {variable}"),
            ResolutionSource::Database => "database override".to_string(),
            ResolutionSource::Default => "built-in default".to_string(),
        }
    }
}

/// Motor de resolución sobre snapshots inmutables de ambas fuentes.
pub struct ConfigResolver {
    environment_snapshot: BTreeMap<String, String>,
    database_overrides: BTreeMap<String, String>,
}

impl ConfigResolver {
    /// Captura el entorno del proceso; los overrides llegan después
    /// vía [`ConfigResolver::with_database_overrides`].
    pub fn from_process_environment() -> Self {
        Self {
            environment_snapshot: std::env::vars().collect(),
            database_overrides: BTreeMap::new(),
        }
    }

    /// Constructor determinista para pruebas y herramientas.
    pub fn from_snapshots(
        environment_snapshot: BTreeMap<String, String>,
        database_overrides: BTreeMap<String, String>,
    ) -> Self {
        Self { environment_snapshot, database_overrides }
    }

    pub fn with_database_overrides(mut self, database_overrides: BTreeMap<String, String>) -> Self {
        self.database_overrides = database_overrides;
        self
    }

    /// Resuelve una clave aplicando la precedencia `env > db > default`.
    pub fn resolve(&self, definition: &KeyDefinition) -> Result<ConfigValue, ConfigError> {
        self.resolve_with_source(definition).map(|(value, _)| value)
    }

    /// Variante que además reporta la fuente ganadora.
    pub fn resolve_with_source(
        &self,
        definition: &KeyDefinition,
    ) -> Result<(ConfigValue, ResolutionSource), ConfigError> {
        let env_name = definition.env_name();

        let (raw_value, winning_source) = if let Some(env_value) = self.environment_snapshot.get(&env_name)
        {
            (env_value.clone(), ResolutionSource::Environment(env_name.clone()))
        } else if let Some(db_value) = self.database_overrides.get(definition.name) {
            (db_value.clone(), ResolutionSource::Database)
        } else if let Some(default) = &definition.default {
            (default.materialize(), ResolutionSource::Default)
        } else {
            return Err(ConfigError::MissingValue {
                key: definition.name.to_string(),
                env_name,
                docs: definition.docs.to_string(),
            });
        };

        let typed_value = parse_raw(&raw_value, &definition.value_type).map_err(|problem| {
            self.invalid_value(definition, &winning_source, &raw_value, problem)
        })?;

        if let Some(validator) = definition.validator {
            validator(&typed_value).map_err(|problem| {
                self.invalid_value(definition, &winning_source, &raw_value, problem)
            })?;
        }

        Ok((typed_value, winning_source))
    }

    fn invalid_value(
        &self,
        definition: &KeyDefinition,
        source: &ResolutionSource,
        raw_value: &str,
        problem: String,
    ) -> ConfigError {
        // Redacción soberana: el valor ofensivo jamás viaja al
        // diagnóstico cuando la clave es sensible.
        let rendered_value = if definition.sensitive {
            REDACTED_PLACEHOLDER.to_string()
        } else {
            format!("\"{raw_value}\"")
        };

        ConfigError::InvalidValue {
            key: definition.name.to_string(),
            source_label: source.label(),
            rendered_value,
            problem,
            docs: definition.docs.to_string(),
        }
    }
}

/// Parser total de un valor crudo contra un tipo declarado.
pub fn parse_raw(raw_value: &str, value_type: &ValueType) -> Result<ConfigValue, String> {
    match value_type {
        ValueType::String => Ok(ConfigValue::String(raw_value.to_string())),

        ValueType::Int => raw_value
            .trim()
            .parse::<i64>()
            .map(ConfigValue::Int)
            .map_err(|_| format!("'{raw_value}' is not an integer")),

        // Contrato de entorno: exactamente "1"/"0"/"true"/"false".
        ValueType::Bool => match raw_value.trim() {
            "1" | "true" => Ok(ConfigValue::Bool(true)),
            "0" | "false" => Ok(ConfigValue::Bool(false)),
            other => Err(format!("'{other}' is not a boolean (expected 1/0/true/false)")),
        },

        ValueType::Map => {
            let document: serde_json::Value = serde_json::from_str(raw_value)
                .map_err(|parse_fault| format!("value is not valid JSON: {parse_fault}"))?;
            let object = document
                .as_object()
                .ok_or_else(|| "expected a JSON object at the top level".to_string())?;
            let mut map = BTreeMap::new();
            for (entry_key, entry_value) in object {
                let rendered = match entry_value {
                    serde_json::Value::String(text) => text.clone(),
                    scalar => scalar.to_string(),
                };
                map.insert(entry_key.clone(), rendered);
            }
            Ok(ConfigValue::Map(map))
        }

        ValueType::Ip => raw_value
            .trim()
            .parse()
            .map(ConfigValue::Ip)
            .map_err(|_| format!("'{raw_value}' is not an IP address")),

        ValueType::Cidr => raw_value
            .trim()
            .parse()
            .map(ConfigValue::Cidr)
            .map_err(|_| format!("'{raw_value}' is not a CIDR block")),

        ValueType::Array { separator, element } => {
            if raw_value.trim().is_empty() {
                return Ok(ConfigValue::Array(Vec::new()));
            }
            let mut items = Vec::new();
            for fragment in raw_value.split(*separator) {
                let parsed = parse_raw(fragment.trim(), element)
                    .map_err(|problem| format!("array element rejected: {problem}"))?;
                items.push(parsed);
            }
            Ok(ConfigValue::Array(items))
        }

        ValueType::OneOf(alternatives) => {
            let mut rejections = Vec::new();
            for alternative in alternatives {
                match parse_raw(raw_value, alternative) {
                    Ok(parsed) => return Ok(parsed),
                    Err(problem) => rejections.push(problem),
                }
            }
            Err(format!("no alternative accepted the value ({})", rejections.join("; ")))
        }

        ValueType::Enum(literals) => {
            let candidate = raw_value.trim();
            if literals.contains(&candidate) {
                Ok(ConfigValue::Enum(candidate.to_string()))
            } else {
                Err(format!("'{candidate}' is not one of {{{}}}", literals.join(", ")))
            }
        }
    }
}
// FIN DEL ARCHIVO [libs/shared/config/src/resolver.rs]
