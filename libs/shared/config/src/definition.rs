// [libs/shared/config/src/definition.rs]
/*!
 * =================================================================
 * APARATO: CONFIG KEY DEFINITIONS (V5.0)
 * CLASIFICACIÓN: SHARED UTILITY (ESTRATO L4)
 * RESPONSABILIDAD: TIPOS DE CLAVE, VALORES RESUELTOS Y DEFAULTS
 * =================================================================
 */

use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;

use ipnetwork::IpNetwork;

/// Validador: recibe el valor ya tipado y describe el problema en una
/// frase cuando rechaza.
pub type Validator = fn(&ConfigValue) -> Result<(), String>;

/// Default de una clave: un valor literal o un thunk evaluado en el
/// momento de la resolución.
pub enum DefaultValue {
    Literal(&'static str),
    Thunk(fn() -> String),
}

impl DefaultValue {
    pub fn materialize(&self) -> String {
        match self {
            DefaultValue::Literal(raw) => (*raw).to_string(),
            DefaultValue::Thunk(thunk) => thunk(),
        }
    }
}

/// Tipo declarado de una clave de configuración.
#[derive(Clone)]
pub enum ValueType {
    String,
    Int,
    Bool,
    /// Documento JSON objeto plano `clave -> valor`.
    Map,
    Ip,
    Cidr,
    /// Secuencia separada; `separator` por defecto es coma.
    Array { separator: char, element: Box<ValueType> },
    /// El primer tipo que parsee con éxito gana.
    OneOf(Vec<ValueType>),
    /// Conjunto cerrado de literales admitidos.
    Enum(&'static [&'static str]),
}

impl fmt::Display for ValueType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::String => write!(formatter, "string"),
            ValueType::Int => write!(formatter, "integer"),
            ValueType::Bool => write!(formatter, "boolean (1/0/true/false)"),
            ValueType::Map => write!(formatter, "JSON object"),
            ValueType::Ip => write!(formatter, "IP address"),
            ValueType::Cidr => write!(formatter, "CIDR block"),
            ValueType::Array { separator, element } => {
                write!(formatter, "'{separator}'-separated list of {element}")
            }
            ValueType::OneOf(alternatives) => {
                let rendered: Vec<String> =
                    alternatives.iter().map(|alternative| alternative.to_string()).collect();
                write!(formatter, "one of [{}]", rendered.join(" | "))
            }
            ValueType::Enum(literals) => write!(formatter, "enum {{{}}}", literals.join(", ")),
        }
    }
}

/// Definición estática de una clave.
pub struct KeyDefinition {
    /// Nombre en minúsculas; la variable de entorno es el mismo nombre
    /// en mayúsculas (contrato 1:1).
    pub name: &'static str,
    pub value_type: ValueType,
    pub default: Option<DefaultValue>,
    pub validator: Option<Validator>,
    /// Los valores sensibles se redactan en todo diagnóstico.
    pub sensitive: bool,
    /// Cadena de documentación referenciada en los errores de resolución.
    pub docs: &'static str,
}

impl KeyDefinition {
    pub fn env_name(&self) -> String {
        self.name.to_uppercase()
    }
}

/// Valor de configuración ya tipado.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    String(String),
    Int(i64),
    Bool(bool),
    Map(BTreeMap<String, String>),
    Ip(IpAddr),
    Cidr(IpNetwork),
    Array(Vec<ConfigValue>),
    Enum(String),
}

impl ConfigValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(value) | ConfigValue::Enum(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ConfigValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[ConfigValue]> {
        match self {
            ConfigValue::Array(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::String(value) | ConfigValue::Enum(value) => write!(formatter, "{value}"),
            ConfigValue::Int(value) => write!(formatter, "{value}"),
            ConfigValue::Bool(value) => write!(formatter, "{value}"),
            ConfigValue::Map(map) => write!(formatter, "{map:?}"),
            ConfigValue::Ip(address) => write!(formatter, "{address}"),
            ConfigValue::Cidr(network) => write!(formatter, "{network}"),
            ConfigValue::Array(items) => {
                let rendered: Vec<String> = items.iter().map(|item| item.to_string()).collect();
                write!(formatter, "[{}]", rendered.join(","))
            }
        }
    }
}
// FIN DEL ARCHIVO [libs/shared/config/src/definition.rs]
