// [libs/shared/config/src/lib.rs]
/*!
 * =================================================================
 * APARATO: CONFIG RESOLVER (V5.0 - TYPED PRECEDENCE)
 * CLASIFICACIÓN: SHARED UTILITY (ESTRATO L4)
 * RESPONSABILIDAD: RESOLUCIÓN TIPADA DE CLAVES DE CONFIGURACIÓN
 *
 * Cada clave tiene un tipo, un default opcional (valor o thunk), un
 * validador opcional y un flag de sensibilidad. La resolución aplica
 * la precedencia estricta `env > db > default`; todo valor inválido
 * produce un error multilinea que nombra la fuente y jamás filtra
 * valores sensibles.
 * =================================================================
 */

pub mod definition;
pub mod errors;
pub mod resolver;
pub mod validators;

pub use definition::{ConfigValue, DefaultValue, KeyDefinition, ValueType};
pub use errors::ConfigError;
pub use resolver::{ConfigResolver, ResolutionSource};
