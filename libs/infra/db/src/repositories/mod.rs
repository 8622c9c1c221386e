// [libs/infra/db/src/repositories/mod.rs]
/*!
 * =================================================================
 * APARATO: REPOSITORY REGISTRY (V8.0)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTERS (ESTRATO L3)
 * RESPONSABILIDAD: EXPOSICIÓN NOMINAL DE LOS REPOSITORIOS DEL PLANO
 * =================================================================
 */

pub mod account;
pub mod directory;
pub mod leadership;
pub mod provider;
pub mod settings;
pub mod token;

pub use account::AccountRepository;
pub use directory::DirectoryRepository;
pub use leadership::PostgresLeaseRegistry;
pub use provider::ProviderRepository;
pub use settings::load_config_overrides;
pub use token::{TokenRejection, TokenRepository};
