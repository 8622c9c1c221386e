// [libs/infra/idp/src/lib.rs]
/*!
 * =================================================================
 * APARATO: IDP ADAPTER SUITE (V7.0)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTERS (ESTRATO L3)
 * RESPONSABILIDAD: LISTADOS PAGINADOS Y REFRESCO DE CREDENCIALES
 *
 * Cada adaptador implementa el contrato de listado del plano de control:
 * `list_users` / `list_groups` / `list_group_members`, siguiendo la
 * paginación nativa del proveedor hasta agotarla y devolviendo una
 * única taxonomía de fallos (SyncFault) hacia el orquestador.
 * =================================================================
 */

pub mod entra;
pub mod google;
pub mod http;
pub mod okta;
pub mod refresh;
pub mod workos;

pub use entra::EntraDirectoryClient;
pub use google::GoogleDirectoryClient;
pub use okta::OktaDirectoryClient;
pub use refresh::{refresh_access_token, RefreshedCredentials};
pub use workos::WorkOsDirectoryClient;
