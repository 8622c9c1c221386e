// [libs/infra/idp/src/entra.rs]
/*!
 * =================================================================
 * APARATO: MICROSOFT ENTRA DIRECTORY ADAPTER (V9.0 - GRAPH)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: LISTADOS GRAPH CON PAGINACIÓN @odata.nextLink
 *
 * Contratos de consulta:
 * 1. Usuarios: '$select' mínimo + '$filter=accountEnabled eq true'
 *    del lado servidor, '$top=999'.
 * 2. Miembros: 'transitiveMembers/microsoft.graph.user' con campos
 *    elegibles; el filtro 'accountEnabled == true' se aplica del lado
 *    CLIENTE para evitar el requisito ConsistencyLevel=eventual.
 * =================================================================
 */

use reqwest::Client;
use serde_json::Value;
use tracing::{debug, instrument};

use cerberus_domain_models::{RemoteGroup, RemoteUser};
use cerberus_domain_sync::attributes::{map_entra_group, map_entra_user};
use cerberus_domain_sync::SyncFault;

use crate::http::{build_adapter_client, fault_from_reqwest, resolve_page_response};

/// Campos mínimos de usuario que el mapa de atributos necesita.
const USER_SELECT_FIELDS: &str = "id,accountEnabled,displayName,givenName,surname,mail,userPrincipalName";
/// Campos mínimos de grupo.
const GROUP_SELECT_FIELDS: &str = "id,displayName";
/// Tamaño de página máximo admitido por Graph.
const GRAPH_PAGE_SIZE: u16 = 999;

pub struct EntraDirectoryClient {
    network_client: Client,
}

impl Default for EntraDirectoryClient {
    fn default() -> Self {
        Self::new()
    }
}

impl EntraDirectoryClient {
    pub fn new() -> Self {
        Self { network_client: build_adapter_client("Cerberus-DirectorySync/Entra") }
    }

    /// Lista los usuarios habilitados del tenant, agotando la paginación.
    #[instrument(skip(self, access_token))]
    pub async fn list_users(&self, endpoint: &str, access_token: &str) -> Result<Vec<RemoteUser>, SyncFault> {
        let first_page_url = format!(
            "{}/v1.0/users?$select={}&$filter=accountEnabled eq true&$top={}",
            endpoint.trim_end_matches('/'),
            USER_SELECT_FIELDS,
            GRAPH_PAGE_SIZE
        );

        let raw_records = self.drain_paginated(first_page_url, access_token).await?;

        raw_records
            .iter()
            .map(|record| map_entra_user(record).map_err(SyncFault::from))
            .collect()
    }

    /// Lista los grupos del tenant.
    #[instrument(skip(self, access_token))]
    pub async fn list_groups(&self, endpoint: &str, access_token: &str) -> Result<Vec<RemoteGroup>, SyncFault> {
        let first_page_url = format!(
            "{}/v1.0/groups?$select={}&$top={}",
            endpoint.trim_end_matches('/'),
            GROUP_SELECT_FIELDS,
            GRAPH_PAGE_SIZE
        );

        let raw_records = self.drain_paginated(first_page_url, access_token).await?;

        raw_records
            .iter()
            .map(|record| map_entra_group(record).map_err(SyncFault::from))
            .collect()
    }

    /// Lista los miembros transitivos de un grupo.
    ///
    /// El filtro de habilitación corre del lado cliente por contrato:
    /// empujarlo al servidor exigiría 'ConsistencyLevel: eventual' y
    /// '$count=true', con su lag de consistencia asociado.
    #[instrument(skip(self, access_token))]
    pub async fn list_group_members(
        &self,
        endpoint: &str,
        access_token: &str,
        remote_group_id: &str,
    ) -> Result<Vec<RemoteUser>, SyncFault> {
        let first_page_url = format!(
            "{}/v1.0/groups/{}/transitiveMembers/microsoft.graph.user?$select={}&$top={}",
            endpoint.trim_end_matches('/'),
            remote_group_id,
            USER_SELECT_FIELDS,
            GRAPH_PAGE_SIZE
        );

        let raw_records = self.drain_paginated(first_page_url, access_token).await?;

        raw_records
            .iter()
            .filter(|record| {
                record.get("accountEnabled").and_then(Value::as_bool).unwrap_or(false)
            })
            .map(|record| map_entra_user(record).map_err(SyncFault::from))
            .collect()
    }

    /// Agota una colección Graph siguiendo '@odata.nextLink'; acumula
    /// en orden de inserción.
    async fn drain_paginated(
        &self,
        first_page_url: String,
        access_token: &str,
    ) -> Result<Vec<Value>, SyncFault> {
        let mut accumulated_records = Vec::new();
        let mut next_page_url = Some(first_page_url);

        while let Some(page_url) = next_page_url.take() {
            let response = self
                .network_client
                .get(&page_url)
                .bearer_auth(access_token)
                .send()
                .await
                .map_err(fault_from_reqwest)?;

            let page = resolve_page_response(response, extract_graph_unauthorized).await?;

            if let Some(values) = page.get("value").and_then(Value::as_array) {
                accumulated_records.extend(values.iter().cloned());
            }

            next_page_url = page
                .get("@odata.nextLink")
                .and_then(Value::as_str)
                .map(str::to_string);

            debug!(
                "📄 [ENTRA_PAGE]: Accumulated {} records (next page: {}).",
                accumulated_records.len(),
                next_page_url.is_some()
            );
        }

        Ok(accumulated_records)
    }
}

fn extract_graph_unauthorized(body: &Value) -> String {
    body.get("error")
        .and_then(|error| error.get("message"))
        .and_then(Value::as_str)
        .unwrap_or("access token rejected")
        .to_string()
}
// FIN DEL ARCHIVO [libs/infra/idp/src/entra.rs]
