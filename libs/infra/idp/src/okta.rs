// [libs/infra/idp/src/okta.rs]
/*!
 * =================================================================
 * APARATO: OKTA DIRECTORY ADAPTER (V8.0)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: LISTADOS /api/v1 CON PAGINACIÓN Link rel="next"
 * =================================================================
 */

use reqwest::header::LINK;
use reqwest::{Client, Response};
use serde_json::Value;
use tracing::{debug, instrument};

use cerberus_domain_models::{RemoteGroup, RemoteUser};
use cerberus_domain_sync::attributes::{map_okta_group, map_okta_user};
use cerberus_domain_sync::SyncFault;

use crate::http::{build_adapter_client, fault_from_reqwest, resolve_page_response};

pub struct OktaDirectoryClient {
    network_client: Client,
}

impl Default for OktaDirectoryClient {
    fn default() -> Self {
        Self::new()
    }
}

impl OktaDirectoryClient {
    pub fn new() -> Self {
        Self { network_client: build_adapter_client("Cerberus-DirectorySync/Okta") }
    }

    #[instrument(skip(self, access_token))]
    pub async fn list_users(&self, endpoint: &str, access_token: &str) -> Result<Vec<RemoteUser>, SyncFault> {
        let first_page_url = format!("{}/api/v1/users", endpoint.trim_end_matches('/'));
        let raw_records = self.drain_paginated(first_page_url, access_token).await?;

        raw_records
            .iter()
            .map(|record| map_okta_user(record).map_err(SyncFault::from))
            .collect()
    }

    #[instrument(skip(self, access_token))]
    pub async fn list_groups(&self, endpoint: &str, access_token: &str) -> Result<Vec<RemoteGroup>, SyncFault> {
        let first_page_url = format!("{}/api/v1/groups", endpoint.trim_end_matches('/'));
        let raw_records = self.drain_paginated(first_page_url, access_token).await?;

        raw_records
            .iter()
            .map(|record| map_okta_group(record).map_err(SyncFault::from))
            .collect()
    }

    #[instrument(skip(self, access_token))]
    pub async fn list_group_members(
        &self,
        endpoint: &str,
        access_token: &str,
        remote_group_id: &str,
    ) -> Result<Vec<RemoteUser>, SyncFault> {
        let first_page_url =
            format!("{}/api/v1/groups/{}/users", endpoint.trim_end_matches('/'), remote_group_id);
        let raw_records = self.drain_paginated(first_page_url, access_token).await?;

        raw_records
            .iter()
            .map(|record| map_okta_user(record).map_err(SyncFault::from))
            .collect()
    }

    /// Agota una colección Okta siguiendo la cabecera `Link` con
    /// `rel="next"`; las páginas son arreglos JSON planos.
    async fn drain_paginated(
        &self,
        first_page_url: String,
        access_token: &str,
    ) -> Result<Vec<Value>, SyncFault> {
        let mut accumulated_records = Vec::new();
        let mut next_page_url = Some(first_page_url);

        while let Some(page_url) = next_page_url.take() {
            // El token llega del grant OAuth del refrescador: viaja como
            // portador, igual que en el resto de adaptadores.
            let response = self
                .network_client
                .get(&page_url)
                .bearer_auth(access_token)
                .header("Accept", "application/json")
                .send()
                .await
                .map_err(fault_from_reqwest)?;

            // La cabecera debe capturarse antes de consumir el cuerpo.
            next_page_url = extract_next_link(&response);

            let page = resolve_page_response(response, extract_okta_unauthorized).await?;

            if let Some(values) = page.as_array() {
                accumulated_records.extend(values.iter().cloned());
            }

            debug!(
                "📄 [OKTA_PAGE]: Accumulated {} records (next page: {}).",
                accumulated_records.len(),
                next_page_url.is_some()
            );
        }

        Ok(accumulated_records)
    }
}

/// Extrae la URL `rel="next"` del encabezado Link multivaluado.
fn extract_next_link(response: &Response) -> Option<String> {
    for header_value in response.headers().get_all(LINK) {
        let rendered = header_value.to_str().ok()?;
        for segment in rendered.split(',') {
            if segment.contains("rel=\"next\"") {
                let url = segment.split(';').next()?.trim().trim_start_matches('<').trim_end_matches('>');
                return Some(url.to_string());
            }
        }
    }
    None
}

fn extract_okta_unauthorized(body: &Value) -> String {
    body.get("errorSummary")
        .and_then(Value::as_str)
        .unwrap_or("access token rejected")
        .to_string()
}
// FIN DEL ARCHIVO [libs/infra/idp/src/okta.rs]
