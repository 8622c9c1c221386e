// [libs/infra/idp/src/google.rs]
/*!
 * =================================================================
 * APARATO: GOOGLE WORKSPACE DIRECTORY ADAPTER (V8.0)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: LISTADOS admin/directory/v1 CON nextPageToken
 *
 * El access token llega ya acuñado por el refrescador (aserción JWT
 * RS256 de la cuenta de servicio); este adaptador solo lo porta.
 * =================================================================
 */

use reqwest::Client;
use serde_json::Value;
use tracing::{debug, instrument};

use cerberus_domain_models::{RemoteGroup, RemoteUser};
use cerberus_domain_sync::attributes::{map_google_group, map_google_user};
use cerberus_domain_sync::SyncFault;

use crate::http::{build_adapter_client, fault_from_reqwest, resolve_page_response};

/// Página máxima admitida por la Admin SDK para usuarios.
const DIRECTORY_PAGE_SIZE: u16 = 500;

pub struct GoogleDirectoryClient {
    network_client: Client,
}

impl Default for GoogleDirectoryClient {
    fn default() -> Self {
        Self::new()
    }
}

impl GoogleDirectoryClient {
    pub fn new() -> Self {
        Self { network_client: build_adapter_client("Cerberus-DirectorySync/Google") }
    }

    #[instrument(skip(self, access_token))]
    pub async fn list_users(&self, endpoint: &str, access_token: &str) -> Result<Vec<RemoteUser>, SyncFault> {
        let base_url = format!(
            "{}/admin/directory/v1/users?customer=my_customer&maxResults={}",
            endpoint.trim_end_matches('/'),
            DIRECTORY_PAGE_SIZE
        );

        let raw_records = self.drain_paginated(base_url, "users", access_token).await?;

        raw_records
            .iter()
            .map(|record| map_google_user(record).map_err(SyncFault::from))
            .collect()
    }

    #[instrument(skip(self, access_token))]
    pub async fn list_groups(&self, endpoint: &str, access_token: &str) -> Result<Vec<RemoteGroup>, SyncFault> {
        let base_url = format!(
            "{}/admin/directory/v1/groups?customer=my_customer&maxResults={}",
            endpoint.trim_end_matches('/'),
            DIRECTORY_PAGE_SIZE
        );

        let raw_records = self.drain_paginated(base_url, "groups", access_token).await?;

        raw_records
            .iter()
            .map(|record| map_google_group(record).map_err(SyncFault::from))
            .collect()
    }

    #[instrument(skip(self, access_token))]
    pub async fn list_group_members(
        &self,
        endpoint: &str,
        access_token: &str,
        remote_group_id: &str,
    ) -> Result<Vec<RemoteUser>, SyncFault> {
        let base_url = format!(
            "{}/admin/directory/v1/groups/{}/members?maxResults={}",
            endpoint.trim_end_matches('/'),
            remote_group_id,
            DIRECTORY_PAGE_SIZE
        );

        let raw_records = self.drain_paginated(base_url, "members", access_token).await?;

        // La lista de miembros solo porta id/email/role; el planner únicamente
        // necesita el identificador para la tupla de membresía.
        raw_records
            .iter()
            .map(|record| {
                let provider_identifier = record
                    .get("id")
                    .and_then(Value::as_str)
                    .ok_or(SyncFault::Validation(cerberus_domain_sync::MappingViolation {
                        entity: "member",
                        field: "id",
                    }))?;
                let email = record
                    .get("email")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                Ok(RemoteUser {
                    provider_identifier: provider_identifier.to_string(),
                    email: email.to_string(),
                    actor_name: email.to_string(),
                })
            })
            .collect()
    }

    /// Agota una colección de la Admin SDK acumulando el campo
    /// `collection_key` y siguiendo `nextPageToken`.
    async fn drain_paginated(
        &self,
        base_url: String,
        collection_key: &str,
        access_token: &str,
    ) -> Result<Vec<Value>, SyncFault> {
        let mut accumulated_records = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page_url = match &page_token {
                Some(token) => format!("{base_url}&pageToken={token}"),
                None => base_url.clone(),
            };

            let response = self
                .network_client
                .get(&page_url)
                .bearer_auth(access_token)
                .send()
                .await
                .map_err(fault_from_reqwest)?;

            let page = resolve_page_response(response, extract_google_unauthorized).await?;

            if let Some(values) = page.get(collection_key).and_then(Value::as_array) {
                accumulated_records.extend(values.iter().cloned());
            }

            page_token = page.get("nextPageToken").and_then(Value::as_str).map(str::to_string);

            debug!(
                "📄 [GOOGLE_PAGE]: Accumulated {} {} records (next page: {}).",
                accumulated_records.len(),
                collection_key,
                page_token.is_some()
            );

            if page_token.is_none() {
                return Ok(accumulated_records);
            }
        }
    }
}

fn extract_google_unauthorized(body: &Value) -> String {
    body.get("error")
        .and_then(|error| error.get("message"))
        .and_then(Value::as_str)
        .unwrap_or("access token rejected")
        .to_string()
}
// FIN DEL ARCHIVO [libs/infra/idp/src/google.rs]
