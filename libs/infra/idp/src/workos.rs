// [libs/infra/idp/src/workos.rs]
/*!
 * =================================================================
 * APARATO: WORKOS DIRECTORY ADAPTER (V6.0 - JUMPCLOUD BRIDGE)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: LISTADOS /directory_* CON CURSOR list_metadata.after
 *
 * JumpCloud (y todo directorio SCIM intermediado por WorkOS) expone
 * usuarios y grupos bajo un directory_id; el envoltorio de error es
 * el minimalista `{message}`.
 * =================================================================
 */

use reqwest::Client;
use serde_json::Value;
use tracing::{debug, instrument};

use cerberus_domain_models::{RemoteGroup, RemoteUser};
use cerberus_domain_sync::attributes::{map_workos_group, map_workos_user};
use cerberus_domain_sync::SyncFault;

use crate::http::{build_adapter_client, fault_from_reqwest, resolve_page_response};

/// Tamaño de página del API de WorkOS.
const WORKOS_PAGE_LIMIT: u16 = 100;

pub struct WorkOsDirectoryClient {
    network_client: Client,
}

impl Default for WorkOsDirectoryClient {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkOsDirectoryClient {
    pub fn new() -> Self {
        Self { network_client: build_adapter_client("Cerberus-DirectorySync/WorkOS") }
    }

    /// Usuarios del directorio; `directory_identifier` llega del
    /// `adapter_config` del proveedor.
    #[instrument(skip(self, access_token))]
    pub async fn list_users(
        &self,
        endpoint: &str,
        access_token: &str,
        directory_identifier: &str,
    ) -> Result<Vec<RemoteUser>, SyncFault> {
        let base_url = format!(
            "{}/directory_users?directory={}&limit={}",
            endpoint.trim_end_matches('/'),
            directory_identifier,
            WORKOS_PAGE_LIMIT
        );

        let raw_records = self.drain_paginated(base_url, access_token).await?;

        raw_records
            .iter()
            .map(|record| map_workos_user(record).map_err(SyncFault::from))
            .collect()
    }

    #[instrument(skip(self, access_token))]
    pub async fn list_groups(
        &self,
        endpoint: &str,
        access_token: &str,
        directory_identifier: &str,
    ) -> Result<Vec<RemoteGroup>, SyncFault> {
        let base_url = format!(
            "{}/directory_groups?directory={}&limit={}",
            endpoint.trim_end_matches('/'),
            directory_identifier,
            WORKOS_PAGE_LIMIT
        );

        let raw_records = self.drain_paginated(base_url, access_token).await?;

        raw_records
            .iter()
            .map(|record| map_workos_group(record).map_err(SyncFault::from))
            .collect()
    }

    /// Miembros de un grupo del directorio.
    #[instrument(skip(self, access_token))]
    pub async fn list_group_members(
        &self,
        endpoint: &str,
        access_token: &str,
        remote_group_id: &str,
    ) -> Result<Vec<RemoteUser>, SyncFault> {
        let base_url = format!(
            "{}/directory_users?group={}&limit={}",
            endpoint.trim_end_matches('/'),
            remote_group_id,
            WORKOS_PAGE_LIMIT
        );

        let raw_records = self.drain_paginated(base_url, access_token).await?;

        raw_records
            .iter()
            .map(|record| map_workos_user(record).map_err(SyncFault::from))
            .collect()
    }

    /// Agota una colección WorkOS siguiendo `list_metadata.after`.
    async fn drain_paginated(
        &self,
        base_url: String,
        access_token: &str,
    ) -> Result<Vec<Value>, SyncFault> {
        let mut accumulated_records = Vec::new();
        let mut after_cursor: Option<String> = None;

        loop {
            let page_url = match &after_cursor {
                Some(cursor) => format!("{base_url}&after={cursor}"),
                None => base_url.clone(),
            };

            let response = self
                .network_client
                .get(&page_url)
                .bearer_auth(access_token)
                .send()
                .await
                .map_err(fault_from_reqwest)?;

            let page = resolve_page_response(response, extract_workos_unauthorized).await?;

            if let Some(values) = page.get("data").and_then(Value::as_array) {
                accumulated_records.extend(values.iter().cloned());
            }

            after_cursor = page
                .get("list_metadata")
                .and_then(|metadata| metadata.get("after"))
                .and_then(Value::as_str)
                .map(str::to_string);

            debug!(
                "📄 [WORKOS_PAGE]: Accumulated {} records (next page: {}).",
                accumulated_records.len(),
                after_cursor.is_some()
            );

            if after_cursor.is_none() {
                return Ok(accumulated_records);
            }
        }
    }
}

fn extract_workos_unauthorized(body: &Value) -> String {
    body.get("message")
        .and_then(Value::as_str)
        .unwrap_or("access token rejected")
        .to_string()
}
// FIN DEL ARCHIVO [libs/infra/idp/src/workos.rs]
