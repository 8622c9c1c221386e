// [libs/domain/models/src/provider.rs]
/*!
 * =================================================================
 * APARATO: AUTH PROVIDER DOMAIN MODELS (V9.0 - SYNC STATE)
 * CLASIFICACIÓN: DOMAIN ENTITIES (ESTRATO L2)
 * RESPONSABILIDAD: VÍNCULO TENENCIA <-> IDP Y ESTADO DE SINCRONÍA
 *
 * VISION HIPER-HOLÍSTICA:
 * 1. OPAQUE STATE: 'adapter_state' permanece como documento JSON con
 *    un accesor tipado fino para credenciales OAuth; las llaves ajenas
 *    (sub opaco, claves custom) jamás se pierden en una rotación.
 * 2. SYNC LEDGER: el registro transporta el contador de fallos, el
 *    último error clasificado y las marcas de deshabilitación que el
 *    scheduler usa para el backoff exponencial.
 * =================================================================
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Vínculo de una tenencia con un proveedor de identidad externo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provider {
    pub id: Uuid,
    pub account_id: Uuid,
    pub name: String,
    pub adapter: ProviderAdapter,
    pub provisioner: Provisioner,
    /// Configuración opaca por adaptador (endpoint, client_id, scopes).
    #[serde(default)]
    pub adapter_config: serde_json::Value,
    /// Documento JSON con credenciales vivas; ver [`AdapterState`].
    #[serde(default)]
    pub adapter_state: serde_json::Value,
    pub last_synced_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_syncs_failed: i32,
    pub last_sync_error: Option<String>,
    /// Primera marca de la racha de errores transitorios vigente.
    pub sync_errored_at: Option<DateTime<Utc>>,
    pub sync_disabled_at: Option<DateTime<Utc>>,
    pub sync_error_emailed_at: Option<DateTime<Utc>>,
    /// Superficie para el panel admin: deshabilitación y verificación.
    #[serde(default)]
    pub is_disabled: bool,
    pub disabled_reason: Option<String>,
    #[serde(default = "default_verified")]
    pub is_verified: bool,
    pub disabled_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Provider {
    /// Accesor tipado sobre el documento `adapter_state`.
    pub fn typed_state(&self) -> AdapterState {
        serde_json::from_value(self.adapter_state.clone()).unwrap_or_default()
    }

    /// Endpoint raíz del directorio remoto, resuelto de `adapter_config`.
    pub fn api_endpoint(&self) -> Option<&str> {
        self.adapter_config.get("api_base_url").and_then(|value| value.as_str())
    }

    /// Un proveedor es elegible para sincronizar si no está borrado,
    /// deshabilitado, ni con la sincronía vetada por el clasificador.
    pub fn is_sync_eligible(&self) -> bool {
        self.deleted_at.is_none()
            && self.disabled_at.is_none()
            && self.sync_disabled_at.is_none()
            && !self.is_disabled
            && self.last_syncs_failed <= 10
    }

    /// Las credenciales requieren rotación si hay refresh_token y la
    /// expiración quedó en el pasado.
    pub fn needs_token_refresh(&self, now: DateTime<Utc>) -> bool {
        let state = self.typed_state();
        state.refresh_token.as_deref().is_some_and(|token| !token.is_empty())
            && state.expires_at.is_some_and(|expires_at| expires_at < now)
    }
}

fn default_verified() -> bool {
    true
}

/// Catálogo de adaptadores soportados por el plano de control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderAdapter {
    OpenidConnect,
    MicrosoftEntra,
    Okta,
    GoogleWorkspace,
    Jumpcloud,
    Email,
    Userpass,
    Mock,
}

impl ProviderAdapter {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderAdapter::OpenidConnect => "openid_connect",
            ProviderAdapter::MicrosoftEntra => "microsoft_entra",
            ProviderAdapter::Okta => "okta",
            ProviderAdapter::GoogleWorkspace => "google_workspace",
            ProviderAdapter::Jumpcloud => "jumpcloud",
            ProviderAdapter::Email => "email",
            ProviderAdapter::Userpass => "userpass",
            ProviderAdapter::Mock => "mock",
        }
    }

    /// Adaptadores que ejecutan sincronización de directorio.
    pub fn supports_directory_sync(&self) -> bool {
        matches!(
            self,
            ProviderAdapter::MicrosoftEntra
                | ProviderAdapter::Okta
                | ProviderAdapter::GoogleWorkspace
                | ProviderAdapter::Jumpcloud
        )
    }

    /// Adaptadores OIDC-like: exactamente uno no-borrado por cuenta.
    pub fn is_unique_per_account(&self) -> bool {
        !matches!(self, ProviderAdapter::Email | ProviderAdapter::Userpass)
    }
}

impl std::str::FromStr for ProviderAdapter {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "openid_connect" => Ok(ProviderAdapter::OpenidConnect),
            "microsoft_entra" => Ok(ProviderAdapter::MicrosoftEntra),
            "okta" => Ok(ProviderAdapter::Okta),
            "google_workspace" => Ok(ProviderAdapter::GoogleWorkspace),
            "jumpcloud" => Ok(ProviderAdapter::Jumpcloud),
            "email" => Ok(ProviderAdapter::Email),
            "userpass" => Ok(ProviderAdapter::Userpass),
            "mock" => Ok(ProviderAdapter::Mock),
            other => Err(format!("unknown provider adapter '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provisioner {
    Manual,
    JustInTime,
    Custom,
}

impl Provisioner {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provisioner::Manual => "manual",
            Provisioner::JustInTime => "just_in_time",
            Provisioner::Custom => "custom",
        }
    }
}

impl std::str::FromStr for Provisioner {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "manual" => Ok(Provisioner::Manual),
            "just_in_time" => Ok(Provisioner::JustInTime),
            "custom" => Ok(Provisioner::Custom),
            other => Err(format!("unknown provisioner '{other}'")),
        }
    }
}

/// Accesor fino sobre el documento opaco `adapter_state`.
///
/// Las llaves que el accesor no modela viajan en `extra` y se
/// re-serializan intactas; una rotación de credenciales solo toca los
/// tres campos OAuth.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdapterState {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub userinfo: serde_json::Value,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl AdapterState {
    /// Rotación de credenciales: reemplaza únicamente la tríada OAuth.
    pub fn with_rotated_credentials(
        mut self,
        access_token: String,
        refresh_token: Option<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        self.access_token = Some(access_token);
        if refresh_token.is_some() {
            self.refresh_token = refresh_token;
        }
        self.expires_at = Some(expires_at);
        self
    }

    pub fn to_document(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
// FIN DEL ARCHIVO [libs/domain/models/src/provider.rs]
