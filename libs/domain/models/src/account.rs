// [libs/domain/models/src/account.rs]
/*!
 * =================================================================
 * APARATO: ACCOUNT DOMAIN MODELS (V6.0 - TENANT ROOT)
 * CLASIFICACIÓN: DOMAIN ENTITIES (ESTRATO L2)
 * RESPONSABILIDAD: RAÍZ DE TENENCIA, FLAGS DE CAPACIDAD Y LÍMITES
 *
 * VISION HIPER-HOLÍSTICA:
 * La Cuenta es la raíz de propiedad exclusiva: todo proveedor, actor,
 * identidad, grupo, nodo y token vive bajo exactamente una cuenta.
 * Los flags de features gobiernan qué motores del plano de control
 * pueden operar sobre la tenencia (notablemente 'idp_sync').
 * =================================================================
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Raíz de tenencia del plano de control.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub legal_name: String,
    /// Deshabilitación suave por operadores; una cuenta deshabilitada
    /// conserva todos sus registros pero ningún motor la procesa.
    pub disabled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub features: AccountFeatures,
    /// Límite nominal -> valor; `None` significa ilimitado.
    #[serde(default)]
    pub limits: BTreeMap<String, Option<i64>>,
    /// Metadatos opacos de colaboradores externos (facturación).
    #[serde(default)]
    pub metadata: serde_json::Value,
    pub warning: Option<String>,
    pub warning_last_sent_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub config: AccountConfig,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Una cuenta es operable si no fue deshabilitada por un operador.
    pub fn is_active(&self) -> bool {
        self.disabled_at.is_none()
    }

    /// Compuerta de capacidad para el motor de sincronización de directorios.
    pub fn idp_sync_enabled(&self) -> bool {
        self.is_active() && self.features.idp_sync
    }
}

/// Flags de capacidad por tenencia. Los flags desconocidos se preservan
/// en `extra` para compatibilidad hacia adelante con el esquema JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountFeatures {
    #[serde(default)]
    pub idp_sync: bool,
    #[serde(default)]
    pub multi_site_resources: bool,
    #[serde(default)]
    pub self_hosted_relays: bool,
    #[serde(flatten)]
    pub extra: BTreeMap<String, bool>,
}

/// Configuración operacional anidada de la cuenta.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountConfig {
    #[serde(default)]
    pub notifications: AccountNotifications,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountNotifications {
    #[serde(default)]
    pub outdated_gateway: OutdatedGatewayNotification,
}

/// Estado de la notificación de gateways con versión obsoleta.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutdatedGatewayNotification {
    #[serde(default)]
    pub enabled: bool,
    pub last_notified: Option<DateTime<Utc>>,
}
// FIN DEL ARCHIVO [libs/domain/models/src/account.rs]
