// [libs/domain/models/src/node.rs]
/*!
 * =================================================================
 * APARATO: DATA-PLANE NODE MODELS (V4.0 - PRESENCE CONTRACT)
 * CLASIFICACIÓN: DOMAIN ENTITIES (ESTRATO L2)
 * RESPONSABILIDAD: ATRIBUTOS DE PRESENCIA DE GATEWAYS Y RELAYS
 *
 * El plano de control solo gobierna la presencia y el rastro de
 * versión de los nodos del plano de datos; el forwarding de paquetes
 * queda fuera del perímetro de este sistema.
 * =================================================================
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, Ipv6Addr};
use uuid::Uuid;

/// Nodo gateway de un sitio de la tenencia.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gateway {
    pub id: Uuid,
    pub account_id: Uuid,
    /// Sitio (gateway group) al que pertenece el nodo.
    pub group_id: Uuid,
    pub name: String,
    pub last_seen_version: Option<String>,
    pub last_seen_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Nodo relay; sus metadatos de presencia viajan al registro de topics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relay {
    pub id: Uuid,
    /// Los relays globales no pertenecen a una cuenta.
    pub account_id: Option<Uuid>,
    pub ipv4: Option<Ipv4Addr>,
    pub ipv6: Option<Ipv6Addr>,
    pub port: u16,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub last_seen_version: Option<String>,
    pub last_seen_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}
// FIN DEL ARCHIVO [libs/domain/models/src/node.rs]
