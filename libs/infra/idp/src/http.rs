// [libs/infra/idp/src/http.rs]
/*!
 * =================================================================
 * APARATO: ADAPTER HTTP SUBSTRATE (V5.0)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTERS (ESTRATO L3)
 * RESPONSABILIDAD: CLIENTES POOLED, TIMEOUTS Y MAPEO DE TRANSPORTE
 * =================================================================
 */

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use tracing::warn;

use cerberus_domain_sync::{SyncFault, TransportFault};

/// Timeout de cada llamada al directorio remoto.
const ADAPTER_REQUEST_TIMEOUT_SECONDS: u64 = 30;
/// Conexiones ociosas retenidas por pool de adaptador.
const ADAPTER_POOL_MAX_IDLE: usize = 4;

/// Construye el cliente pooled de un adaptador. Un pool por adaptador
/// por nodo; TLS rustls resuelto por la feature del workspace.
pub fn build_adapter_client(user_agent: &str) -> Client {
    Client::builder()
        .timeout(Duration::from_secs(ADAPTER_REQUEST_TIMEOUT_SECONDS))
        .pool_max_idle_per_host(ADAPTER_POOL_MAX_IDLE)
        .tcp_keepalive(Some(Duration::from_secs(60)))
        .user_agent(user_agent.to_string())
        .build()
        .expect("FATAL: adapter HTTP client initialization failed")
}

/// Mapea un fallo de reqwest a la taxonomía de transporte del dominio.
pub fn fault_from_reqwest(transport_error: reqwest::Error) -> SyncFault {
    let transport_fault = if transport_error.is_timeout() {
        TransportFault::Timeout
    } else if transport_error.is_connect() {
        TransportFault::ConnectionRefused
    } else {
        TransportFault::Closed
    };
    SyncFault::Transport(transport_fault)
}

/// Resolución uniforme del estatus HTTP según el contrato de los adaptadores:
/// 200 entrega el cuerpo; 401 es no-autorizado con el texto del
/// proveedor; otros 4xx llevan el envoltorio decodificado; 5xx y los
/// 2xx distintos de 200 piden reintento.
pub async fn resolve_page_response(
    response: Response,
    extract_unauthorized_message: fn(&Value) -> String,
) -> Result<Value, SyncFault> {
    let status = response.status();

    if status == StatusCode::OK {
        return response.json::<Value>().await.map_err(fault_from_reqwest);
    }

    if status == StatusCode::UNAUTHORIZED {
        let body = response.json::<Value>().await.unwrap_or(Value::Null);
        return Err(SyncFault::Unauthorized { message: extract_unauthorized_message(&body) });
    }

    if status.is_client_error() {
        let body = response.json::<Value>().await.unwrap_or(Value::Null);
        return Err(SyncFault::Status { status: status.as_u16(), body });
    }

    if status.is_server_error() {
        warn!("⚠️ [IDP_UPSTREAM]: Remote directory returned {}. Scheduling retry.", status);
        return Err(SyncFault::RetryLater);
    }

    // 2xx distinto de 200, redirecciones sin seguir: reintento.
    Err(SyncFault::RetryLater)
}
// FIN DEL ARCHIVO [libs/infra/idp/src/http.rs]
