// [libs/domain/sync/src/classifier.rs]
/*!
 * =================================================================
 * APARATO: SYNC ERROR CLASSIFIER (V9.0 - TAXONOMY SEALED)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: FALLO CRUDO -> {client_error|transient} + MENSAJE
 *
 * Matriz normativa:
 *   HTTP 4xx            -> client_error, deshabilitar de inmediato
 *   HTTP 401            -> client_error con el texto del proveedor
 *   HTTP 5xx / 2xx!=200 -> transient, registrar; escalar a las 24 h
 *   Transporte          -> transient, registrar; escalar a las 24 h
 *   Validación          -> client_error (campo requerido ausente)
 *   Scopes faltantes    -> client_error con lista accionable
 *   Cortacircuitos      -> client_error (borraría toda una clase)
 *
 * Los formateadores preservan los códigos nativos del proveedor:
 * Entra error.code/innerError.code, Google error.code + errors[0].reason,
 * Okta errorCode + errorSummary.
 * =================================================================
 */

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use thiserror::Error;

use crate::attributes::MappingViolation;

/// Presupuesto de fallos transitorios antes de escalar a deshabilitación.
const TRANSIENT_ESCALATION_BUDGET_HOURS: i64 = 24;

/// Sabor de API que produjo el fallo; gobierna el formateo del mensaje.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiFlavor {
    MicrosoftGraph,
    Okta,
    GoogleDirectory,
    WorkOs,
}

impl ApiFlavor {
    /// Etiqueta humana del servicio remoto.
    pub fn label(&self) -> &'static str {
        match self {
            ApiFlavor::MicrosoftGraph => "Microsoft Graph API",
            ApiFlavor::Okta => "Okta API",
            ApiFlavor::GoogleDirectory => "Google Admin API",
            ApiFlavor::WorkOs => "WorkOS API",
        }
    }
}

/// Fallo crudo observado en la frontera adaptadores -> orquestador.
#[derive(Error, Debug, Clone)]
pub enum SyncFault {
    /// 5xx, o un 2xx distinto de 200: reintentar más tarde.
    #[error("remote service asked to retry later")]
    RetryLater,

    /// 401 con el texto del proveedor embebido.
    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    /// 4xx con el envoltorio de error documentado del proveedor.
    #[error("HTTP {status}")]
    Status { status: u16, body: Value },

    /// Fallo de transporte por debajo de HTTP.
    #[error("transport fault: {0:?}")]
    Transport(TransportFault),

    /// Registro remoto sin un campo requerido por el mapa de atributos.
    #[error("{0}")]
    Validation(#[from] MappingViolation),

    /// La credencial carece de scopes OAuth que el adaptador necesita.
    #[error("missing OAuth scopes")]
    MissingScopes { missing: Vec<String> },

    /// El plan borraría la totalidad de una clase de recursos.
    #[error("refusing destructive plan for {resource_class}")]
    CircuitBreaker { resource_class: &'static str, local_total: usize },
}

/// Fallos de la capa de transporte, todos transitorios.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportFault {
    Nxdomain,
    Timeout,
    ConnectionRefused,
    Closed,
    TlsAlert,
    HostUnreachable,
    NetUnreachable,
}

impl TransportFault {
    fn describe(&self) -> &'static str {
        match self {
            TransportFault::Nxdomain => "DNS name does not exist",
            TransportFault::Timeout => "connection timed out",
            TransportFault::ConnectionRefused => "connection refused",
            TransportFault::Closed => "connection closed unexpectedly",
            TransportFault::TlsAlert => "TLS negotiation failed",
            TransportFault::HostUnreachable => "host unreachable",
            TransportFault::NetUnreachable => "network unreachable",
        }
    }
}

/// Resultado de la clasificación.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    ClientError,
    Transient,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub kind: FaultKind,
    /// Mensaje de una línea apto para `last_sync_error` y el panel admin.
    pub message: String,
}

/// Acción sobre el registro del directorio tras clasificar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryAction {
    /// Registrar el error y dejar que el scheduler reintente con backoff.
    Record,
    /// Deshabilitar el directorio de inmediato (`disabled_reason = "Sync error"`).
    Disable,
}

/// Mapea un fallo crudo a su clase y mensaje humano de una línea.
pub fn classify(flavor: ApiFlavor, fault: &SyncFault) -> Classified {
    match fault {
        SyncFault::RetryLater => Classified {
            kind: FaultKind::Transient,
            message: format!("{} is temporarily unavailable", flavor.label()),
        },

        SyncFault::Transport(transport_fault) => Classified {
            kind: FaultKind::Transient,
            message: format!("{} is unreachable: {}", flavor.label(), transport_fault.describe()),
        },

        SyncFault::Unauthorized { message } => Classified {
            kind: FaultKind::ClientError,
            message: format!("{} returned 401: {}", flavor.label(), message),
        },

        SyncFault::Status { status, body } => Classified {
            kind: FaultKind::ClientError,
            message: format!("HTTP {status} - {}", format_provider_envelope(flavor, body)),
        },

        SyncFault::Validation(violation) => Classified {
            kind: FaultKind::ClientError,
            message: format!(
                "Directory data rejected: remote {} record is missing required field '{}'",
                violation.entity, violation.field
            ),
        },

        SyncFault::MissingScopes { missing } => Classified {
            kind: FaultKind::ClientError,
            message: format!(
                "Missing OAuth scopes: {}. Grant them to the connected application and re-verify the directory",
                missing.join(", ")
            ),
        },

        SyncFault::CircuitBreaker { resource_class, local_total } => Classified {
            kind: FaultKind::ClientError,
            message: format!(
                "Sync aborted: the remote snapshot would delete all {local_total} {resource_class}; refusing to apply a destructive plan"
            ),
        },
    }
}

/// Máquina de estados del directorio: los errores de cliente deshabilitan
/// de inmediato; los transitorios solo tras 24 h de racha ininterrumpida.
pub fn directory_action(
    classified: &Classified,
    sync_errored_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> DirectoryAction {
    match classified.kind {
        FaultKind::ClientError => DirectoryAction::Disable,
        FaultKind::Transient => match sync_errored_at {
            Some(first_errored_at)
                if now - first_errored_at >= Duration::hours(TRANSIENT_ESCALATION_BUDGET_HOURS) =>
            {
                DirectoryAction::Disable
            }
            _ => DirectoryAction::Record,
        },
    }
}

/// Formatea el envoltorio de error nativo del proveedor en una frase,
/// preservando los códigos que el operador necesita para el soporte.
fn format_provider_envelope(flavor: ApiFlavor, body: &Value) -> String {
    match flavor {
        // {error: {code, message, innerError: {code}}}
        ApiFlavor::MicrosoftGraph => {
            let error = body.get("error").cloned().unwrap_or(Value::Null);
            let code = string_at(&error, &["code"]);
            let inner_code = string_at(&error, &["innerError", "code"]);
            let message = string_at(&error, &["message"]);
            match (code, inner_code, message) {
                (Some(code), Some(inner), Some(message)) => format!("{code} ({inner}): {message}"),
                (Some(code), None, Some(message)) => format!("{code}: {message}"),
                (Some(code), _, None) => code,
                _ => compact(body),
            }
        }

        // {errorCode, errorSummary, errorLink, errorId}
        ApiFlavor::Okta => {
            let code = string_at(body, &["errorCode"]);
            let summary = string_at(body, &["errorSummary"]);
            match (code, summary) {
                (Some(code), Some(summary)) => format!("{code}: {summary}"),
                (None, Some(summary)) => summary,
                (Some(code), None) => code,
                _ => compact(body),
            }
        }

        // {error: {code, message, errors: [{reason}]}}
        ApiFlavor::GoogleDirectory => {
            let error = body.get("error").cloned().unwrap_or(Value::Null);
            let code = error.get("code").and_then(Value::as_i64);
            let reason = error
                .get("errors")
                .and_then(Value::as_array)
                .and_then(|errors| errors.first())
                .and_then(|first| first.get("reason"))
                .and_then(Value::as_str)
                .map(str::to_string);
            let message = string_at(&error, &["message"]);
            match (code, reason, message) {
                (Some(code), Some(reason), Some(message)) => format!("{code} ({reason}): {message}"),
                (Some(code), None, Some(message)) => format!("{code}: {message}"),
                (_, _, Some(message)) => message,
                _ => compact(body),
            }
        }

        // {message}
        ApiFlavor::WorkOs => string_at(body, &["message"]).unwrap_or_else(|| compact(body)),
    }
}

fn string_at(document: &Value, path: &[&str]) -> Option<String> {
    let mut cursor = document;
    for segment in path {
        cursor = cursor.get(segment)?;
    }
    cursor.as_str().map(str::to_string)
}

/// Último recurso: el cuerpo compactado en una línea.
fn compact(body: &Value) -> String {
    serde_json::to_string(body).unwrap_or_else(|_| "unparseable error body".to_string())
}
// FIN DEL ARCHIVO [libs/domain/sync/src/classifier.rs]
