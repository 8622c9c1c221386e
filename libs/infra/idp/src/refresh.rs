// [libs/infra/idp/src/refresh.rs]
/*!
 * =================================================================
 * APARATO: OAUTH CREDENTIAL REFRESHER (V7.0 - ROTATION)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: ROTACIÓN DE access_token POR ADAPTADOR
 *
 * Dos físicas de rotación:
 * 1. Grant 'refresh_token' clásico (Entra, Okta, WorkOS/JumpCloud)
 *    contra el token_endpoint configurado del proveedor.
 * 2. Aserción JWT RS256 de cuenta de servicio (Google Workspace):
 *    cada rotación acuña y firma una aserción nueva.
 *
 * El fallo de una rotación no deshabilita nada por sí mismo: el
 * scheduler observará el token vencido y aplicará el presupuesto
 * normal de errores.
 * =================================================================
 */

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument};

use cerberus_domain_models::{Provider, ProviderAdapter};
use cerberus_domain_sync::{MappingViolation, SyncFault};

use crate::http::{build_adapter_client, fault_from_reqwest, resolve_page_response};

/// Endpoint por defecto para el intercambio de aserciones de Google.
const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
/// Vida solicitada para los access tokens acuñados por aserción.
const ASSERTION_LIFETIME_SECONDS: i64 = 3600;

/// Credenciales rotadas listas para persistirse en `adapter_state`.
#[derive(Debug, Clone)]
pub struct RefreshedCredentials {
    pub access_token: String,
    /// Algunos proveedores rotan también el refresh token.
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct TokenEndpointResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
}

/// Rota las credenciales de un proveedor según su adaptador.
#[instrument(skip(provider), fields(provider_id = %provider.id, adapter = provider.adapter.as_str()))]
pub async fn refresh_access_token(provider: &Provider) -> Result<RefreshedCredentials, SyncFault> {
    match provider.adapter {
        ProviderAdapter::GoogleWorkspace => refresh_via_service_account_assertion(provider).await,
        _ => refresh_via_refresh_token_grant(provider).await,
    }
}

/// Grant OAuth clásico `refresh_token` contra el endpoint configurado.
async fn refresh_via_refresh_token_grant(provider: &Provider) -> Result<RefreshedCredentials, SyncFault> {
    let adapter_state = provider.typed_state();
    let refresh_token = adapter_state
        .refresh_token
        .filter(|token| !token.is_empty())
        .ok_or(SyncFault::Validation(MappingViolation { entity: "provider", field: "refresh_token" }))?;

    let token_endpoint = required_config(provider, "token_endpoint")?;
    let client_id = required_config(provider, "client_id")?;
    let client_secret = required_config(provider, "client_secret")?;

    let form_parameters = [
        ("grant_type", "refresh_token".to_string()),
        ("refresh_token", refresh_token),
        ("client_id", client_id),
        ("client_secret", client_secret),
    ];

    exchange_at_token_endpoint(&token_endpoint, &form_parameters).await
}

/// Acuña y firma una aserción RS256 de cuenta de servicio y la
/// intercambia por un access token de la Admin SDK.
async fn refresh_via_service_account_assertion(
    provider: &Provider,
) -> Result<RefreshedCredentials, SyncFault> {
    let service_account_email = required_config(provider, "service_account_email")?;
    let private_key_pem = required_config(provider, "private_key")?;
    let impersonated_admin = required_config(provider, "impersonate_admin_email")?;
    let scopes = required_config(provider, "scopes")?;

    let token_uri = provider
        .adapter_config
        .get("token_uri")
        .and_then(Value::as_str)
        .unwrap_or(GOOGLE_TOKEN_URI)
        .to_string();

    #[derive(Serialize)]
    struct AssertionClaims {
        iss: String,
        sub: String,
        scope: String,
        aud: String,
        iat: i64,
        exp: i64,
    }

    let issued_at = Utc::now();
    let claims = AssertionClaims {
        iss: service_account_email,
        sub: impersonated_admin,
        scope: scopes,
        aud: token_uri.clone(),
        iat: issued_at.timestamp(),
        exp: (issued_at + Duration::seconds(ASSERTION_LIFETIME_SECONDS)).timestamp(),
    };

    let signing_key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes()).map_err(|_| {
        SyncFault::Validation(MappingViolation { entity: "provider", field: "private_key" })
    })?;

    let signed_assertion = encode(&Header::new(Algorithm::RS256), &claims, &signing_key)
        .map_err(|_| SyncFault::Validation(MappingViolation { entity: "provider", field: "private_key" }))?;

    let form_parameters = [
        ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer".to_string()),
        ("assertion", signed_assertion),
    ];

    exchange_at_token_endpoint(&token_uri, &form_parameters).await
}

/// POST del formulario al token endpoint y decodificación del grant.
async fn exchange_at_token_endpoint(
    token_endpoint: &str,
    form_parameters: &[(&str, String)],
) -> Result<RefreshedCredentials, SyncFault> {
    let network_client = build_adapter_client("Cerberus-TokenRefresher");

    let response = network_client
        .post(token_endpoint)
        .form(form_parameters)
        .send()
        .await
        .map_err(fault_from_reqwest)?;

    let body = resolve_page_response(response, extract_oauth_unauthorized).await?;

    let grant: TokenEndpointResponse = serde_json::from_value(body).map_err(|_| {
        SyncFault::Validation(MappingViolation { entity: "provider", field: "access_token" })
    })?;

    let expires_at = Utc::now() + Duration::seconds(grant.expires_in.unwrap_or(ASSERTION_LIFETIME_SECONDS));

    info!("🔑 [TOKEN_ROTATED]: Access credential refreshed (valid until {}).", expires_at);

    Ok(RefreshedCredentials {
        access_token: grant.access_token,
        refresh_token: grant.refresh_token,
        expires_at,
    })
}

fn required_config(provider: &Provider, field: &'static str) -> Result<String, SyncFault> {
    provider
        .adapter_config
        .get(field)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or(SyncFault::Validation(MappingViolation { entity: "provider", field }))
}

fn extract_oauth_unauthorized(body: &Value) -> String {
    body.get("error_description")
        .or_else(|| body.get("error"))
        .and_then(Value::as_str)
        .unwrap_or("token endpoint rejected the grant")
        .to_string()
}
// FIN DEL ARCHIVO [libs/infra/idp/src/refresh.rs]
