// [libs/domain/models/src/token.rs]
/*!
 * =================================================================
 * APARATO: TOKEN DOMAIN MODELS (V10.0 - SECRECY SEALED)
 * CLASIFICACIÓN: DOMAIN ENTITIES (ESTRATO L2)
 * RESPONSABILIDAD: MATERIAL PORTADOR OPACO Y DIGESTOS SHA3-256
 *
 * VISION HIPER-HOLÍSTICA:
 * 1. SECRECY: el nonce jamás toca el almacenamiento. Solo persisten
 *    'secret_salt' y 'secret_hash = SHA3-256(nonce ‖ fragment ‖ salt)'.
 * 2. SINGLE REVEAL: el secreto codificado se entrega exactamente una
 *    vez, en el valor de retorno de la creación.
 * 3. USABILITY: un token es usable sii no está borrado, no expiró y
 *    conserva intentos restantes (cuando el contador aplica).
 * =================================================================
 */

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};
use uuid::Uuid;

/// Bytes aleatorios por componente del secreto antes de base64url.
const SECRET_NONCE_BYTES: usize = 12;
const SECRET_FRAGMENT_BYTES: usize = 24;
const SECRET_SALT_BYTES: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    Browser,
    Client,
    Email,
    ApiClient,
    RelayGroup,
    GatewayGroup,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Browser => "browser",
            TokenType::Client => "client",
            TokenType::Email => "email",
            TokenType::ApiClient => "api_client",
            TokenType::RelayGroup => "relay_group",
            TokenType::GatewayGroup => "gateway_group",
        }
    }
}

impl std::str::FromStr for TokenType {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "browser" => Ok(TokenType::Browser),
            "client" => Ok(TokenType::Client),
            "email" => Ok(TokenType::Email),
            "api_client" => Ok(TokenType::ApiClient),
            "relay_group" => Ok(TokenType::RelayGroup),
            "gateway_group" => Ok(TokenType::GatewayGroup),
            other => Err(format!("unknown token type '{other}'")),
        }
    }
}

/// Registro persistido de un token portador. Nótese la ausencia
/// estructural de todo campo de nonce o fragmento.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub id: Uuid,
    /// Los tokens de email de registro aún no pertenecen a una cuenta.
    pub account_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    pub secret_salt: String,
    pub secret_hash: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub remaining_attempts: Option<i32>,
    pub last_seen_at: Option<DateTime<Utc>>,
    pub last_seen_remote_ip: Option<String>,
    pub last_seen_user_agent: Option<String>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Token {
    /// Predicado de usabilidad del contrato de admisión.
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.deleted_at.is_none()
            && self.expires_at.map_or(true, |expires_at| expires_at > now)
            && self.remaining_attempts.map_or(true, |attempts| attempts > 0)
    }

    /// Verifica un secreto presentado contra el digesto persistido.
    pub fn verify_secret(&self, presented_secret: &str) -> bool {
        compute_secret_hash(presented_secret, &self.secret_salt) == self.secret_hash
    }
}

/// Resultado de la creación: el registro persistible más el secreto
/// codificado que se revela una única vez.
#[derive(Debug, Clone)]
pub struct CreatedToken {
    pub token: Token,
    /// `<nonce><fragment>` en base64url; el portador lo presenta tal cual.
    pub encoded_secret: String,
}

/// Forja el material secreto de un token nuevo.
///
/// El digesto cubre la concatenación exacta `nonce ‖ fragment ‖ salt`;
/// como el portador presenta `nonce ‖ fragment`, la verificación es
/// `SHA3-256(presentado ‖ salt)` sin necesidad de re-particionar.
pub fn forge_token(
    account_id: Option<Uuid>,
    token_type: TokenType,
    expires_at: Option<DateTime<Utc>>,
    remaining_attempts: Option<i32>,
    now: DateTime<Utc>,
) -> CreatedToken {
    let nonce = random_urlsafe(SECRET_NONCE_BYTES);
    let fragment = random_urlsafe(SECRET_FRAGMENT_BYTES);
    let salt = random_urlsafe(SECRET_SALT_BYTES);

    let encoded_secret = format!("{nonce}{fragment}");
    let secret_hash = compute_secret_hash(&encoded_secret, &salt);

    CreatedToken {
        token: Token {
            id: Uuid::new_v4(),
            account_id,
            token_type,
            secret_salt: salt,
            secret_hash,
            expires_at,
            remaining_attempts,
            last_seen_at: None,
            last_seen_remote_ip: None,
            last_seen_user_agent: None,
            deleted_at: None,
            created_at: now,
        },
        encoded_secret,
    }
}

/// `SHA3-256(secreto_presentado ‖ salt)` en hexadecimal minúsculo.
pub fn compute_secret_hash(presented_secret: &str, salt: &str) -> String {
    let mut hasher = Sha3_256::new();
    hasher.update(presented_secret.as_bytes());
    hasher.update(salt.as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|byte| format!("{byte:02x}")).collect()
}

fn random_urlsafe(byte_count: usize) -> String {
    let mut raw_material = vec![0u8; byte_count];
    rand::thread_rng().fill_bytes(&mut raw_material);
    URL_SAFE_NO_PAD.encode(raw_material)
}
// FIN DEL ARCHIVO [libs/domain/models/src/token.rs]
