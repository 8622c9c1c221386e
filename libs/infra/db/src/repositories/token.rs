// [libs/infra/db/src/repositories/token.rs]
/*!
 * =================================================================
 * APARATO: TOKEN REPOSITORY (V9.0 - SECRECY SEALED)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: PERSISTENCIA DE DIGESTOS Y CONSUMO DE TOKENS
 *
 * Invariante de secreto: las columnas persistidas son únicamente
 * 'secret_salt' y 'secret_hash'; ni el nonce ni el fragmento tocan
 * el almacenamiento en ningún camino de código.
 * =================================================================
 */

use chrono::{DateTime, Utc};
use tokio_postgres::Row;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use cerberus_domain_models::{Token, TokenType};

use crate::client::PostgresClient;
use crate::errors::DbError;

const INSERT_TOKEN: &str = r#"
    INSERT INTO tokens
        (id, account_id, type, secret_salt, secret_hash, expires_at, remaining_attempts, created_at)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
"#;

const SELECT_TOKEN_BY_ID: &str = r#"
    SELECT id, account_id, type, secret_salt, secret_hash, expires_at, remaining_attempts,
           last_seen_at, last_seen_remote_ip, last_seen_user_agent, deleted_at, created_at
    FROM tokens
    WHERE id = $1
"#;

/// Consumo exitoso: rastro de último uso y decremento del contador
/// de intentos cuando el contador aplica.
const STAMP_TOKEN_USE: &str = r#"
    UPDATE tokens
    SET last_seen_at = now(),
        last_seen_remote_ip = $2,
        last_seen_user_agent = $3,
        remaining_attempts = CASE
            WHEN remaining_attempts IS NULL THEN NULL
            ELSE remaining_attempts - 1
        END
    WHERE id = $1
"#;

const SOFT_DELETE_TOKEN: &str = r#"
    UPDATE tokens SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL
"#;

/// Purga física de tokens vencidos; corre bajo el reaper.
const PURGE_EXPIRED_TOKENS: &str = r#"
    DELETE FROM tokens
    WHERE expires_at IS NOT NULL AND expires_at < now() - interval '7 days'
"#;

/// Razones de rechazo del consumo de un token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRejection {
    NotFound,
    Deleted,
    Expired,
    AttemptsExhausted,
    SecretMismatch,
}

pub struct TokenRepository {
    database_client: PostgresClient,
}

impl TokenRepository {
    pub fn new(database_client: PostgresClient) -> Self {
        Self { database_client }
    }

    /// Persiste un token recién forjado. El llamador conserva el
    /// secreto codificado; aquí solo viajan salt y digesto.
    #[instrument(skip(self, token))]
    pub async fn create_token(&self, token: &Token) -> Result<(), DbError> {
        let connection = self.database_client.get_connection().await?;
        connection
            .execute(
                INSERT_TOKEN,
                &[
                    &token.id,
                    &token.account_id,
                    &token.token_type.as_str(),
                    &token.secret_salt,
                    &token.secret_hash,
                    &token.expires_at,
                    &token.remaining_attempts,
                    &token.created_at,
                ],
            )
            .await?;

        info!("🎫 [TOKEN_FORGED]: Token {} ({}) persisted.", token.id, token.token_type.as_str());
        Ok(())
    }

    /// Verifica y consume un token presentado por un socket entrante.
    #[instrument(skip(self, presented_secret))]
    pub async fn use_token(
        &self,
        token_id: Uuid,
        presented_secret: &str,
        remote_ip: &str,
        user_agent: &str,
    ) -> Result<Result<Token, TokenRejection>, DbError> {
        let connection = self.database_client.get_connection().await?;

        let row = match connection.query_opt(SELECT_TOKEN_BY_ID, &[&token_id]).await? {
            Some(row) => row,
            None => return Ok(Err(TokenRejection::NotFound)),
        };
        let token = map_row_to_token(&row)?;

        let now = Utc::now();
        if token.deleted_at.is_some() {
            return Ok(Err(TokenRejection::Deleted));
        }
        if token.expires_at.is_some_and(|expires_at| expires_at <= now) {
            return Ok(Err(TokenRejection::Expired));
        }
        if token.remaining_attempts.is_some_and(|attempts| attempts <= 0) {
            return Ok(Err(TokenRejection::AttemptsExhausted));
        }
        if !token.verify_secret(presented_secret) {
            warn!("🛑 [TOKEN_REJECTED]: Secret mismatch for token {}.", token_id);
            return Ok(Err(TokenRejection::SecretMismatch));
        }

        connection
            .execute(STAMP_TOKEN_USE, &[&token_id, &remote_ip, &user_agent])
            .await?;

        debug!("🎫 [TOKEN_USED]: Token {} consumed from {}.", token_id, remote_ip);
        Ok(Ok(token))
    }

    pub async fn delete_token(&self, token_id: Uuid) -> Result<(), DbError> {
        let connection = self.database_client.get_connection().await?;
        connection.execute(SOFT_DELETE_TOKEN, &[&token_id]).await?;
        Ok(())
    }

    /// Purga de tokens vencidos hace más de una semana.
    #[instrument(skip(self))]
    pub async fn purge_expired_tokens(&self) -> Result<u64, DbError> {
        let connection = self.database_client.get_connection().await?;
        let purged_count = connection.execute(PURGE_EXPIRED_TOKENS, &[]).await?;

        if purged_count > 0 {
            info!("💀 [TOKEN_REAPER]: Purged {} expired tokens.", purged_count);
        }
        Ok(purged_count)
    }
}

fn map_row_to_token(row: &Row) -> Result<Token, DbError> {
    let token_type_raw: String = row.try_get("type")?;
    let token_type: TokenType = token_type_raw.parse().map_err(DbError::MappingError)?;

    Ok(Token {
        id: row.try_get("id")?,
        account_id: row.try_get("account_id")?,
        token_type,
        secret_salt: row.try_get("secret_salt")?,
        secret_hash: row.try_get("secret_hash")?,
        expires_at: row.try_get::<_, Option<DateTime<Utc>>>("expires_at")?,
        remaining_attempts: row.try_get("remaining_attempts")?,
        last_seen_at: row.try_get("last_seen_at")?,
        last_seen_remote_ip: row.try_get("last_seen_remote_ip")?,
        last_seen_user_agent: row.try_get("last_seen_user_agent")?,
        deleted_at: row.try_get("deleted_at")?,
        created_at: row.try_get("created_at")?,
    })
}
// FIN DEL ARCHIVO [libs/infra/db/src/repositories/token.rs]
