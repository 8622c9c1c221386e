// [libs/infra/db/src/schema.rs]
/*!
 * =================================================================
 * APARATO: CONTROL PLANE DATABASE SCHEMA (V11.0 - IDEMPOTENT)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: GOBERNANZA ESTRUCTURAL E IDEMPOTENCIA TOTAL
 *
 * VISION HIPER-HOLÍSTICA:
 * 1. TENANT OWNERSHIP: toda tabla de dominio cuelga de accounts.
 * 2. SYNC LEDGER: auth_providers porta el estado completo del
 *    scheduler (fallos, errores, deshabilitación, verificación).
 * 3. REPLICATION READY: las tablas publicadas por el bus de eventos
 *    viven aquí; la publicación y el slot los gobierna el consumidor.
 * =================================================================
 */

use tokio_postgres::Client;
use tracing::{debug, info, instrument};

use crate::errors::DbError;

/// ESTRATO 1: SOLIDIFICACIÓN (Génesis de Tablas)
const CONTROL_PLANE_TABLES: &[(&str, &str)] = &[
    ("TABLE_ACCOUNTS", r#"
        CREATE TABLE IF NOT EXISTS accounts (
            id UUID PRIMARY KEY,
            legal_name TEXT NOT NULL,
            disabled_at TIMESTAMPTZ,
            features JSONB NOT NULL DEFAULT '{}'::jsonb,
            limits JSONB NOT NULL DEFAULT '{}'::jsonb,
            metadata JSONB NOT NULL DEFAULT '{}'::jsonb,
            warning TEXT,
            warning_last_sent_at TIMESTAMPTZ,
            config JSONB NOT NULL DEFAULT '{}'::jsonb,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        );
    "#),
    ("TABLE_AUTH_PROVIDERS", r#"
        CREATE TABLE IF NOT EXISTS auth_providers (
            id UUID PRIMARY KEY,
            account_id UUID NOT NULL REFERENCES accounts(id),
            name TEXT NOT NULL,
            adapter TEXT NOT NULL,
            provisioner TEXT NOT NULL DEFAULT 'manual',
            adapter_config JSONB NOT NULL DEFAULT '{}'::jsonb,
            adapter_state JSONB NOT NULL DEFAULT '{}'::jsonb,
            last_synced_at TIMESTAMPTZ,
            last_syncs_failed INTEGER NOT NULL DEFAULT 0,
            last_sync_error TEXT,
            sync_errored_at TIMESTAMPTZ,
            sync_disabled_at TIMESTAMPTZ,
            sync_error_emailed_at TIMESTAMPTZ,
            is_disabled BOOLEAN NOT NULL DEFAULT FALSE,
            disabled_reason TEXT,
            is_verified BOOLEAN NOT NULL DEFAULT TRUE,
            disabled_at TIMESTAMPTZ,
            deleted_at TIMESTAMPTZ,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        );
    "#),
    ("TABLE_ACTORS", r#"
        CREATE TABLE IF NOT EXISTS actors (
            id UUID PRIMARY KEY,
            account_id UUID NOT NULL REFERENCES accounts(id),
            name TEXT NOT NULL,
            type TEXT NOT NULL DEFAULT 'account_user',
            disabled_at TIMESTAMPTZ,
            deleted_at TIMESTAMPTZ,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        );
    "#),
    ("TABLE_AUTH_IDENTITIES", r#"
        CREATE TABLE IF NOT EXISTS auth_identities (
            id UUID PRIMARY KEY,
            account_id UUID NOT NULL REFERENCES accounts(id),
            provider_id UUID NOT NULL REFERENCES auth_providers(id),
            provider_identifier TEXT NOT NULL,
            provider_state JSONB NOT NULL DEFAULT '{}'::jsonb,
            actor_id UUID NOT NULL REFERENCES actors(id),
            created_by TEXT NOT NULL DEFAULT 'provider',
            deleted_at TIMESTAMPTZ,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        );
    "#),
    ("TABLE_ACTOR_GROUPS", r#"
        CREATE TABLE IF NOT EXISTS actor_groups (
            id UUID PRIMARY KEY,
            account_id UUID NOT NULL REFERENCES accounts(id),
            provider_id UUID REFERENCES auth_providers(id),
            provider_identifier TEXT,
            name TEXT NOT NULL,
            created_by TEXT NOT NULL DEFAULT 'provider',
            deleted_at TIMESTAMPTZ,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        );
    "#),
    ("TABLE_ACTOR_GROUP_MEMBERSHIPS", r#"
        CREATE TABLE IF NOT EXISTS actor_group_memberships (
            actor_id UUID NOT NULL REFERENCES actors(id),
            group_id UUID NOT NULL REFERENCES actor_groups(id),
            PRIMARY KEY (actor_id, group_id)
        );
    "#),
    ("TABLE_TOKENS", r#"
        CREATE TABLE IF NOT EXISTS tokens (
            id UUID PRIMARY KEY,
            account_id UUID REFERENCES accounts(id),
            type TEXT NOT NULL,
            secret_salt TEXT NOT NULL,
            secret_hash TEXT NOT NULL,
            expires_at TIMESTAMPTZ,
            remaining_attempts INTEGER,
            last_seen_at TIMESTAMPTZ,
            last_seen_remote_ip TEXT,
            last_seen_user_agent TEXT,
            deleted_at TIMESTAMPTZ,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        );
    "#),
    ("TABLE_GATEWAY_GROUPS", r#"
        CREATE TABLE IF NOT EXISTS gateway_groups (
            id UUID PRIMARY KEY,
            account_id UUID NOT NULL REFERENCES accounts(id),
            name TEXT NOT NULL,
            deleted_at TIMESTAMPTZ,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        );
    "#),
    ("TABLE_GATEWAYS", r#"
        CREATE TABLE IF NOT EXISTS gateways (
            id UUID PRIMARY KEY,
            account_id UUID NOT NULL REFERENCES accounts(id),
            group_id UUID NOT NULL REFERENCES gateway_groups(id),
            name TEXT NOT NULL,
            last_seen_version TEXT,
            last_seen_at TIMESTAMPTZ,
            deleted_at TIMESTAMPTZ,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        );
    "#),
    ("TABLE_RELAYS", r#"
        CREATE TABLE IF NOT EXISTS relays (
            id UUID PRIMARY KEY,
            account_id UUID REFERENCES accounts(id),
            ipv4 INET,
            ipv6 INET,
            port INTEGER NOT NULL DEFAULT 3478,
            lat DOUBLE PRECISION,
            lon DOUBLE PRECISION,
            last_seen_version TEXT,
            last_seen_at TIMESTAMPTZ,
            deleted_at TIMESTAMPTZ,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        );
    "#),
    ("TABLE_CLIENTS", r#"
        CREATE TABLE IF NOT EXISTS clients (
            id UUID PRIMARY KEY,
            account_id UUID NOT NULL REFERENCES accounts(id),
            actor_id UUID NOT NULL REFERENCES actors(id),
            name TEXT NOT NULL,
            last_seen_version TEXT,
            last_seen_at TIMESTAMPTZ,
            deleted_at TIMESTAMPTZ,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        );
    "#),
    ("TABLE_RESOURCES", r#"
        CREATE TABLE IF NOT EXISTS resources (
            id UUID PRIMARY KEY,
            account_id UUID NOT NULL REFERENCES accounts(id),
            name TEXT NOT NULL,
            address TEXT,
            deleted_at TIMESTAMPTZ,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        );
    "#),
    ("TABLE_RESOURCE_CONNECTIONS", r#"
        CREATE TABLE IF NOT EXISTS resource_connections (
            resource_id UUID NOT NULL REFERENCES resources(id),
            gateway_group_id UUID NOT NULL REFERENCES gateway_groups(id),
            PRIMARY KEY (resource_id, gateway_group_id)
        );
    "#),
    ("TABLE_POLICIES", r#"
        CREATE TABLE IF NOT EXISTS policies (
            id UUID PRIMARY KEY,
            account_id UUID NOT NULL REFERENCES accounts(id),
            actor_group_id UUID NOT NULL REFERENCES actor_groups(id),
            resource_id UUID NOT NULL REFERENCES resources(id),
            disabled_at TIMESTAMPTZ,
            deleted_at TIMESTAMPTZ,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        );
    "#),
    ("TABLE_LEADERSHIP", r#"
        CREATE TABLE IF NOT EXISTS leadership (
            job_key TEXT PRIMARY KEY,
            holder_id UUID NOT NULL,
            lease_until TIMESTAMPTZ NOT NULL
        );
    "#),
    ("TABLE_CONFIGS", r#"
        CREATE TABLE IF NOT EXISTS configs (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        );
    "#),
];

/// ESTRATO 2: ACELERACIÓN (Índices y Unicidad)
const CONTROL_PLANE_INDEXES: &[(&str, &str)] = &[
    // Unicidad del asa externa entre identidades vivas.
    ("IDX_IDENTITIES_PROVIDER_IDENTIFIER", r#"
        CREATE UNIQUE INDEX IF NOT EXISTS auth_identities_account_provider_identifier_idx
        ON auth_identities (account_id, provider_id, provider_identifier)
        WHERE deleted_at IS NULL;
    "#),
    // Un adaptador OIDC-like no-borrado por cuenta.
    ("IDX_PROVIDERS_ACCOUNT_ADAPTER", r#"
        CREATE UNIQUE INDEX IF NOT EXISTS auth_providers_account_adapter_idx
        ON auth_providers (account_id, adapter)
        WHERE deleted_at IS NULL AND adapter NOT IN ('email', 'userpass');
    "#),
    ("IDX_GROUPS_PROVIDER_IDENTIFIER", r#"
        CREATE UNIQUE INDEX IF NOT EXISTS actor_groups_provider_identifier_idx
        ON actor_groups (account_id, provider_id, provider_identifier)
        WHERE deleted_at IS NULL AND provider_identifier IS NOT NULL;
    "#),
    // Aceleración del predicado ready_to_be_synced del scheduler.
    ("IDX_PROVIDERS_SYNC_SCHEDULING", r#"
        CREATE INDEX IF NOT EXISTS auth_providers_sync_scheduling_idx
        ON auth_providers (last_synced_at ASC NULLS FIRST)
        WHERE deleted_at IS NULL AND disabled_at IS NULL AND sync_disabled_at IS NULL;
    "#),
    ("IDX_TOKENS_EXPIRY", r#"
        CREATE INDEX IF NOT EXISTS tokens_expires_at_idx
        ON tokens (expires_at)
        WHERE deleted_at IS NULL;
    "#),
];

/// Aplica el esquema completo de forma idempotente.
#[instrument(skip(database_connection))]
pub async fn apply_control_plane_schema(database_connection: &Client) -> Result<(), DbError> {
    info!("🏗️  [SCHEMA]: Leveling control plane strata ({} tables).", CONTROL_PLANE_TABLES.len());

    for (artifact_name, create_statement) in CONTROL_PLANE_TABLES {
        database_connection.batch_execute(create_statement).await?;
        debug!("🏗️  [SCHEMA]: {} solidified.", artifact_name);
    }

    for (artifact_name, index_statement) in CONTROL_PLANE_INDEXES {
        database_connection.batch_execute(index_statement).await?;
        debug!("🏗️  [SCHEMA]: {} armed.", artifact_name);
    }

    info!("✅ [SCHEMA]: Structural audit completed with zero drift.");
    Ok(())
}
// FIN DEL ARCHIVO [libs/infra/db/src/schema.rs]
