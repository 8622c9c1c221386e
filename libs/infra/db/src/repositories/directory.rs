// [libs/infra/db/src/repositories/directory.rs]
/*!
 * =================================================================
 * APARATO: DIRECTORY SYNC REPOSITORY (V12.0 - ATOMIC APPLY)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: ESTADO LOCAL DEL DIRECTORIO Y APLICACIÓN DEL PLAN
 *
 * # Mathematical Proof (Sync Atomicity):
 * La aplicación completa corre en UNA transacción con el orden fijo
 * sync_identities -> sync_groups -> sync_memberships ->
 * save_last_synced_at. Cualquier fallo revierte los cuatro pasos:
 * o la marca `last_synced_at` avanza con el plan íntegro aplicado,
 * o ninguna fila cambia.
 * =================================================================
 */

use serde_json::json;
use tokio_postgres::Transaction;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use cerberus_domain_models::{MembershipTuple, ProviderSyncPlan, Provider, RemoteGroup, RemoteUser};
use cerberus_domain_sync::{LocalGroup, LocalIdentity};

use crate::client::PostgresClient;
use crate::errors::DbError;
use crate::locks::reject_locked;
use crate::repositories::provider::queries::MARK_SYNC_SUCCEEDED;

// --- LECTURA DEL ESTADO LOCAL (ENTRADAS DEL PLANNER) ---

const SELECT_LOCAL_IDENTITIES: &str = r#"
    SELECT i.id, i.provider_identifier,
           i.provider_state->'userinfo'->>'email' AS email,
           a.name AS actor_name
    FROM auth_identities i
    JOIN actors a ON a.id = i.actor_id
    WHERE i.provider_id = $1 AND i.deleted_at IS NULL
"#;

const SELECT_LOCAL_GROUPS: &str = r#"
    SELECT id, provider_identifier, name
    FROM actor_groups
    WHERE provider_id = $1 AND deleted_at IS NULL AND provider_identifier IS NOT NULL
"#;

const SELECT_LOCAL_MEMBERSHIPS: &str = r#"
    SELECT g.provider_identifier AS group_identifier,
           i.provider_identifier AS actor_identifier
    FROM actor_group_memberships m
    JOIN actor_groups g ON g.id = m.group_id
    JOIN auth_identities i ON i.actor_id = m.actor_id AND i.provider_id = g.provider_id
    WHERE g.provider_id = $1 AND g.deleted_at IS NULL AND i.deleted_at IS NULL
"#;

// --- ESCRITURA DEL PLAN (DENTRO DE LA TRANSACCIÓN) ---

const INSERT_ACTOR: &str = r#"
    INSERT INTO actors (id, account_id, name, type)
    VALUES ($1, $2, $3, 'account_user')
"#;

/// Inserción de identidad con revival: si el asa ya existe viva, el
/// conflicto fusiona el documento preservando llaves ajenas y
/// actualizando únicamente userinfo.email.
const UPSERT_IDENTITY: &str = r#"
    INSERT INTO auth_identities
        (id, account_id, provider_id, provider_identifier, provider_state, actor_id, created_by)
    VALUES ($1, $2, $3, $4, $5, $6, 'provider')
    ON CONFLICT (account_id, provider_id, provider_identifier) WHERE deleted_at IS NULL
    DO UPDATE SET provider_state = auth_identities.provider_state
        || jsonb_build_object(
             'userinfo',
             COALESCE(auth_identities.provider_state->'userinfo', '{}'::jsonb)
               || jsonb_build_object('email', $7::text)
           )
"#;

const UPDATE_IDENTITY_EMAIL: &str = r#"
    UPDATE auth_identities
    SET provider_state = COALESCE(provider_state, '{}'::jsonb)
        || jsonb_build_object(
             'userinfo',
             COALESCE(provider_state->'userinfo', '{}'::jsonb)
               || jsonb_build_object('email', $3::text)
           )
    WHERE provider_id = $1 AND provider_identifier = $2 AND deleted_at IS NULL
"#;

const UPDATE_ACTOR_NAME: &str = r#"
    UPDATE actors
    SET name = $3
    FROM auth_identities i
    WHERE actors.id = i.actor_id
      AND i.provider_id = $1
      AND i.provider_identifier = $2
      AND i.deleted_at IS NULL
"#;

const SOFT_DELETE_IDENTITIES: &str = r#"
    UPDATE auth_identities
    SET deleted_at = now()
    WHERE id = ANY($1) AND deleted_at IS NULL
"#;

const UPSERT_GROUP: &str = r#"
    INSERT INTO actor_groups (id, account_id, provider_id, provider_identifier, name, created_by)
    VALUES ($1, $2, $3, $4, $5, 'provider')
    ON CONFLICT (account_id, provider_id, provider_identifier)
        WHERE deleted_at IS NULL AND provider_identifier IS NOT NULL
    DO UPDATE SET name = EXCLUDED.name
"#;

const DELETE_MEMBERSHIPS_OF_GROUPS: &str = r#"
    DELETE FROM actor_group_memberships WHERE group_id = ANY($1)
"#;

const SOFT_DELETE_GROUPS: &str = r#"
    UPDATE actor_groups
    SET deleted_at = now()
    WHERE id = ANY($1) AND deleted_at IS NULL
"#;

/// Resuelve la tupla de identificadores del proveedor a llaves locales
/// e inserta la membresía; idempotente ante replays.
const UPSERT_MEMBERSHIP: &str = r#"
    INSERT INTO actor_group_memberships (actor_id, group_id)
    SELECT i.actor_id, g.id
    FROM auth_identities i, actor_groups g
    WHERE i.provider_id = $1 AND i.provider_identifier = $3 AND i.deleted_at IS NULL
      AND g.provider_id = $1 AND g.provider_identifier = $2 AND g.deleted_at IS NULL
    ON CONFLICT DO NOTHING
"#;

const DELETE_MEMBERSHIP: &str = r#"
    DELETE FROM actor_group_memberships m
    USING auth_identities i, actor_groups g
    WHERE m.actor_id = i.actor_id AND m.group_id = g.id
      AND i.provider_id = $1 AND i.provider_identifier = $3
      AND g.provider_id = $1 AND g.provider_identifier = $2
"#;

pub struct DirectoryRepository {
    database_client: PostgresClient,
}

impl DirectoryRepository {
    pub fn new(database_client: PostgresClient) -> Self {
        Self { database_client }
    }

    /// Proyección local de identidades vivas del proveedor.
    #[instrument(skip(self))]
    pub async fn load_local_identities(&self, provider_id: Uuid) -> Result<Vec<LocalIdentity>, DbError> {
        let connection = self.database_client.get_connection().await?;
        let rows = connection.query(SELECT_LOCAL_IDENTITIES, &[&provider_id]).await?;

        rows.iter()
            .map(|row| {
                Ok(LocalIdentity {
                    id: row.try_get("id")?,
                    provider_identifier: row.try_get("provider_identifier")?,
                    email: row.try_get("email")?,
                    actor_name: row.try_get("actor_name")?,
                })
            })
            .collect()
    }

    #[instrument(skip(self))]
    pub async fn load_local_groups(&self, provider_id: Uuid) -> Result<Vec<LocalGroup>, DbError> {
        let connection = self.database_client.get_connection().await?;
        let rows = connection.query(SELECT_LOCAL_GROUPS, &[&provider_id]).await?;

        rows.iter()
            .map(|row| {
                Ok(LocalGroup {
                    id: row.try_get("id")?,
                    provider_identifier: row.try_get("provider_identifier")?,
                    name: row.try_get("name")?,
                })
            })
            .collect()
    }

    #[instrument(skip(self))]
    pub async fn load_local_memberships(&self, provider_id: Uuid) -> Result<Vec<MembershipTuple>, DbError> {
        let connection = self.database_client.get_connection().await?;
        let rows = connection.query(SELECT_LOCAL_MEMBERSHIPS, &[&provider_id]).await?;

        Ok(rows
            .iter()
            .map(|row| MembershipTuple {
                group_provider_identifier: row.get("group_identifier"),
                actor_provider_identifier: row.get("actor_identifier"),
            })
            .collect())
    }

    /// Aplica el plan completo en una transacción.
    ///
    /// El candado advisory sobre la fila del proveedor arbitra los
    /// reclamos entre nodos: si otro nodo está aplicando, esta corrida
    /// se aborta con `ClaimConflict` sin tocar datos.
    #[instrument(skip(self, plan), fields(provider_id = %provider.id))]
    pub async fn apply_sync_plan(
        &self,
        provider: &Provider,
        plan: &ProviderSyncPlan,
    ) -> Result<(), DbError> {
        let mut connection = self.database_client.get_connection().await?;
        let transaction = connection.transaction().await?;

        let claimed = reject_locked(&transaction, "auth_providers", &[provider.id]).await?;
        if claimed.is_empty() {
            return Err(DbError::ClaimConflict);
        }

        // Orden normativo: identidades -> grupos -> membresías -> marca.
        apply_identity_plan(&transaction, provider, plan).await?;
        apply_group_plan(&transaction, provider, plan).await?;
        apply_membership_plan(&transaction, provider, plan).await?;

        transaction.execute(MARK_SYNC_SUCCEEDED, &[&provider.id]).await?;
        transaction.commit().await?;

        info!("📦 [SYNC_APPLIED]: Provider {} leveled ({}).", provider.id, plan.summary());
        Ok(())
    }
}

async fn apply_identity_plan(
    transaction: &Transaction<'_>,
    provider: &Provider,
    plan: &ProviderSyncPlan,
) -> Result<(), DbError> {
    for remote_user in &plan.identities.insert {
        insert_identity(transaction, provider, remote_user).await?;
    }

    for remote_user in &plan.identities.update {
        transaction
            .execute(
                UPDATE_IDENTITY_EMAIL,
                &[&provider.id, &remote_user.provider_identifier, &remote_user.email],
            )
            .await?;
        transaction
            .execute(
                UPDATE_ACTOR_NAME,
                &[&provider.id, &remote_user.provider_identifier, &remote_user.actor_name],
            )
            .await?;
    }

    if !plan.identities.delete.is_empty() {
        transaction.execute(SOFT_DELETE_IDENTITIES, &[&plan.identities.delete]).await?;
    }

    debug!(
        "👥 [SYNC_IDENTITIES]: +{} ~{} -{}",
        plan.identities.insert.len(),
        plan.identities.update.len(),
        plan.identities.delete.len()
    );
    Ok(())
}

async fn insert_identity(
    transaction: &Transaction<'_>,
    provider: &Provider,
    remote_user: &RemoteUser,
) -> Result<(), DbError> {
    // Cada identidad nueva acuña su actor; los actores compartidos
    // entre proveedores se reconcilian fuera del motor de sincronía.
    let actor_id = Uuid::new_v4();
    transaction
        .execute(INSERT_ACTOR, &[&actor_id, &provider.account_id, &remote_user.actor_name])
        .await?;

    let identity_id = Uuid::new_v4();
    let provider_state = json!({ "userinfo": { "email": remote_user.email } });

    transaction
        .execute(
            UPSERT_IDENTITY,
            &[
                &identity_id,
                &provider.account_id,
                &provider.id,
                &remote_user.provider_identifier,
                &provider_state,
                &actor_id,
                &remote_user.email,
            ],
        )
        .await?;
    Ok(())
}

async fn apply_group_plan(
    transaction: &Transaction<'_>,
    provider: &Provider,
    plan: &ProviderSyncPlan,
) -> Result<(), DbError> {
    for remote_group in &plan.groups.upsert {
        upsert_group(transaction, provider, remote_group).await?;
    }

    if !plan.groups.delete.is_empty() {
        // Las membresías de un grupo retirado caen con él.
        transaction.execute(DELETE_MEMBERSHIPS_OF_GROUPS, &[&plan.groups.delete]).await?;
        transaction.execute(SOFT_DELETE_GROUPS, &[&plan.groups.delete]).await?;
    }

    debug!("🗂️  [SYNC_GROUPS]: +{} -{}", plan.groups.upsert.len(), plan.groups.delete.len());
    Ok(())
}

async fn upsert_group(
    transaction: &Transaction<'_>,
    provider: &Provider,
    remote_group: &RemoteGroup,
) -> Result<(), DbError> {
    let group_id = Uuid::new_v4();
    transaction
        .execute(
            UPSERT_GROUP,
            &[
                &group_id,
                &provider.account_id,
                &provider.id,
                &remote_group.provider_identifier,
                &remote_group.name,
            ],
        )
        .await?;
    Ok(())
}

async fn apply_membership_plan(
    transaction: &Transaction<'_>,
    provider: &Provider,
    plan: &ProviderSyncPlan,
) -> Result<(), DbError> {
    for tuple in &plan.memberships.upsert {
        transaction
            .execute(
                UPSERT_MEMBERSHIP,
                &[&provider.id, &tuple.group_provider_identifier, &tuple.actor_provider_identifier],
            )
            .await?;
    }

    for tuple in &plan.memberships.delete {
        transaction
            .execute(
                DELETE_MEMBERSHIP,
                &[&provider.id, &tuple.group_provider_identifier, &tuple.actor_provider_identifier],
            )
            .await?;
    }

    debug!(
        "🔗 [SYNC_MEMBERSHIPS]: +{} -{}",
        plan.memberships.upsert.len(),
        plan.memberships.delete.len()
    );
    Ok(())
}
// FIN DEL ARCHIVO [libs/infra/db/src/repositories/directory.rs]
