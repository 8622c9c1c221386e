// [libs/infra/db/src/repositories/provider/queries.rs]
/*!
 * =================================================================
 * APARATO: PROVIDER SQL QUERIES (V10.0 - SCHEDULER PHYSICS)
 * CLASIFICACIÓN: INFRASTRUCTURE SQL (ESTRATO L3)
 * RESPONSABILIDAD: PREDICADOS DEL SCHEDULER Y MÁQUINA DE ESTADOS SYNC
 * =================================================================
 */

/// Predicado `ready_to_be_synced` del scheduler de directorios.
///
/// # Physics:
/// 1. Solo el adaptador del scheduler llamador (un líder por adaptador).
/// 2. Backoff exponencial `10min·(fallos²+1)` con techo de 4 horas.
/// 3. Presupuesto duro: 10 fallos consecutivos expulsan del ciclo.
/// 4. `ASC NULLS FIRST`: los proveedores jamás sincronizados primero.
pub const SELECT_READY_TO_SYNC: &str = r#"
    SELECT id, account_id, name, adapter, provisioner, adapter_config, adapter_state,
           last_synced_at, last_syncs_failed, last_sync_error, sync_errored_at,
           sync_disabled_at, sync_error_emailed_at, is_disabled, disabled_reason,
           is_verified, disabled_at, deleted_at, created_at
    FROM auth_providers
    WHERE deleted_at IS NULL
      AND disabled_at IS NULL
      AND sync_disabled_at IS NULL
      AND is_disabled = FALSE
      AND adapter = $2
      AND (
            last_synced_at IS NULL
            OR last_synced_at + LEAST(
                 make_interval(mins => (10 * (COALESCE(last_syncs_failed, 0) * COALESCE(last_syncs_failed, 0) + 1))),
                 interval '4 hours'
               ) < now()
          )
      AND COALESCE(last_syncs_failed, 0) <= 10
    ORDER BY last_synced_at ASC NULLS FIRST
    LIMIT $1
"#;

/// Proveedores cuyo access token venció y portan refresh token.
pub const SELECT_NEEDING_REFRESH: &str = r#"
    SELECT id, account_id, name, adapter, provisioner, adapter_config, adapter_state,
           last_synced_at, last_syncs_failed, last_sync_error, sync_errored_at,
           sync_disabled_at, sync_error_emailed_at, is_disabled, disabled_reason,
           is_verified, disabled_at, deleted_at, created_at
    FROM auth_providers
    WHERE deleted_at IS NULL
      AND disabled_at IS NULL
      AND COALESCE(adapter_state->>'refresh_token', '') <> ''
      AND (adapter_state->>'expires_at') IS NOT NULL
      AND (adapter_state->>'expires_at')::timestamptz < now()
"#;

pub const SELECT_PROVIDER_BY_ID: &str = r#"
    SELECT id, account_id, name, adapter, provisioner, adapter_config, adapter_state,
           last_synced_at, last_syncs_failed, last_sync_error, sync_errored_at,
           sync_disabled_at, sync_error_emailed_at, is_disabled, disabled_reason,
           is_verified, disabled_at, deleted_at, created_at
    FROM auth_providers
    WHERE id = $1
"#;

/// Cierre exitoso de una corrida: avanza la marca y resetea la racha.
/// Corre DENTRO de la transacción del plan aplicado.
pub const MARK_SYNC_SUCCEEDED: &str = r#"
    UPDATE auth_providers
    SET last_synced_at = now(),
        last_syncs_failed = 0,
        last_sync_error = NULL,
        sync_errored_at = NULL
    WHERE id = $1
"#;

/// Registro de un fallo transitorio: incrementa la racha y fija la
/// primera marca de error si la racha comienza.
pub const RECORD_TRANSIENT_FAILURE: &str = r#"
    UPDATE auth_providers
    SET last_syncs_failed = COALESCE(last_syncs_failed, 0) + 1,
        last_sync_error = $2,
        sync_errored_at = COALESCE(sync_errored_at, now())
    WHERE id = $1
    RETURNING last_syncs_failed
"#;

/// Deshabilitación del directorio (error de cliente o escalamiento
/// de racha transitoria de 24 h).
pub const DISABLE_DIRECTORY: &str = r#"
    UPDATE auth_providers
    SET last_syncs_failed = COALESCE(last_syncs_failed, 0) + 1,
        last_sync_error = $2,
        sync_errored_at = COALESCE(sync_errored_at, now()),
        sync_disabled_at = now(),
        is_disabled = TRUE,
        disabled_reason = 'Sync error',
        is_verified = FALSE
    WHERE id = $1
    RETURNING last_syncs_failed
"#;

/// Rotación de credenciales: el refrescador solo toca adapter_state.
/// Los campos de sincronía son disjuntos por contrato (last-writer-wins
/// sobre columnas distintas).
pub const PERSIST_ROTATED_STATE: &str = r#"
    UPDATE auth_providers
    SET adapter_state = $2
    WHERE id = $1
"#;
// FIN DEL ARCHIVO [libs/infra/db/src/repositories/provider/queries.rs]
