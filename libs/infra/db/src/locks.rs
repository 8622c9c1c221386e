// [libs/infra/db/src/locks.rs]
/*!
 * =================================================================
 * APARATO: ADVISORY ROW CLAIM HELPER (V5.0 - XACT SCOPED)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: RECLAMO DE FILAS ENTRE NODOS VÍA pg_try_advisory_xact_lock
 *
 * Contrato:
 * - El llamador DEBE estar dentro de una transacción: los candados son
 *   de alcance transaccional y se liberan en commit/rollback.
 * - La llave del candado es el par (oid(tabla), hash32(fila.id)); dos
 *   nodos que disputan la misma fila observan la misma llave.
 * - Devuelve únicamente las filas cuyo candado se adquirió.
 * =================================================================
 */

use tokio_postgres::Transaction;
use tracing::debug;
use uuid::Uuid;

use crate::errors::DbError;

/// Filtra `rows` a las filas reclamables por esta transacción.
pub async fn reject_locked(
    transaction: &Transaction<'_>,
    table: &str,
    rows: &[Uuid],
) -> Result<Vec<Uuid>, DbError> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    // Oid de la relación como int4: el primer componente de la llave.
    let oid_row = transaction
        .query_one("SELECT $1::text::regclass::oid::int4", &[&table])
        .await?;
    let table_oid: i32 = oid_row.get(0);

    let mut claimed_rows = Vec::with_capacity(rows.len());

    for row_identifier in rows {
        let row_key = hash32(row_identifier);
        let lock_row = transaction
            .query_one("SELECT pg_try_advisory_xact_lock($1, $2)", &[&table_oid, &row_key])
            .await?;
        let lock_acquired: bool = lock_row.get(0);

        if lock_acquired {
            claimed_rows.push(*row_identifier);
        } else {
            debug!("🔒 [ROW_CLAIM]: Row {} of '{}' already claimed by a peer.", row_identifier, table);
        }
    }

    Ok(claimed_rows)
}

/// FNV-1a de 32 bits sobre los octetos del uuid, reinterpretado como
/// int4 para el segundo componente de la llave advisory.
fn hash32(row_identifier: &Uuid) -> i32 {
    const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
    const FNV_PRIME: u32 = 0x0100_0193;

    let mut digest = FNV_OFFSET_BASIS;
    for octet in row_identifier.as_bytes() {
        digest ^= u32::from(*octet);
        digest = digest.wrapping_mul(FNV_PRIME);
    }
    digest as i32
}
// FIN DEL ARCHIVO [libs/infra/db/src/locks.rs]
