//! Append-only trail of every operator-visible transition.

use serde_json::Value;
use sqlx::{Postgres, Transaction};

pub async fn append(
    tx: &mut Transaction<'_, Postgres>,
    actor: &str,
    action: &str,
    object_type: &str,
    object_id: &str,
    notes: Option<&str>,
    after_json: &Value,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO audit_log (actor, action, object_type, object_id, notes, after_json)
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(actor)
    .bind(action)
    .bind(object_type)
    .bind(object_id)
    .bind(notes)
    .bind(after_json)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
