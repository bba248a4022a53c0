//! Ownership resolution up the entity chain.
//!
//! Every read/write against a Location or Checkpoint must prove the chain
//! terminates at the requesting user. Lookups return `None` both for rows
//! that do not exist and for rows owned by another tenant; handlers map
//! `None` to a generic NOT_FOUND so callers cannot probe for existence
//! across tenants. Inactive rows resolve as `None` for the same reason:
//! soft-deleted entities accept no new writes.

use sqlx::{Executor, Sqlite};

use crate::database::models::{Checkpoint, Location};

/// Resolve a location only if it is active and owned by `user_id`.
pub async fn location_owned<'e, E>(
    executor: E,
    location_id: &str,
    user_id: &str,
) -> Result<Option<Location>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Location>(
        "SELECT * FROM locations WHERE id = ? AND user_id = ? AND is_active = 1",
    )
    .bind(location_id)
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

/// Resolve a checkpoint only if it and its parent location are active and
/// the chain terminates at `user_id`.
pub async fn checkpoint_owned<'e, E>(
    executor: E,
    checkpoint_id: &str,
    user_id: &str,
) -> Result<Option<Checkpoint>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Checkpoint>(
        r#"
        SELECT c.*
        FROM checkpoints c
        INNER JOIN locations l ON c.location_id = l.id
        WHERE c.id = ? AND l.user_id = ? AND c.is_active = 1 AND l.is_active = 1
        "#,
    )
    .bind(checkpoint_id)
    .bind(user_id)
    .fetch_optional(executor)
    .await
}
