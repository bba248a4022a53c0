use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::info;

pub mod models;

/// Schema statements applied idempotently at startup. The store is a single
/// embedded SQLite database; soft-deleted rows keep their foreign keys
/// resolvable, so `is_active` filtering happens in queries, not here.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id            TEXT PRIMARY KEY,
        firebase_uid  TEXT NOT NULL UNIQUE,
        email         TEXT NOT NULL,
        display_name  TEXT,
        business_name TEXT,
        business_type TEXT,
        plan          TEXT NOT NULL DEFAULT 'free',
        created_at    TEXT NOT NULL,
        updated_at    TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS locations (
        id         TEXT PRIMARY KEY,
        user_id    TEXT NOT NULL REFERENCES users(id),
        name       TEXT NOT NULL,
        address    TEXT,
        is_active  INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS checkpoints (
        id              TEXT PRIMARY KEY,
        location_id     TEXT NOT NULL REFERENCES locations(id),
        name            TEXT NOT NULL,
        checkpoint_type TEXT NOT NULL,
        min_temp        REAL,
        max_temp        REAL,
        sort_order      INTEGER NOT NULL DEFAULT 0,
        is_active       INTEGER NOT NULL DEFAULT 1,
        created_at      TEXT NOT NULL,
        updated_at      TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS records (
        id              TEXT PRIMARY KEY,
        checkpoint_id   TEXT NOT NULL REFERENCES checkpoints(id),
        temperature     REAL NOT NULL,
        recorded_at     TEXT NOT NULL,
        recorded_by     TEXT,
        is_abnormal     INTEGER NOT NULL DEFAULT 0,
        abnormal_action TEXT,
        notes           TEXT,
        created_at      TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_locations_user ON locations(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_checkpoints_location ON checkpoints(location_id)",
    "CREATE INDEX IF NOT EXISTS idx_records_checkpoint ON records(checkpoint_id)",
    "CREATE INDEX IF NOT EXISTS idx_records_recorded_at ON records(recorded_at)",
];

/// Open (creating if missing) the SQLite database behind `url`.
pub async fn connect(url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    info!("opened database pool for {}", url);
    Ok(pool)
}

/// Apply the embedded schema. Safe to run on every startup.
pub async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}
