//! Record routes: filtered listing, daily listing, single and bulk create.
//!
//! Single and bulk creation share `insert_one`, so a reading is validated,
//! ownership-checked, and classified identically regardless of the path.
//! Bulk runs the loop inside one transaction: the first invalid item aborts
//! the whole batch with nothing persisted.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::classify::{classify, TemperatureBand};
use crate::database::models::{DailyRecord, Record};
use crate::error::ApiError;
use crate::ids;
use crate::middleware::auth::CurrentUser;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::ownership;
use crate::state::AppState;

const LIST_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub location_id: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// GET /api/records - most recent readings first, capped at 100 rows.
/// Ownership is implicit in the join up to the user; records of inactive
/// checkpoints remain readable.
pub async fn record_list(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Value> {
    let mut builder = QueryBuilder::<Sqlite>::new(
        r#"
        SELECT r.* FROM records r
        INNER JOIN checkpoints cp ON r.checkpoint_id = cp.id
        INNER JOIN locations l ON cp.location_id = l.id
        WHERE l.user_id = "#,
    );
    builder.push_bind(&current.id);

    if let Some(location_id) = &query.location_id {
        builder.push(" AND l.id = ");
        builder.push_bind(location_id);
    }
    if let Some(start) = &query.start_date {
        builder.push(" AND r.recorded_at >= ");
        builder.push_bind(parse_date_bound(start, false)?);
    }
    if let Some(end) = &query.end_date {
        builder.push(" AND r.recorded_at <= ");
        builder.push_bind(parse_date_bound(end, true)?);
    }

    builder.push(" ORDER BY r.recorded_at DESC LIMIT ");
    builder.push_bind(LIST_LIMIT);

    let records: Vec<Record> = builder.build_query_as().fetch_all(&state.pool).await?;
    Ok(ApiResponse::success(json!({ "records": records })))
}

#[derive(Debug, Deserialize)]
pub struct DailyQuery {
    pub location_id: Option<String>,
}

/// GET /api/records/daily/:date - readings within the UTC day window
/// `[T00:00:00Z, T23:59:59Z]` inclusive, ascending, with checkpoint
/// metadata joined in for display.
pub async fn record_daily(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(date): Path<String>,
    Query(query): Query<DailyQuery>,
) -> ApiResult<Value> {
    let day = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
        .map_err(|_| ApiError::validation("date must be formatted YYYY-MM-DD"))?;
    let start = day.and_time(NaiveTime::MIN).and_utc();
    let end = start + Duration::seconds(86_399);

    let mut builder = QueryBuilder::<Sqlite>::new(
        r#"
        SELECT r.*, cp.name AS checkpoint_name, cp.checkpoint_type, cp.min_temp, cp.max_temp
        FROM records r
        INNER JOIN checkpoints cp ON r.checkpoint_id = cp.id
        INNER JOIN locations l ON cp.location_id = l.id
        WHERE l.user_id = "#,
    );
    builder.push_bind(&current.id);
    builder.push(" AND r.recorded_at >= ");
    builder.push_bind(start);
    builder.push(" AND r.recorded_at <= ");
    builder.push_bind(end);

    if let Some(location_id) = &query.location_id {
        builder.push(" AND l.id = ");
        builder.push_bind(location_id);
    }

    builder.push(" ORDER BY r.recorded_at ASC");

    let records: Vec<DailyRecord> = builder.build_query_as().fetch_all(&state.pool).await?;
    Ok(ApiResponse::success(json!({ "date": date, "records": records })))
}

#[derive(Debug, Deserialize)]
pub struct RecordPayload {
    pub checkpoint_id: Option<String>,
    pub temperature: Option<f64>,
    pub recorded_at: Option<String>,
    pub recorded_by: Option<String>,
    pub abnormal_action: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreatedRecord {
    id: String,
    checkpoint_id: String,
    is_abnormal: bool,
}

/// POST /api/records - single reading.
pub async fn record_create(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<RecordPayload>,
) -> ApiResult<Value> {
    let now = Utc::now();
    let mut conn = state.pool.acquire().await?;
    let created = insert_one(&mut *conn, &current.id, &body, now).await?;
    drop(conn);

    let record = sqlx::query_as::<_, Record>("SELECT * FROM records WHERE id = ?")
        .bind(&created.id)
        .fetch_one(&state.pool)
        .await?;

    Ok(ApiResponse::created(json!({
        "record": record,
        "is_abnormal": created.is_abnormal,
    })))
}

#[derive(Debug, Deserialize)]
pub struct BulkRequest {
    pub records: Option<Vec<RecordPayload>>,
}

/// POST /api/records/bulk - sequential, transactional, fail-fast.
pub async fn record_bulk(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<BulkRequest>,
) -> ApiResult<Value> {
    let items = body
        .records
        .filter(|records| !records.is_empty())
        .ok_or_else(|| ApiError::validation("records must be a non-empty array"))?;

    let now = Utc::now();
    let mut abnormal_count = 0usize;
    let mut created = Vec::with_capacity(items.len());

    // Dropping the transaction on the error path rolls everything back, so
    // a batch with any invalid item persists zero records.
    let mut tx = state.pool.begin().await?;
    for item in &items {
        let record = insert_one(&mut *tx, &current.id, item, now).await?;
        if record.is_abnormal {
            abnormal_count += 1;
        }
        created.push(record);
    }
    tx.commit().await?;

    Ok(ApiResponse::created(json!({
        "recorded_count": created.len(),
        "abnormal_count": abnormal_count,
        "records": created,
    })))
}

/// Validate, ownership-check, classify, and insert one reading. Shared by
/// the single and bulk paths; any failure happens before the row is
/// written.
async fn insert_one(
    conn: &mut SqliteConnection,
    user_id: &str,
    item: &RecordPayload,
    now: DateTime<Utc>,
) -> Result<CreatedRecord, ApiError> {
    let checkpoint_id = item
        .checkpoint_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::validation("checkpoint_id is required"))?;
    let temperature = item
        .temperature
        .ok_or_else(|| ApiError::validation("temperature is required"))?;

    let checkpoint = ownership::checkpoint_owned(&mut *conn, checkpoint_id, user_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Checkpoint not found: {checkpoint_id}")))?;

    let band = TemperatureBand::from(&checkpoint);
    let is_abnormal = classify(temperature, &band);

    if is_abnormal
        && item
            .abnormal_action
            .as_deref()
            .map_or(true, |action| action.trim().is_empty())
    {
        return Err(ApiError::validation(format!(
            "abnormal_action is required for an abnormal reading at checkpoint {checkpoint_id}"
        )));
    }

    let recorded_at = match &item.recorded_at {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| ApiError::validation("recorded_at must be an RFC 3339 timestamp"))?,
        None => now,
    };

    let id = ids::record_id();
    sqlx::query(
        r#"
        INSERT INTO records (id, checkpoint_id, temperature, recorded_at, recorded_by, is_abnormal, abnormal_action, notes, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(checkpoint_id)
    .bind(temperature)
    .bind(recorded_at)
    .bind(&item.recorded_by)
    .bind(is_abnormal)
    .bind(&item.abnormal_action)
    .bind(&item.notes)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(CreatedRecord {
        id,
        checkpoint_id: checkpoint_id.to_string(),
        is_abnormal,
    })
}

fn parse_date_bound(raw: &str, end_of_day: bool) -> Result<DateTime<Utc>, ApiError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let start = day.and_time(NaiveTime::MIN).and_utc();
        return Ok(if end_of_day {
            start + Duration::seconds(86_399)
        } else {
            start
        });
    }
    Err(ApiError::validation(
        "start_date and end_date must be YYYY-MM-DD or RFC 3339 timestamps",
    ))
}
