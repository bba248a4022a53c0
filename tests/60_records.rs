mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::{json, Value};

/// Register and hand back the token plus the seeded refrigerator checkpoint
/// (band 0..10) most of these tests record against.
async fn setup(app: &axum::Router) -> Result<(String, String)> {
    let data = common::register(app, "alice").await?;
    let checkpoint_id = data["checkpoints"][0]["id"].as_str().unwrap().to_string();
    Ok((common::token_for("alice"), checkpoint_id))
}

fn temperatures(records: &Value) -> Vec<f64> {
    records
        .as_array()
        .expect("records array")
        .iter()
        .map(|r| r["temperature"].as_f64().unwrap())
        .collect()
}

async fn record_count(pool: &sqlx::SqlitePool) -> Result<i64> {
    let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM records")
        .fetch_one(pool)
        .await?;
    Ok(n)
}

#[tokio::test]
async fn in_band_reading_is_normal() -> Result<()> {
    let (app, _pool) = common::test_app().await?;
    let (token, checkpoint_id) = setup(&app).await?;

    let (status, body) = common::request(
        &app,
        "POST",
        "/api/records",
        Some(&token),
        Some(json!({
            "checkpoint_id": checkpoint_id,
            "temperature": 5.0,
            "recorded_by": "morning shift",
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["is_abnormal"], false);
    assert_eq!(body["data"]["record"]["temperature"], 5.0);
    assert_eq!(body["data"]["record"]["recorded_by"], "morning shift");
    Ok(())
}

#[tokio::test]
async fn boundary_readings_are_normal() -> Result<()> {
    let (app, _pool) = common::test_app().await?;
    let (token, checkpoint_id) = setup(&app).await?;

    for temperature in [0.0, 10.0] {
        let (status, body) = common::request(
            &app,
            "POST",
            "/api/records",
            Some(&token),
            Some(json!({ "checkpoint_id": checkpoint_id, "temperature": temperature })),
        )
        .await?;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["is_abnormal"], false, "t={temperature}");
    }
    Ok(())
}

#[tokio::test]
async fn out_of_band_reading_needs_an_action() -> Result<()> {
    let (app, pool) = common::test_app().await?;
    let (token, checkpoint_id) = setup(&app).await?;

    // Without an action: rejected, nothing persisted.
    let (status, body) = common::request(
        &app,
        "POST",
        "/api/records",
        Some(&token),
        Some(json!({ "checkpoint_id": checkpoint_id, "temperature": 15.0 })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(common::error_code(&body), "VALIDATION_ERROR");
    assert_eq!(record_count(&pool).await?, 0);

    // A whitespace-only action does not count.
    let (status, _) = common::request(
        &app,
        "POST",
        "/api/records",
        Some(&token),
        Some(json!({
            "checkpoint_id": checkpoint_id,
            "temperature": 15.0,
            "abnormal_action": "   ",
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(record_count(&pool).await?, 0);

    // With one: recorded and flagged.
    let (status, body) = common::request(
        &app,
        "POST",
        "/api/records",
        Some(&token),
        Some(json!({
            "checkpoint_id": checkpoint_id,
            "temperature": 15.0,
            "abnormal_action": "Moved stock to backup fridge",
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["is_abnormal"], true);
    assert_eq!(body["data"]["record"]["is_abnormal"], true);
    assert_eq!(record_count(&pool).await?, 1);
    Ok(())
}

#[tokio::test]
async fn foreign_checkpoint_reading_is_not_found() -> Result<()> {
    let (app, pool) = common::test_app().await?;
    let alice = common::register(&app, "alice").await?;
    common::register(&app, "bob").await?;
    let alice_checkpoint = alice["checkpoints"][0]["id"].as_str().unwrap();

    let bob_token = common::token_for("bob");
    let (status, body) = common::request(
        &app,
        "POST",
        "/api/records",
        Some(&bob_token),
        Some(json!({ "checkpoint_id": alice_checkpoint, "temperature": 5.0 })),
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(common::error_code(&body), "NOT_FOUND");
    assert_eq!(record_count(&pool).await?, 0);
    Ok(())
}

#[tokio::test]
async fn bulk_create_is_all_or_nothing() -> Result<()> {
    let (app, pool) = common::test_app().await?;
    let (token, checkpoint_id) = setup(&app).await?;

    // Second item is abnormal with no action, so the whole batch fails.
    let (status, body) = common::request(
        &app,
        "POST",
        "/api/records/bulk",
        Some(&token),
        Some(json!({
            "records": [
                { "checkpoint_id": checkpoint_id, "temperature": 5.0 },
                { "checkpoint_id": checkpoint_id, "temperature": 20.0 },
            ]
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(common::error_code(&body), "VALIDATION_ERROR");
    assert_eq!(record_count(&pool).await?, 0);

    // All valid: both land, abnormal one is counted.
    let (status, body) = common::request(
        &app,
        "POST",
        "/api/records/bulk",
        Some(&token),
        Some(json!({
            "records": [
                { "checkpoint_id": checkpoint_id, "temperature": 5.0 },
                {
                    "checkpoint_id": checkpoint_id,
                    "temperature": 20.0,
                    "abnormal_action": "Called maintenance",
                },
            ]
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["recorded_count"], 2);
    assert_eq!(body["data"]["abnormal_count"], 1);
    assert_eq!(body["data"]["records"].as_array().unwrap().len(), 2);
    assert_eq!(record_count(&pool).await?, 2);
    Ok(())
}

#[tokio::test]
async fn bulk_create_rejects_an_empty_batch() -> Result<()> {
    let (app, _pool) = common::test_app().await?;
    let (token, _) = setup(&app).await?;

    for body in [json!({}), json!({ "records": [] })] {
        let (status, response) = common::request(
            &app,
            "POST",
            "/api/records/bulk",
            Some(&token),
            Some(body),
        )
        .await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(common::error_code(&response), "VALIDATION_ERROR");
    }
    Ok(())
}

#[tokio::test]
async fn list_returns_newest_first_and_honors_date_filters() -> Result<()> {
    let (app, _pool) = common::test_app().await?;
    let (token, checkpoint_id) = setup(&app).await?;

    for (temperature, recorded_at) in [
        (1.0, "2024-03-01T08:00:00Z"),
        (2.0, "2024-03-02T08:00:00Z"),
        (3.0, "2024-03-03T08:00:00Z"),
    ] {
        let (status, _) = common::request(
            &app,
            "POST",
            "/api/records",
            Some(&token),
            Some(json!({
                "checkpoint_id": checkpoint_id,
                "temperature": temperature,
                "recorded_at": recorded_at,
            })),
        )
        .await?;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = common::request(&app, "GET", "/api/records", Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);
    let temps = temperatures(&body["data"]["records"]);
    assert_eq!(temps, vec![3.0, 2.0, 1.0]);

    let (status, body) = common::request(
        &app,
        "GET",
        "/api/records?start_date=2024-03-02&end_date=2024-03-02",
        Some(&token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(temperatures(&body["data"]["records"]), vec![2.0]);

    // A foreign or unknown location filter yields nothing rather than an error.
    let (status, body) = common::request(
        &app,
        "GET",
        "/api/records?location_id=loc_unknown",
        Some(&token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["records"].as_array().unwrap().is_empty());
    Ok(())
}

#[tokio::test]
async fn list_is_capped_at_one_hundred_rows() -> Result<()> {
    let (app, pool) = common::test_app().await?;
    let (token, checkpoint_id) = setup(&app).await?;

    // 101 readings, one minute apart, in a single batch.
    let items: Vec<Value> = (0..101)
        .map(|i| {
            json!({
                "checkpoint_id": checkpoint_id,
                "temperature": 5.0,
                "recorded_at": format!("2024-06-01T{:02}:{:02}:00Z", i / 60, i % 60),
            })
        })
        .collect();
    let (status, body) = common::request(
        &app,
        "POST",
        "/api/records/bulk",
        Some(&token),
        Some(json!({ "records": items })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["recorded_count"], 101);
    assert_eq!(record_count(&pool).await?, 101);

    // Exactly 100 back, newest first; the oldest reading falls off.
    let (status, body) = common::request(&app, "GET", "/api/records", Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);
    let records = body["data"]["records"].as_array().unwrap();
    assert_eq!(records.len(), 100);
    let newest = records[0]["recorded_at"].as_str().unwrap();
    assert!(newest.starts_with("2024-06-01T01:40:00"), "newest {newest}");
    let oldest = records[99]["recorded_at"].as_str().unwrap();
    assert!(oldest.starts_with("2024-06-01T00:01:00"), "oldest {oldest}");
    Ok(())
}

#[tokio::test]
async fn deleted_checkpoint_history_stays_readable() -> Result<()> {
    let (app, _pool) = common::test_app().await?;
    let (token, checkpoint_id) = setup(&app).await?;

    let (status, _) = common::request(
        &app,
        "POST",
        "/api/records",
        Some(&token),
        Some(json!({
            "checkpoint_id": checkpoint_id,
            "temperature": 5.0,
            "recorded_at": "2024-07-01T12:00:00Z",
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = common::request(
        &app,
        "DELETE",
        &format!("/api/checkpoints/{checkpoint_id}"),
        Some(&token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);

    // The reading survives in both views.
    let (status, body) = common::request(&app, "GET", "/api/records", Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(temperatures(&body["data"]["records"]), vec![5.0]);

    let (status, body) = common::request(
        &app,
        "GET",
        "/api/records/daily/2024-07-01",
        Some(&token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    let records = body["data"]["records"].as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["checkpoint_name"], "Refrigerator A");

    // But the checkpoint accepts no new readings.
    let (status, body) = common::request(
        &app,
        "POST",
        "/api/records",
        Some(&token),
        Some(json!({ "checkpoint_id": checkpoint_id, "temperature": 5.0 })),
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(common::error_code(&body), "NOT_FOUND");
    Ok(())
}

#[tokio::test]
async fn daily_listing_covers_the_whole_utc_day_inclusive() -> Result<()> {
    let (app, _pool) = common::test_app().await?;
    let (token, checkpoint_id) = setup(&app).await?;

    for (temperature, recorded_at) in [
        (1.0, "2024-01-14T23:59:59Z"),
        (2.0, "2024-01-15T00:00:00Z"),
        (3.0, "2024-01-15T23:59:59Z"),
        (4.0, "2024-01-16T00:00:00Z"),
    ] {
        let (status, _) = common::request(
            &app,
            "POST",
            "/api/records",
            Some(&token),
            Some(json!({
                "checkpoint_id": checkpoint_id,
                "temperature": temperature,
                "recorded_at": recorded_at,
            })),
        )
        .await?;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = common::request(
        &app,
        "GET",
        "/api/records/daily/2024-01-15",
        Some(&token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["date"], "2024-01-15");

    // Both boundary readings, oldest first, with checkpoint metadata joined.
    let records = body["data"]["records"].as_array().unwrap();
    assert_eq!(temperatures(&body["data"]["records"]), vec![2.0, 3.0]);
    assert_eq!(records[0]["checkpoint_name"], "Refrigerator A");
    assert_eq!(records[0]["checkpoint_type"], "refrigerator");
    Ok(())
}

#[tokio::test]
async fn daily_listing_rejects_malformed_dates() -> Result<()> {
    let (app, _pool) = common::test_app().await?;
    let (token, _) = setup(&app).await?;

    for date in ["2024-13-40", "yesterday", "20240115"] {
        let (status, body) = common::request(
            &app,
            "GET",
            &format!("/api/records/daily/{date}"),
            Some(&token),
            None,
        )
        .await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "date {date}");
        assert_eq!(common::error_code(&body), "VALIDATION_ERROR");
    }
    Ok(())
}

#[tokio::test]
async fn records_per_day_are_not_quota_limited() -> Result<()> {
    let (app, _pool) = common::test_app().await?;
    let (token, checkpoint_id) = setup(&app).await?;

    // Free plan; far more readings in one day than any limit would allow.
    for i in 0..12 {
        let (status, _) = common::request(
            &app,
            "POST",
            "/api/records",
            Some(&token),
            Some(json!({
                "checkpoint_id": checkpoint_id,
                "temperature": 5.0,
                "recorded_at": format!("2024-05-01T{i:02}:00:00Z"),
            })),
        )
        .await?;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = common::request(
        &app,
        "GET",
        "/api/records/daily/2024-05-01",
        Some(&token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["records"].as_array().unwrap().len(), 12);
    Ok(())
}

#[tokio::test]
async fn record_create_rejects_bad_input() -> Result<()> {
    let (app, _pool) = common::test_app().await?;
    let (token, checkpoint_id) = setup(&app).await?;

    let cases = [
        json!({ "temperature": 5.0 }),
        json!({ "checkpoint_id": checkpoint_id }),
        json!({
            "checkpoint_id": checkpoint_id,
            "temperature": 5.0,
            "recorded_at": "last tuesday",
        }),
    ];
    for body in cases {
        let (status, response) =
            common::request(&app, "POST", "/api/records", Some(&token), Some(body)).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(common::error_code(&response), "VALIDATION_ERROR");
    }
    Ok(())
}
