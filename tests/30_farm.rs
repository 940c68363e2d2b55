mod common;

use anyhow::Result;
use common::Api;
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};

async fn field(api: &Api, name: &str) -> Result<String> {
    let res = api
        .post(
            "/api/fields",
            json!({
                "name": name,
                "latitude": 30.901,
                "longitude": 75.857,
                "area": "4.0",
                "boundaries": [[30.90, 75.85], [30.91, 75.85], [30.91, 75.86], [30.90, 75.86]]
            }),
        )
        .await?;
    anyhow::ensure!(res.status == StatusCode::CREATED, "field: {}", res.body);
    Ok(res.id())
}

async fn drone(api: &Api, name: &str) -> Result<String> {
    let res = api
        .post(
            "/api/drones",
            json!({ "droneName": name, "connectionType": "wifi" }),
        )
        .await?;
    anyhow::ensure!(res.status == StatusCode::CREATED, "drone: {}", res.body);
    Ok(res.id())
}

fn scan(field_id: &str, score: u32, rate: f64) -> Value {
    json!({
        "fieldId": field_id,
        "healthScore": score,
        "infectionRate": rate,
        "infectionType": "aphid",
        "severity": "low",
        "detectionConfidence": 90
    })
}

fn spray(field_id: &str, total: f64, status: &str) -> Value {
    json!({
        "fieldId": field_id,
        "pesticideType": "Neem oil",
        "volumePerHectare": 0.75,
        "totalVolume": total,
        "status": status,
        "confidence": 88
    })
}

#[tokio::test]
async fn dashboard_is_zero_for_a_new_farmer() -> Result<()> {
    let api = Api::farmer("empty").await?;

    let stats = api.get("/api/dashboard/stats").await?;
    assert_eq!(stats.status, StatusCode::OK);
    let data = stats.data();
    assert_eq!(data["totalFields"], 0);
    assert_eq!(data["healthyPlants"], 0);
    assert_eq!(data["infectionRate"], 0.0);
    assert_eq!(data["pesticideSaved"], 0);
    assert_eq!(data["totalCrops"], 0);
    assert_eq!(data["activeDrones"], 0);
    assert_eq!(data["pendingApplications"], 0);
    Ok(())
}

#[tokio::test]
async fn dashboard_aggregates_only_the_callers_data() -> Result<()> {
    let api = Api::farmer("stats").await?;
    let other = Api::farmer("stats_other").await?;
    let mine = field(&api, "Home Plot").await?;
    let theirs = field(&other, "Neighbour Plot").await?;

    api.post("/api/health-records", scan(&mine, 80, 4.0)).await?;
    api.post("/api/health-records", scan(&mine, 90, 2.0)).await?;
    other.post("/api/health-records", scan(&theirs, 10, 60.0)).await?;
    api.post("/api/pesticide-applications", spray(&mine, 2.0, "scheduled")).await?;
    api.post("/api/pesticide-applications", spray(&mine, 1.0, "completed")).await?;

    let stats = api.get("/api/dashboard/stats").await?;
    let data = stats.data();
    assert_eq!(data["totalFields"], 1);
    assert_eq!(data["infectionRate"], 3.0);
    assert_eq!(data["pesticideSaved"], 3);
    assert_eq!(data["pendingApplications"], 1);
    Ok(())
}

#[tokio::test]
async fn drones_cannot_be_updated_by_other_farmers() -> Result<()> {
    let u1 = Api::farmer("pilot").await?;
    let u2 = Api::farmer("intruder").await?;
    field(&u1, "F1").await?;
    let drone_id = drone(&u1, "Alpha-1").await?;
    let path = format!("/api/drones/{}", drone_id);

    let hijack = u2.put(&path, json!({ "status": "connected" })).await?;
    assert_eq!(hijack.status, StatusCode::FORBIDDEN);
    assert_eq!(hijack.code(), "FORBIDDEN");

    let own = u1
        .put(&path, json!({ "status": "connected", "batteryLevel": "64" }))
        .await?;
    assert_eq!(own.status, StatusCode::OK, "{}", own.body);
    assert_eq!(own.data()["status"], "connected");
    assert_eq!(own.data()["batteryLevel"], 64);

    let bad = u1.put(&path, json!({ "status": "flying" })).await?;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);
    assert!(bad.body["field_errors"].get("status").is_some());
    Ok(())
}

#[tokio::test]
async fn pesticide_applications_follow_field_ownership() -> Result<()> {
    let u1 = Api::farmer("sprayer").await?;
    let u2 = Api::farmer("snoop").await?;
    let f1 = field(&u1, "Cotton Strip").await?;

    let created = u1
        .post("/api/pesticide-applications", spray(&f1, 3.0, "recommended"))
        .await?;
    assert_eq!(created.status, StatusCode::CREATED, "{}", created.body);
    let path = format!("/api/pesticide-applications/{}", created.id());

    assert_eq!(u2.get(&path).await?.status, StatusCode::FORBIDDEN);
    let hijack = u2.put(&path, json!({ "status": "applied" })).await?;
    assert_eq!(hijack.status, StatusCode::FORBIDDEN);

    let applied = u1
        .put(
            &path,
            json!({ "status": "applied", "appliedAt": "2024-07-01T06:30:00Z" }),
        )
        .await?;
    assert_eq!(applied.status, StatusCode::OK, "{}", applied.body);
    assert_eq!(applied.data()["status"], "applied");
    assert_eq!(applied.data()["totalVolume"], 3.0);

    let cleared = u1.put(&path, json!({ "appliedAt": null })).await?;
    assert_eq!(cleared.status, StatusCode::OK);
    assert!(cleared.data()["appliedAt"].is_null());

    let moved = u1.put(&path, json!({ "fieldId": f1 })).await?;
    assert_eq!(moved.status, StatusCode::BAD_REQUEST);

    let listed = u2.get("/api/pesticide-applications").await?;
    assert_eq!(listed.data().as_array().map(Vec::len), Some(0));

    let on_foreign_field = u2
        .post("/api/pesticide-applications", spray(&f1, 1.0, "scheduled"))
        .await?;
    assert_eq!(on_foreign_field.status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn health_records_validate_their_references() -> Result<()> {
    let api = Api::farmer("scout").await?;
    let other = Api::farmer("scout_other").await?;
    let own_field = field(&api, "Wheat Block").await?;
    let foreign_field = field(&other, "Other Block").await?;
    let foreign_drone = drone(&other, "Beta-2").await?;

    let missing = api
        .post(
            "/api/health-records",
            scan("5b0c9b3e-1111-4222-8333-444455556666", 70, 1.0),
        )
        .await?;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert!(missing.body["field_errors"].get("fieldId").is_some());

    let foreign = api
        .post("/api/health-records", scan(&foreign_field, 70, 1.0))
        .await?;
    assert_eq!(foreign.status, StatusCode::FORBIDDEN);

    let mut borrowed = scan(&own_field, 70, 1.0);
    borrowed["droneId"] = json!(foreign_drone);
    let borrowed = api.post("/api/health-records", borrowed).await?;
    assert_eq!(borrowed.status, StatusCode::FORBIDDEN);

    let out_of_range = api
        .post("/api/health-records", scan(&own_field, 140, 120.0))
        .await?;
    assert_eq!(out_of_range.status, StatusCode::BAD_REQUEST);
    assert!(out_of_range.body["field_errors"].get("healthScore").is_some());
    assert!(out_of_range.body["field_errors"].get("infectionRate").is_some());

    let ok = api.post("/api/health-records", scan(&own_field, 70, 1.0)).await?;
    assert_eq!(ok.status, StatusCode::CREATED, "{}", ok.body);
    assert!(ok.data()["recordedAt"].is_string());
    Ok(())
}

#[tokio::test]
async fn health_records_filter_by_field() -> Result<()> {
    let api = Api::farmer("filter").await?;
    let other = Api::farmer("filter_other").await?;
    let a = field(&api, "A").await?;
    let b = field(&api, "B").await?;
    let foreign = field(&other, "C").await?;

    api.post("/api/health-records", scan(&a, 60, 5.0)).await?;
    api.post("/api/health-records", scan(&a, 65, 4.0)).await?;
    api.post("/api/health-records", scan(&b, 95, 0.5)).await?;

    let all = api.get("/api/health-records").await?;
    assert_eq!(all.data().as_array().map(Vec::len), Some(3));

    let only_a = api.get(&format!("/api/health-records?fieldId={}", a)).await?;
    let only_a = only_a.data().as_array().cloned().unwrap_or_default();
    assert_eq!(only_a.len(), 2);
    assert!(only_a.iter().all(|r| r["fieldId"] == a.as_str()));

    let theirs = api
        .get(&format!("/api/health-records?fieldId={}", foreign))
        .await?;
    assert_eq!(theirs.status, StatusCode::FORBIDDEN);

    let junk = api.get("/api/health-records?fieldId=abc").await?;
    assert_eq!(junk.status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn fields_reject_foreign_crops_and_bad_coordinates() -> Result<()> {
    let api = Api::farmer("surveyor").await?;
    let other = Api::farmer("surveyor_other").await?;
    let crop = other
        .post(
            "/api/crops",
            json!({
                "name": "Cotton",
                "type": "cotton",
                "plantedDate": "2024-05-01",
                "expectedHarvestDate": "2024-11-01",
                "area": 1
            }),
        )
        .await?;
    assert_eq!(crop.status, StatusCode::CREATED, "{}", crop.body);

    let foreign = api
        .post(
            "/api/fields",
            json!({
                "cropId": crop.id(),
                "name": "Borrowed",
                "latitude": 30.0,
                "longitude": 75.0,
                "area": 1
            }),
        )
        .await?;
    assert_eq!(foreign.status, StatusCode::FORBIDDEN);

    let bad = api
        .post(
            "/api/fields",
            json!({
                "name": "Nowhere",
                "latitude": 95.0,
                "longitude": 200.0,
                "area": 0,
                "boundaries": [[1.0, 2.0]]
            }),
        )
        .await?;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);
    let errors = &bad.body["field_errors"];
    for key in ["latitude", "longitude", "area", "boundaries"] {
        assert!(errors.get(key).is_some(), "missing error for {}", key);
    }
    Ok(())
}

#[tokio::test]
async fn malformed_bodies_are_invalid_json() -> Result<()> {
    let api = Api::farmer("typo").await?;

    let res = api
        .raw(Method::POST, "/api/crops", "application/json", "{\"name\": ")
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.code(), "INVALID_JSON");

    let res = api
        .raw(Method::POST, "/api/drones", "application/json", "[1, 2, 3]")
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.code(), "INVALID_JSON");

    let res = api
        .raw(Method::POST, "/api/fields", "text/plain", "name=field")
        .await?;
    assert_eq!(res.code(), "INVALID_JSON");
    Ok(())
}
