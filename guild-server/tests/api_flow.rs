//! End-to-end HTTP flows against the in-memory store

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use guild_server::AppState;
use guild_server::api::build_app;
use guild_server::db::memory::MemoryStore;
use guild_server::services::notifier::LogNotifier;
use http::{Method, Request, StatusCode};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tower::ServiceExt;

struct TestApp {
    router: Router,
}

impl TestApp {
    fn new() -> Self {
        let state = AppState::new(Arc::new(MemoryStore::new()), Arc::new(LogNotifier));
        Self {
            router: build_app(state),
        }
    }

    async fn call(&self, method: Method, path: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(path);
        let body = match body {
            Some(json) => {
                request = request.header(http::header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = self
            .router
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn get(&self, path: &str) -> (StatusCode, Value) {
        self.call(Method::GET, path, None).await
    }

    async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::POST, path, Some(body)).await
    }

    async fn create_member(&self, email: &str) -> i64 {
        let (status, body) = self
            .post(
                "/api/members",
                json!({ "first_name": "Test", "last_name": "Member", "email": email }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"]["id"].as_i64().unwrap()
    }
}

fn money(value: &Value) -> Decimal {
    match value {
        Value::String(s) => s.parse().unwrap(),
        other => other.to_string().parse().unwrap(),
    }
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();
    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], true);
}

#[tokio::test]
async fn test_silver_member_reaches_gold() {
    let app = TestApp::new();
    let member_id = app.create_member("donor@example.org").await;

    let (status, _) = app
        .post(
            "/api/donations",
            json!({ "member_id": member_id, "amount": "4950.00" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (_, member) = app.get(&format!("/api/members/{member_id}")).await;
    assert_eq!(member["data"]["tier"], "silver");

    let (status, body) = app
        .post(
            "/api/donations",
            json!({ "member_id": member_id, "amount": "100.00" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["code"], 0);
    assert_eq!(body["data"]["member"]["tier"], "gold");
    assert_eq!(money(&body["data"]["member"]["total_donated"]), Decimal::from(5050));

    let (_, feed) = app.get(&format!("/api/members/{member_id}/activities")).await;
    let feed = feed["data"].as_array().unwrap();
    assert_eq!(feed[0]["activity_type"], "donation");
    assert_eq!(feed[1]["activity_type"], "tier_change");
}

#[tokio::test]
async fn test_donation_errors_use_envelope() {
    let app = TestApp::new();

    let (status, body) = app
        .post("/api/donations", json!({ "member_id": 42, "amount": "10" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 1001);

    let member_id = app.create_member("donor@example.org").await;
    let (status, body) = app
        .post("/api/donations", json!({ "member_id": member_id, "amount": "0" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 2002);

    let (status, _) = app.call(Method::DELETE, "/api/donations/77", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_waitlist_over_http() {
    let app = TestApp::new();
    let (status, event) = app
        .post(
            "/api/events",
            json!({
                "title": "Orchard Planting",
                "status": "published",
                "starts_at": 4_102_444_800_000_i64,
                "capacity": 1
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let event_id = event["data"]["id"].as_i64().unwrap();
    let path = format!("/api/events/{event_id}/registrations");

    let first = app.create_member("first@example.org").await;
    let second = app.create_member("second@example.org").await;

    let (_, confirmed) = app.post(&path, json!({ "member_id": first })).await;
    assert_eq!(confirmed["message"], "Registration confirmed");
    let (_, waiting) = app.post(&path, json!({ "member_id": second })).await;
    assert_eq!(waiting["message"], "You're on the waitlist");
    assert_eq!(waiting["data"]["registration"]["status"], "pending");

    let (status, body) = app.post(&path, json!({ "member_id": second })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 3102);

    let reg_id = confirmed["data"]["registration"]["id"].as_i64().unwrap();
    let (status, _) = app
        .call(
            Method::PATCH,
            &format!("{path}/{reg_id}"),
            Some(json!({ "status": "cancelled" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, regs) = app.get(&path).await;
    let promoted = regs["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["member_id"] == second)
        .unwrap()
        .clone();
    assert_eq!(promoted["status"], "confirmed");

    let (_, event) = app.get(&format!("/api/events/{event_id}")).await;
    assert_eq!(event["data"]["current_registrations"], 1);
}

#[tokio::test]
async fn test_communication_lifecycle() {
    let app = TestApp::new();
    app.create_member("reader@example.org").await;

    let (status, comm) = app
        .post(
            "/api/communications",
            json!({
                "subject": "Harvest news",
                "body": "The orchard is planted.",
                "recipient_segments": ["all"]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(comm["data"]["total_recipients"], 1);
    let id = comm["data"]["id"].as_i64().unwrap();

    let (status, body) = app.post(&format!("/api/communications/{id}/recipients"), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["created"], 1);

    let (status, report) = app.post(&format!("/api/communications/{id}/send"), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["data"]["delivered"], 1);
    assert_eq!(report["data"]["communication"]["status"], "sent");

    let (status, body) = app
        .call(Method::DELETE, &format!("/api/communications/{id}"), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 4002);

    let (status, body) = app
        .post(
            "/api/communications",
            json!({ "subject": "x", "body": "y", "recipient_segments": ["vip"] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 4003);
}

#[tokio::test]
async fn test_automation_trigger_over_http() {
    let app = TestApp::new();
    let member_id = app.create_member("new@example.org").await;

    let (status, body) = app
        .post(
            "/api/automations",
            json!({ "name": "Thanks", "trigger_type": "donation_acknowledgment" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = app
        .post(
            &format!("/api/automations/{id}/trigger"),
            json!({ "trigger_data": { "member_id": member_id } }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 5004);

    let (_, logs) = app.get(&format!("/api/automations/{id}/logs")).await;
    assert!(logs["data"].as_array().unwrap().is_empty());

    let (_, donation) = app
        .post("/api/donations", json!({ "member_id": member_id, "amount": "25" }))
        .await;
    let donation_id = donation["data"]["id"].as_i64().unwrap();

    // the donation itself fired the automation once
    let (status, body) = app
        .post(
            &format!("/api/automations/{id}/trigger"),
            json!({ "trigger_data": { "member_id": member_id, "donation_id": donation_id } }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["automation"]["run_count"], 2);
    assert_eq!(body["data"]["log"]["success"], true);

    let (status, body) = app
        .post(
            "/api/automations",
            json!({ "name": "Birthday", "trigger_type": "birthday" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 5003);
}

#[tokio::test]
async fn test_dashboard_summary_starts_at_zero() {
    let app = TestApp::new();
    let (status, body) = app.get("/api/dashboard/summary").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_members"], 0);
    assert_eq!(money(&body["data"]["total_raised"]), Decimal::ZERO);
    assert_eq!(body["data"]["tiers"].as_array().unwrap().len(), 4);
}
