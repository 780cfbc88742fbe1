//! Integration tests for the admin API.
//!
//! Run with: cargo test -p boutique-integration-tests

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use reqwest::StatusCode;
use serde_json::{Value, json};

use boutique_integration_tests::{TestApp, order_body};
use boutique_server::services::export::CSV_HEADER;

async fn app_with_orders(customers: &[&str]) -> TestApp {
    let app = TestApp::spawn().await;
    for customer in customers {
        let resp = app.create_order(&order_body(customer, 2, 1000)).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
    app
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn test_login_with_wrong_password() {
    let app = TestApp::spawn().await;

    let resp = app
        .client
        .post(app.url("/api/admin/login"))
        .json(&json!({ "password": "not-the-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "invalid_password");
}

#[tokio::test]
async fn test_guarded_routes_require_token() {
    let app = TestApp::spawn().await;

    for path in [
        "/api/admin/orders",
        "/api/admin/stats",
        "/api/admin/recap-pdf",
        "/api/admin/export",
    ] {
        let resp = app.client.get(app.url(path)).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{path}");
    }

    let resp = app
        .client
        .get(app.url("/api/admin/orders"))
        .bearer_auth("forged-token")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_accepted_in_either_header() {
    let app = TestApp::spawn().await;
    let token = app.login().await;

    let resp = app
        .client
        .get(app.url("/api/admin/orders"))
        .header("x-admin-token", &token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .client
        .get(app.url("/api/admin/orders"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_logout_revokes_token() {
    let app = TestApp::spawn().await;
    let token = app.login().await;

    let resp = app
        .client
        .post(app.url("/api/admin/logout"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .client
        .get(app.url("/api/admin/orders"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_disabled_without_password() {
    let app = TestApp::spawn_with(&[("ADMIN_PASS", "")]).await;

    let resp = app
        .client
        .post(app.url("/api/admin/login"))
        .json(&json!({ "password": "anything-at-all" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "admin_disabled");

    let resp = app
        .client
        .get(app.url("/api/admin/orders"))
        .bearer_auth("any-token")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

// ============================================================================
// Order Management
// ============================================================================

#[tokio::test]
async fn test_list_orders_newest_first() {
    let app = app_with_orders(&["Alice", "Bob"]).await;
    let token = app.login().await;

    let body: Value = app
        .client
        .get(app.url("/api/admin/orders"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let orders = body["orders"].as_array().unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0]["customer"], "Bob");
    assert_eq!(orders[1]["customer"], "Alice");
    assert_eq!(orders[0]["status"], "pending");
}

#[tokio::test]
async fn test_update_status_and_address() {
    let app = app_with_orders(&["Bob"]).await;
    let token = app.login().await;

    let resp = app
        .client
        .patch(app.url("/api/admin/orders/1"))
        .bearer_auth(&token)
        .json(&json!({ "status": "confirmed", "address": "2 place Bellecour" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["order"]["status"], "confirmed");
    assert_eq!(body["order"]["address"], "2 place Bellecour");
    assert_eq!(body["order"]["total"], 2000);
}

#[tokio::test]
async fn test_update_requires_a_change() {
    let app = app_with_orders(&["Bob"]).await;
    let token = app.login().await;

    let resp = app
        .client
        .patch(app.url("/api/admin/orders/1"))
        .bearer_auth(&token)
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_order() {
    let app = app_with_orders(&["Bob"]).await;
    let token = app.login().await;

    let resp = app
        .client
        .delete(app.url("/api/admin/orders/1"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .client
        .get(app.url("/api/admin/orders/1"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = app
        .client
        .delete(app.url("/api/admin/orders/1"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_order_id() {
    let app = TestApp::spawn().await;
    let token = app.login().await;

    let resp = app
        .client
        .get(app.url("/api/admin/orders/abc"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Reporting
// ============================================================================

async fn get_stats(app: &TestApp, token: &str, query: &str) -> reqwest::Response {
    app.client
        .get(app.url(&format!("/api/admin/stats{query}")))
        .bearer_auth(token)
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_stats() {
    let app = TestApp::spawn_with(&[("LOYALTY_INTERVAL", "2")]).await;
    app.create_order(&order_body("Bob", 2, 1000)).await;
    app.create_order(&order_body("Bob", 2, 1000)).await;
    let token = app.login().await;

    let resp = get_stats(&app, &token, "").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();

    assert_eq!(body["period"], "all");
    let stats = &body["stats"];
    assert_eq!(stats["total_orders"], 2);
    assert_eq!(stats["total_revenue"], 3990);
    assert_eq!(stats["total_discounts"], 10);
    assert_eq!(stats["avg_basket"], 1995);
    assert_eq!(stats["by_type"]["Livraison"], 2);

    let top = stats["top_products"].as_array().unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0]["name"], "Pizza Margherita");
    assert_eq!(top[0]["qty"], 4);
    assert_eq!(top[0]["revenue"], 4000);

    let trend = stats["daily_trend"].as_array().unwrap();
    let per_day: u64 = trend.iter().map(|d| d["orders"].as_u64().unwrap()).sum();
    assert_eq!(per_day, 2);
}

#[tokio::test]
async fn test_stats_period_excludes_older_orders() {
    let app = app_with_orders(&["Alice", "Bob"]).await;
    sqlx::query(
        "UPDATE orders SET created_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now', '-10 days') \
         WHERE id = 1",
    )
    .execute(&app.pool)
    .await
    .unwrap();
    let token = app.login().await;

    let week: Value = get_stats(&app, &token, "?period=week").await.json().await.unwrap();
    assert_eq!(week["period"], "week");
    assert_eq!(week["stats"]["total_orders"], 1);

    let month: Value = get_stats(&app, &token, "?period=month").await.json().await.unwrap();
    assert_eq!(month["stats"]["total_orders"], 2);

    let today: Value = get_stats(&app, &token, "?period=today").await.json().await.unwrap();
    assert_eq!(today["stats"]["total_orders"], 1);
    assert_eq!(today["stats"]["daily_trend"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_stats_on_empty_store() {
    let app = TestApp::spawn().await;
    let token = app.login().await;

    let body: Value = get_stats(&app, &token, "?period=today").await.json().await.unwrap();
    assert_eq!(body["stats"]["total_orders"], 0);
    assert_eq!(body["stats"]["avg_basket"], 0);
    assert!(body["stats"]["top_products"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_stats_rejects_unknown_period() {
    let app = TestApp::spawn().await;
    let token = app.login().await;

    let resp = get_stats(&app, &token, "?period=year").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["ok"], false);
}

#[tokio::test]
async fn test_recap_pdf() {
    let app = app_with_orders(&["Alice", "Bob"]).await;
    let token = app.login().await;

    let resp = app
        .client
        .get(app.url("/api/admin/recap-pdf?period=week"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["content-type"], "application/pdf");
    let disposition = resp.headers()["content-disposition"].to_str().unwrap();
    assert!(disposition.starts_with("attachment"));
    assert!(disposition.contains("recap_"));

    let bytes = resp.bytes().await.unwrap();
    assert!(bytes.starts_with(b"%PDF"));

    let resp = app
        .client
        .get(app.url("/api/admin/recap-pdf?period=decade"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_export_csv() {
    let app = app_with_orders(&["Alice", "Bob"]).await;
    let token = app.login().await;

    let resp = app
        .client
        .get(app.url("/api/admin/export"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(
        resp.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/csv")
    );
    assert!(
        resp.headers()["content-disposition"]
            .to_str()
            .unwrap()
            .contains("orders.csv")
    );

    let csv = resp.text().await.unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], CSV_HEADER);
    assert!(lines[1].starts_with("2,"));
}

#[tokio::test]
async fn test_receipt_pdf() {
    let app = app_with_orders(&["Bob"]).await;
    let token = app.login().await;

    let resp = app
        .client
        .get(app.url("/api/admin/orders/1/receipt"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["content-type"], "application/pdf");
    assert!(
        resp.headers()["content-disposition"]
            .to_str()
            .unwrap()
            .contains("receipt_1.pdf")
    );

    let bytes = resp.bytes().await.unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[tokio::test]
async fn test_receipt_for_missing_order() {
    let app = TestApp::spawn().await;
    let token = app.login().await;

    let resp = app
        .client
        .get(app.url("/api/admin/orders/42/receipt"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
