use axum::http::StatusCode;

use crate::common::*;

/// Shop with an activated device, registered through the public routes.
async fn activated_shop(app: &TestApp, name: &str) -> (String, String) {
    let (status, shop) = app
        .send(post("/api/shops", None, Some(shop_json(name))))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let shop_id = shop["shop_id"].as_str().unwrap().to_string();
    let app_id = shop["app_id"].as_str().unwrap().to_string();

    let key = create_test_key(&app.conn());
    let (status, _) = app
        .send(post(
            &format!("/api/shops/{}/product-keys/activate", shop_id),
            None,
            Some(serde_json::json!({ "product_key": key.product_key, "app_id": app_id })),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);

    (shop_id, app_id)
}

fn shop_json(name: &str) -> serde_json::Value {
    serde_json::json!({
        "name": name,
        "owner_name": "Tendai",
        "owner_surname": "Moyo",
        "phone_number": "+263771234567",
    })
}

#[tokio::test]
async fn test_generate_and_list_product_keys() {
    let app = TestApp::new();
    let token = app.admin_token();

    let (status, created) = app
        .send(post("/api/admin/product-keys", Some(&token), None))
        .await;
    assert_eq!(status, StatusCode::OK);
    let key = created["product_key"].as_str().unwrap();
    assert_eq!(key.len(), 19);
    assert!(created["id"].is_string());
    assert!(created["created_at"].is_i64());

    let (status, keys) = app.send(get("/api/admin/product-keys", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    let keys = keys.as_array().unwrap();
    assert_eq!(keys.len(), 1);
    assert_eq!(keys[0]["product_key"], key);
    assert_eq!(keys[0]["status"], "unused");
    assert!(keys[0]["shop_id"].is_null());
    assert!(keys[0]["shop_name"].is_null());
}

#[tokio::test]
async fn test_stats_endpoint() {
    let app = TestApp::new();
    let token = app.admin_token();
    activated_shop(&app, "Corner Store").await;
    create_test_key(&app.conn());

    let (status, stats) = app.send(get("/api/admin/stats", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total_shops"], 1);
    assert_eq!(stats["total_devices"], 1);
    assert_eq!(stats["active_devices"], 1);
    assert_eq!(stats["unused_product_keys"], 1);
    assert_eq!(stats["used_product_keys"], 1);
    assert_eq!(stats["paid_shops"], 0);
    assert_eq!(stats["unpaid_shops"], 1);
    assert_eq!(stats["pending_subscriptions"], 1);
    assert_eq!(stats["expired_subscriptions"], 0);
}

#[tokio::test]
async fn test_mark_paid_flow() {
    let app = TestApp::new();
    let token = app.admin_token();
    let (shop_id, _) = activated_shop(&app, "Corner Store").await;

    let (_, subs) = app.send(get("/api/admin/subscriptions", Some(&token))).await;
    assert_eq!(subs[0]["status"], "pending_payment");
    assert_eq!(subs[0]["payment_status"], "unpaid");
    assert_eq!(subs[0]["shop_name"], "Corner Store");

    let before = now_millis();
    let (status, paid) = app
        .send(post(
            &format!("/api/admin/subscriptions/{}/mark-paid", shop_id),
            Some(&token),
            None,
        ))
        .await;
    let after = now_millis();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(paid["status"], "active");
    assert_eq!(paid["payment_status"], "paid");
    assert_eq!(paid["days_remaining"], 30);
    let end = paid["subscription_end"].as_i64().unwrap();
    assert!(end >= before + days_to_millis(30) && end <= after + days_to_millis(30));

    let (_, stats) = app.send(get("/api/admin/stats", Some(&token))).await;
    assert_eq!(stats["paid_shops"], 1);
    assert_eq!(stats["unpaid_shops"], 0);
}

#[tokio::test]
async fn test_mark_paid_unknown_shop_is_404() {
    let app = TestApp::new();
    let token = app.admin_token();

    let (status, body) = app
        .send(post(
            "/api/admin/subscriptions/SHOP_missing/mark-paid",
            Some(&token),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn test_list_shops_and_devices() {
    let app = TestApp::new();
    let token = app.admin_token();
    let (shop_id, app_id) = activated_shop(&app, "Corner Store").await;

    let (status, shops) = app.send(get("/api/admin/shops", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(shops[0]["id"], shop_id);
    assert_eq!(shops[0]["device_count"], 1);
    assert_eq!(shops[0]["item_count"], 0);
    assert_eq!(shops[0]["sale_count"], 0);

    let (status, devices) = app.send(get("/api/admin/devices", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(devices[0]["app_id"], app_id);
    assert_eq!(devices[0]["shop_name"], "Corner Store");
    assert_eq!(devices[0]["device_slot"], 1);
    assert_eq!(devices[0]["status"], "active");
}

#[tokio::test]
async fn test_delete_shop_then_again_is_404() {
    let app = TestApp::new();
    let token = app.admin_token();
    let (shop_id, app_id) = activated_shop(&app, "Corner Store").await;

    let uri = format!("/api/admin/shops/{}", shop_id);
    let (status, body) = app.send(delete(&uri, Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], true);

    let (status, body) = app.send(delete(&uri, Some(&token))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());

    let (status, _) = app
        .send(get(&format!("/api/devices/{}/license", app_id), None))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, subs) = app.send(get("/api/admin/subscriptions", Some(&token))).await;
    assert!(subs.as_array().unwrap().is_empty());
}
