use axum::{body::Body, http::Request, http::StatusCode};
use serde_json::json;

use crate::common::*;

fn shop_body() -> serde_json::Value {
    json!({
        "name": "Corner Store",
        "owner_name": "Tendai",
        "owner_surname": "Moyo",
        "phone_number": "+263771234567",
        "services": "groceries, airtime",
    })
}

async fn register_shop(app: &TestApp) -> (String, String) {
    let (status, body) = app.send(post("/api/shops", None, Some(shop_body()))).await;
    assert_eq!(status, StatusCode::CREATED);
    (
        body["shop_id"].as_str().unwrap().to_string(),
        body["app_id"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn test_register_shop() {
    let app = TestApp::new();
    let (status, body) = app.send(post("/api/shops", None, Some(shop_body()))).await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(body["shop_id"].as_str().unwrap().starts_with("SHOP_"));
    assert!(body["app_id"].as_str().unwrap().starts_with("APP_"));
    assert_eq!(body["device_slot"], 1);
    assert_eq!(body["shop_name"], "Corner Store");
}

#[tokio::test]
async fn test_register_shop_missing_field_is_400() {
    let app = TestApp::new();
    let mut body = shop_body();
    body["phone_number"] = json!("  ");

    let (status, body) = app.send(post("/api/shops", None, Some(body))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "phone_number is required");
    assert_eq!(body["code"], "bad_request");
}

#[tokio::test]
async fn test_malformed_json_is_400_json() {
    let app = TestApp::new();
    let request = Request::builder()
        .method("POST")
        .uri("/api/shops")
        .header("Content-Type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "bad_request");
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_register_device_slots_and_limit() {
    let app = TestApp::new();
    let (shop_id, first_app) = register_shop(&app).await;
    let uri = format!("/api/shops/{}/devices", shop_id);

    let (status, body) = app.send(post(&uri, None, Some(json!({})))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["device_slot"], 2);

    let (status, body) = app
        .send(post(&uri, None, Some(json!({ "app_id": "APP_till_3" }))))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["device_slot"], 3);
    assert_eq!(body["app_id"], "APP_till_3");

    // Re-registering a known installation is not a new slot
    let (status, body) = app
        .send(post(&uri, None, Some(json!({ "app_id": first_app }))))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["device_slot"], 1);

    let (status, body) = app.send(post(&uri, None, Some(json!({})))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "slot_limit_exceeded");
}

#[tokio::test]
async fn test_register_device_unknown_shop_is_404() {
    let app = TestApp::new();
    let (status, _) = app
        .send(post("/api/shops/SHOP_missing/devices", None, Some(json!({}))))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_activate_key_then_reuse_is_conflict() {
    let app = TestApp::new();
    let (shop_id, app_id) = register_shop(&app).await;
    let key = create_test_key(&app.conn());
    let uri = format!("/api/shops/{}/product-keys/activate", shop_id);

    // Keys are accepted in any case
    let (status, body) = app
        .send(post(
            &uri,
            None,
            Some(json!({ "product_key": key.product_key.to_lowercase(), "app_id": app_id })),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["app_id"], app_id);
    assert_eq!(body["device_slot"], 1);
    assert_eq!(body["subscription_status"], "pending_payment");
    let activated = body["activated_at"].as_i64().unwrap();
    assert_eq!(body["expires_at"].as_i64().unwrap(), activated + days_to_millis(30));

    let (status, body) = app
        .send(post(&uri, None, Some(json!({ "product_key": key.product_key }))))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "already_used");
}

#[tokio::test]
async fn test_renew_extends_from_current_expiry() {
    let app = TestApp::new();
    let (shop_id, app_id) = register_shop(&app).await;

    let first = create_test_key(&app.conn());
    let (status, activated) = app
        .send(post(
            &format!("/api/shops/{}/product-keys/activate", shop_id),
            None,
            Some(json!({ "product_key": first.product_key, "app_id": app_id })),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    let first_expiry = activated["expires_at"].as_i64().unwrap();

    let second = create_test_key(&app.conn());
    let uri = format!("/api/shops/{}/devices/{}/renew", shop_id, app_id);
    let (status, body) = app
        .send(post(&uri, None, Some(json!({ "product_key": second.product_key }))))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["app_id"], app_id);
    assert_eq!(body["device_slot"], 1);
    assert!(body["activated_at"].as_i64().unwrap() >= activated["activated_at"].as_i64().unwrap());
    assert_eq!(body["expires_at"].as_i64().unwrap(), first_expiry + days_to_millis(30));

    let (status, body) = app
        .send(post(&uri, None, Some(json!({ "product_key": second.product_key }))))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "already_used");
}

#[tokio::test]
async fn test_renew_unknown_device_or_shop_is_404() {
    let app = TestApp::new();
    let (shop_id, app_id) = register_shop(&app).await;
    let key = create_test_key(&app.conn());
    let body = json!({ "product_key": key.product_key });

    for uri in [
        format!("/api/shops/{}/devices/APP_missing/renew", shop_id),
        format!("/api/shops/SHOP_missing/devices/{}/renew", app_id),
    ] {
        let (status, response) = app.send(post(&uri, None, Some(body.clone()))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(response["code"], "not_found");
    }

    // Nothing was redeemed or registered
    let stored = queries::get_product_key(&app.conn(), &key.product_key).unwrap().unwrap();
    assert!(!stored.is_used());
    assert!(queries::get_device_by_app_id(&app.conn(), "APP_missing").unwrap().is_none());
}

#[tokio::test]
async fn test_get_and_update_shop_profile() {
    let app = TestApp::new();
    let (shop_id, _) = register_shop(&app).await;
    let uri = format!("/api/shops/{}", shop_id);

    let (status, shop) = app.send(get(&uri, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(shop["id"], shop_id);
    assert_eq!(shop["name"], "Corner Store");
    assert_eq!(shop["services"], "groceries, airtime");

    let (status, updated) = app
        .send(request(
            "PUT",
            &uri,
            None,
            Some(json!({ "phone_number": "+263779999999", "address": "12 Main Rd" })),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["phone_number"], "+263779999999");
    assert_eq!(updated["name"], "Corner Store");
    assert!(updated["updated_at"].as_i64().unwrap() >= shop["updated_at"].as_i64().unwrap());

    let (_, reread) = app.send(get(&uri, None)).await;
    assert_eq!(reread["address"], "12 Main Rd");
    assert_eq!(reread["owner_name"], "Tendai");

    let (status, body) = app
        .send(request("PUT", &uri, None, Some(json!({ "name": "" }))))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "name is required");
}

#[tokio::test]
async fn test_shop_profile_unknown_is_404() {
    let app = TestApp::new();
    let (status, body) = app.send(get("/api/shops/SHOP_missing", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Shop not found");

    let (status, _) = app
        .send(request("PUT", "/api/shops/SHOP_missing", None, Some(json!({ "name": "X" }))))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_activate_malformed_or_unknown_key() {
    let app = TestApp::new();
    let (shop_id, _) = register_shop(&app).await;
    let uri = format!("/api/shops/{}/product-keys/activate", shop_id);

    let (status, body) = app
        .send(post(&uri, None, Some(json!({ "product_key": "ABC-123" }))))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid product key format");

    let (status, body) = app
        .send(post(&uri, None, Some(json!({ "product_key": "ZZZZ-ZZZZ-ZZZZ-ZZZZ" }))))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn test_heartbeat_and_license_status() {
    let app = TestApp::new();
    let (shop_id, app_id) = register_shop(&app).await;

    let (status, license) = app
        .send(get(&format!("/api/devices/{}/license", app_id), None))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(license["status"], "inactive");
    assert!(license["product_key"].is_null());
    assert!(license["subscription_status"].is_null());

    let key = create_test_key(&app.conn());
    app.send(post(
        &format!("/api/shops/{}/product-keys/activate", shop_id),
        None,
        Some(json!({ "product_key": key.product_key, "app_id": app_id })),
    ))
    .await;

    let (status, beat) = app
        .send(post(&format!("/api/devices/{}/heartbeat", app_id), None, None))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(beat["status"], "active");

    let (status, license) = app
        .send(get(&format!("/api/devices/{}/license", app_id), None))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(license["status"], "active");
    assert_eq!(license["expired"], false);
    assert_eq!(license["days_remaining"], 30);
    assert_eq!(license["subscription_status"], "pending_payment");
    let masked = license["product_key"].as_str().unwrap();
    assert_eq!(&masked[..4], &key.product_key[..4]);
    assert_eq!(&masked[5..14], "****-****");
    assert_eq!(&masked[15..], &key.product_key[15..]);
}

#[tokio::test]
async fn test_heartbeat_expired_device_is_403() {
    let app = TestApp::new();
    let (_, app_id) = register_shop(&app).await;
    set_device_expiry(&app.conn(), &app_id, Some(now_millis() - 1_000));

    let (status, body) = app
        .send(post(&format!("/api/devices/{}/heartbeat", app_id), None, None))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "license_expired");

    let (_, license) = app
        .send(get(&format!("/api/devices/{}/license", app_id), None))
        .await;
    assert_eq!(license["expired"], true);
    assert_eq!(license["days_remaining"], 0);
}

#[tokio::test]
async fn test_heartbeat_unknown_device_is_404() {
    let app = TestApp::new();
    let (status, _) = app
        .send(post("/api/devices/APP_missing/heartbeat", None, None))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
