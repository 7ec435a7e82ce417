use rusqlite::params;

use crate::common::*;

fn add_inventory(conn: &rusqlite::Connection, shop_id: &str) {
    conn.execute(
        "INSERT INTO items (id, shop_id, name, created_at) VALUES (?1, ?2, 'Bread', ?3)",
        params![format!("ITEM_{}", shop_id), shop_id, NOW],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO sales (id, shop_id, item_id, sale_date) VALUES (?1, ?2, ?3, ?4)",
        params![format!("SALE_{}", shop_id), shop_id, format!("ITEM_{}", shop_id), NOW],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO debts (id, shop_id, customer_name, created_at) VALUES (?1, ?2, 'Rudo', ?3)",
        params![format!("DEBT_{}", shop_id), shop_id, NOW],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO sync_logs (shop_id, sync_time) VALUES (?1, ?2)",
        params![shop_id, NOW],
    )
    .unwrap();
}

#[test]
fn test_register_shop_creates_first_device() {
    let mut conn = test_conn();
    let (shop, device) = create_test_shop(&mut conn, "Corner Store", NOW);

    assert!(shop.id.starts_with("SHOP_"));
    assert_eq!(device.shop_id, shop.id);
    assert_eq!(device.device_slot, 1);
    assert_eq!(device.status_at(NOW), DeviceStatus::Inactive);
    assert!(queries::get_shop_by_id(&conn, &shop.id).unwrap().is_some());
}

#[test]
fn test_register_shop_requires_fields() {
    let mut conn = test_conn();
    let mut input = shop_input("Corner Store");
    input.owner_surname = String::new();

    let err = queries::register_shop(&mut conn, &input, &LicensePolicy::default(), NOW)
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(ref msg) if msg == "owner_surname is required"));
    assert!(queries::list_shops_with_counts(&conn).unwrap().is_empty());
}

#[test]
fn test_update_shop_is_partial_and_bumps_updated_at() {
    let mut conn = test_conn();
    let (shop, _) = create_test_shop(&mut conn, "Corner Store", NOW);
    let later = NOW + 5_000;

    let update = UpdateShop {
        name: Some("  Corner Store & Bakery ".into()),
        address: Some("12 Main Rd".into()),
        ..Default::default()
    };
    let updated = queries::update_shop(&mut conn, &shop.id, &update, later).unwrap();

    assert_eq!(updated.name, "Corner Store & Bakery");
    assert_eq!(updated.address, "12 Main Rd");
    assert_eq!(updated.owner_name, shop.owner_name);
    assert_eq!(updated.phone_number, shop.phone_number);
    assert_eq!(updated.services, shop.services);
    assert_eq!(updated.created_at, NOW);
    assert_eq!(updated.updated_at, later);

    let stored = queries::get_shop_by_id(&conn, &shop.id).unwrap().unwrap();
    assert_eq!(stored.name, "Corner Store & Bakery");
    assert_eq!(stored.address, "12 Main Rd");
    assert_eq!(stored.updated_at, later);
}

#[test]
fn test_update_shop_rejects_blank_required_field() {
    let mut conn = test_conn();
    let (shop, _) = create_test_shop(&mut conn, "Corner Store", NOW);

    let update = UpdateShop {
        owner_name: Some("   ".into()),
        address: Some("12 Main Rd".into()),
        ..Default::default()
    };
    let err = queries::update_shop(&mut conn, &shop.id, &update, NOW + 1).unwrap_err();
    assert!(matches!(err, AppError::BadRequest(ref msg) if msg == "owner_name is required"));

    let stored = queries::get_shop_by_id(&conn, &shop.id).unwrap().unwrap();
    assert_eq!(stored.owner_name, shop.owner_name);
    assert_eq!(stored.address, shop.address);
    assert_eq!(stored.updated_at, NOW);
}

#[test]
fn test_update_shop_empty_or_unknown() {
    let mut conn = test_conn();
    let (shop, _) = create_test_shop(&mut conn, "Corner Store", NOW);

    let err = queries::update_shop(&mut conn, &shop.id, &UpdateShop::default(), NOW).unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let update = UpdateShop {
        name: Some("Elsewhere".into()),
        ..Default::default()
    };
    let err = queries::update_shop(&mut conn, "SHOP_missing", &update, NOW).unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[test]
fn test_list_shops_with_counts() {
    let mut conn = test_conn();
    let (older, _) = create_test_shop(&mut conn, "Older", NOW);
    let (newer, _) = create_test_shop(&mut conn, "Newer", NOW + 1);
    queries::register_device(&mut conn, &older.id, None, 3, NOW).unwrap();
    add_inventory(&conn, &older.id);

    let shops = queries::list_shops_with_counts(&conn).unwrap();
    assert_eq!(shops.len(), 2);
    assert_eq!(shops[0].shop.id, newer.id);
    assert_eq!(shops[0].device_count, 1);
    assert_eq!(shops[0].item_count, 0);
    assert_eq!(shops[1].shop.id, older.id);
    assert_eq!(shops[1].device_count, 2);
    assert_eq!(shops[1].item_count, 1);
    assert_eq!(shops[1].sale_count, 1);
}

#[test]
fn test_delete_shop_removes_everything_it_owns() {
    let mut conn = test_conn();
    let (shop, device) = create_test_shop(&mut conn, "Doomed", NOW);
    let (survivor, _) = create_test_shop(&mut conn, "Survivor", NOW);
    let used = create_test_key(&conn);
    let unused = create_test_key(&conn);
    queries::activate_product_key(
        &mut conn,
        &shop.id,
        &used.product_key,
        Some(&device.app_id),
        &LicensePolicy::default(),
        NOW,
    )
    .unwrap();
    add_inventory(&conn, &shop.id);
    add_inventory(&conn, &survivor.id);

    let deletion = queries::delete_shop_cascade(&mut conn, &shop.id).unwrap();
    assert_eq!(deletion.count("devices"), 1);
    assert_eq!(deletion.count("subscriptions"), 1);
    assert_eq!(deletion.count("product_keys"), 1);
    assert_eq!(deletion.count("items"), 1);

    assert!(queries::get_shop_by_id(&conn, &shop.id).unwrap().is_none());
    for table in ["devices", "subscriptions", "product_keys", "items", "sales", "debts", "sync_logs"] {
        assert_eq!(count_rows(&conn, table, &shop.id), 0, "{} left behind", table);
    }
    assert!(queries::get_product_key(&conn, &used.product_key).unwrap().is_none());
    assert!(queries::get_product_key(&conn, &unused.product_key).unwrap().is_some());
    assert_eq!(count_rows(&conn, "items", &survivor.id), 1);
    assert_eq!(count_rows(&conn, "devices", &survivor.id), 1);
}

#[test]
fn test_delete_shop_twice_is_not_found() {
    let mut conn = test_conn();
    let (shop, _) = create_test_shop(&mut conn, "Doomed", NOW);

    queries::delete_shop_cascade(&mut conn, &shop.id).unwrap();
    let err = queries::delete_shop_cascade(&mut conn, &shop.id).unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[test]
fn test_sweep_reports_new_expiries_and_purges_revocations() {
    let mut conn = test_conn();
    let (_, lapsing) = create_test_shop(&mut conn, "Lapsing", NOW);
    let (_, healthy) = create_test_shop(&mut conn, "Healthy", NOW);
    set_device_expiry(&conn, &lapsing.app_id, Some(NOW - 1_000));
    set_device_expiry(&conn, &healthy.app_id, Some(NOW + days_to_millis(1)));

    queries::revoke_token(&conn, "jti-old", "ADM_1", NOW - 1).unwrap();
    queries::revoke_token(&conn, "jti-live", "ADM_1", NOW + 60_000).unwrap();

    let report = shopsync::sweep::sweep_once(&conn, NOW - 60_000, NOW).unwrap();
    assert_eq!(report.expired_devices, 1);
    assert_eq!(report.purged_revocations, 1);
    assert!(!queries::is_token_revoked(&conn, "jti-old").unwrap());
    assert!(queries::is_token_revoked(&conn, "jti-live").unwrap());

    // Already reported on the previous pass
    let report = shopsync::sweep::sweep_once(&conn, NOW, NOW + 1_000).unwrap();
    assert_eq!(report.expired_devices, 0);
}
