use actix_web::{http::StatusCode, test, test::TestRequest, App};
use checkout_engine::{
    db_types::{OrderId, OrderStatusType},
    traits::OrderPaymentDatabase,
};
use serde_json::{json, Value};

use super::helpers::{get, post_json, send, TestEnv, ALICE, BOB};

fn cart() -> Value {
    json!({
        "items": [
            { "product_id": "tshirt", "quantity": 2, "unit_price": "19.99" },
            { "product_id": "mug", "quantity": 1, "unit_price": 10.01 }
        ],
        "shipping": {
            "full_name": "Alice Smith", "email": ALICE, "address": "1 Main St",
            "city": "Springfield", "zip": "12345", "country": "US"
        }
    })
}

#[actix_web::test]
async fn health_endpoint() {
    let env = TestEnv::new().await;
    let app = test::init_service(App::new().configure(env.configure())).await;
    let (status, body) = send(&app, TestRequest::get().uri("/health").to_request()).await;
    assert!(status.is_success());
    assert_eq!(body, "👍️\n");
    env.tear_down().await;
}

#[actix_web::test]
async fn create_order() {
    let env = TestEnv::new().await;
    let app = test::init_service(App::new().configure(env.configure())).await;
    let (status, body) = send(&app, post_json("/api/orders", Some(ALICE), cart())).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let order: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(order["customer_id"], ALICE);
    assert_eq!(order["total"], 4999);
    assert_eq!(order["currency"], "usd");
    assert_eq!(order["status"], "Pending");
    let order_id = OrderId::from(order["order_id"].as_str().unwrap());
    let stored = env.db.fetch_order(&order_id).await.unwrap().unwrap();
    assert_eq!(stored.total.value(), 4999);
    assert_eq!(env.db.fetch_order_items(&order_id).await.unwrap().len(), 2);
    env.tear_down().await;
}

#[actix_web::test]
async fn create_order_needs_a_token() {
    let env = TestEnv::new().await;
    let app = test::init_service(App::new().configure(env.configure())).await;
    let (status, body) = send(&app, post_json("/api/orders", None, cart())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("No bearer token"), "was: {body}");

    let req = TestRequest::post()
        .uri("/api/orders")
        .insert_header(("Authorization", "Bearer not-a-token"))
        .set_json(cart())
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    env.tear_down().await;
}

#[actix_web::test]
async fn create_order_rejects_bad_carts() {
    let env = TestEnv::new().await;
    let app = test::init_service(App::new().configure(env.configure())).await;
    let mut empty = cart();
    empty["items"] = json!([]);
    let (status, body) = send(&app, post_json("/api/orders", Some(ALICE), empty)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("empty"), "was: {body}");

    let mut sub_cent = cart();
    sub_cent["items"][0]["unit_price"] = json!("19.999");
    let (status, _) = send(&app, post_json("/api/orders", Some(ALICE), sub_cent)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut no_address = cart();
    no_address["shipping"]["address"] = json!("");
    let (status, body) = send(&app, post_json("/api/orders", Some(ALICE), no_address)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("address"), "was: {body}");
    env.tear_down().await;
}

#[actix_web::test]
async fn create_order_rejects_overflowing_totals() {
    let env = TestEnv::new().await;
    let app = test::init_service(App::new().configure(env.configure())).await;
    let mut cart = cart();
    // 400 * (2^62 + 1) would wrap around to 400
    cart["items"] = json!([{ "product_id": "tshirt", "quantity": 4_611_686_018_427_387_905_i64, "unit_price": "4.00" }]);
    let (status, body) = send(&app, post_json("/api/orders", Some(ALICE), cart)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("too large"), "was: {body}");
    env.tear_down().await;
}

#[actix_web::test]
async fn fetch_order_is_owner_only() {
    let env = TestEnv::new().await;
    let order = env.order_for(ALICE, "49.99").await;
    let app = test::init_service(App::new().configure(env.configure())).await;
    let path = format!("/api/orders/{}", order.order_id);

    let (status, body) = send(&app, get(&path, Some(ALICE))).await;
    assert_eq!(status, StatusCode::OK);
    let full: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(full["order_id"], order.order_id.as_str());
    assert_eq!(full["items"].as_array().unwrap().len(), 1);
    assert!(full["payment"].is_null());

    let (status, _) = send(&app, get(&path, Some(BOB))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, get("/api/orders/no-such-order", Some(ALICE))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("does not exist"), "was: {body}");
    env.tear_down().await;
}

#[actix_web::test]
async fn payment_intent_is_created_once() {
    let env = TestEnv::new().await;
    let order = env.order_for(ALICE, "49.99").await;
    let app = test::init_service(App::new().configure(env.configure())).await;
    let path = format!("/api/orders/{}/payment_intent", order.order_id);

    let (status, body) = send(&app, post_json(&path, Some(ALICE), json!({}))).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let first: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(first["amount"], 4999);
    assert_eq!(first["order_id"], order.order_id.as_str());
    assert!(!first["client_secret"].as_str().unwrap().is_empty());

    let (status, body) = send(&app, post_json(&path, Some(ALICE), json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    let second: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(first["intent_id"], second["intent_id"]);
    assert_eq!(env.gateway.intent_count(), 1);

    let request = &env.gateway.requests()[0];
    assert_eq!(request.idempotency_key, format!("order-{}", order.order_id));
    assert_eq!(request.user_email, ALICE);
    env.tear_down().await;
}

#[actix_web::test]
async fn payment_intent_for_someone_elses_order() {
    let env = TestEnv::new().await;
    let order = env.order_for(ALICE, "49.99").await;
    let app = test::init_service(App::new().configure(env.configure())).await;
    let path = format!("/api/orders/{}/payment_intent", order.order_id);
    let (status, _) = send(&app, post_json(&path, Some(BOB), json!({}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(env.gateway.create_calls(), 0);
    env.tear_down().await;
}

#[actix_web::test]
async fn payment_intent_for_a_paid_order() {
    let env = TestEnv::new().await;
    let order = env.order_for(ALICE, "49.99").await;
    env.api().simulate_payment(&order.order_id).await.unwrap();
    let app = test::init_service(App::new().configure(env.configure())).await;
    let path = format!("/api/orders/{}/payment_intent", order.order_id);
    let (status, body) = send(&app, post_json(&path, Some(ALICE), json!({}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains("Paid"), "was: {body}");
    env.tear_down().await;
}

#[actix_web::test]
async fn payment_processor_outage() {
    let env = TestEnv::new().await;
    let order = env.order_for(ALICE, "49.99").await;
    env.gateway.set_unavailable(true);
    let app = test::init_service(App::new().configure(env.configure())).await;
    let path = format!("/api/orders/{}/payment_intent", order.order_id);
    let (status, body) = send(&app, post_json(&path, Some(ALICE), json!({}))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body.contains("try again"), "was: {body}");
    assert!(!body.contains("switched off"), "gateway details leaked: {body}");
    let stored = env.db.fetch_order(&order.order_id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatusType::Pending);
    assert!(stored.intent_id.is_none());
    env.tear_down().await;
}
