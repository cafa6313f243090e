use actix_web::{http::StatusCode, test, test::TestRequest, web::ServiceConfig, App};
use checkout_engine::{
    db_types::{Cents, OrderId, OrderStatusType, PaymentStatus},
    events::{EventProducers, StatusFeed},
    test_utils::fake_gateway::{FakeGateway, FAKE_SIGNATURE},
    traits::{OrderPaymentDatabase, StoreError},
    OrderFlowApi,
};
use serde_json::json;

use super::{
    helpers::{configure_order_flow, get, post_json, send, TestEnv, ALICE},
    mocks::MockCheckoutDb,
};

fn webhook(body: Vec<u8>, signature: Option<&str>) -> actix_http::Request {
    let mut req = TestRequest::post().uri("/webhook/stripe").set_payload(body);
    if let Some(sig) = signature {
        req = req.insert_header(("Stripe-Signature", sig));
    }
    req.to_request()
}

#[actix_web::test]
async fn successful_payment() {
    let env = TestEnv::new().await;
    let order = env.order_for(ALICE, "49.99").await;
    let app = test::init_service(App::new().configure(env.configure())).await;
    let body = FakeGateway::succeeded_body("evt_1", &order.order_id, order.total);
    let (status, body) = send(&app, webhook(body, Some(FAKE_SIGNATURE))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"received":true}"#);
    let stored = env.db.fetch_order(&order.order_id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatusType::Paid);
    let payment = env.db.fetch_payment_for_order(&order.order_id).await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::Success);
    env.tear_down().await;
}

#[actix_web::test]
async fn failed_payment() {
    let env = TestEnv::new().await;
    let order = env.order_for(ALICE, "49.99").await;
    let app = test::init_service(App::new().configure(env.configure())).await;
    let body = FakeGateway::failed_body("evt_1", &order.order_id, order.total);
    let (status, _) = send(&app, webhook(body, Some(FAKE_SIGNATURE))).await;
    assert_eq!(status, StatusCode::OK);
    let stored = env.db.fetch_order(&order.order_id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatusType::Cancelled);
    env.tear_down().await;
}

#[actix_web::test]
async fn bad_signatures_are_rejected() {
    let env = TestEnv::new().await;
    let order = env.order_for(ALICE, "49.99").await;
    let app = test::init_service(App::new().configure(env.configure())).await;
    let body = FakeGateway::succeeded_body("evt_1", &order.order_id, order.total);

    let (status, text) = send(&app, webhook(body.clone(), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(text.contains("Missing Stripe-Signature"), "was: {text}");

    let (status, _) = send(&app, webhook(body, Some("t=1,v1=deadbeef"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let stored = env.db.fetch_order(&order.order_id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatusType::Pending);
    assert!(!env.db.gateway_event_exists("evt_1").await.unwrap());
    env.tear_down().await;
}

#[actix_web::test]
async fn duplicates_are_acknowledged() {
    let env = TestEnv::new().await;
    let order = env.order_for(ALICE, "49.99").await;
    let app = test::init_service(App::new().configure(env.configure())).await;
    let body = FakeGateway::succeeded_body("evt_1", &order.order_id, order.total);
    let (first, _) = send(&app, webhook(body.clone(), Some(FAKE_SIGNATURE))).await;
    let (second, text) = send(&app, webhook(body, Some(FAKE_SIGNATURE))).await;
    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::OK);
    assert_eq!(text, r#"{"received":true}"#);

    // A late failure for an already paid order changes nothing
    let body = FakeGateway::failed_body("evt_2", &order.order_id, order.total);
    let (status, _) = send(&app, webhook(body, Some(FAKE_SIGNATURE))).await;
    assert_eq!(status, StatusCode::OK);
    let stored = env.db.fetch_order(&order.order_id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatusType::Paid);
    env.tear_down().await;
}

#[actix_web::test]
async fn unusable_events_are_acknowledged() {
    let env = TestEnv::new().await;
    let order = env.order_for(ALICE, "49.99").await;
    let app = test::init_service(App::new().configure(env.configure())).await;

    let unknown = FakeGateway::succeeded_body("evt_1", &OrderId::from("no-such-order"), Cents::from(4999));
    let no_metadata = FakeGateway::event_body("evt_2", "succeeded", None, Cents::from(4999), "usd");
    let wrong_amount = FakeGateway::succeeded_body("evt_3", &order.order_id, Cents::from(1));
    let other_kind = FakeGateway::event_body("evt_4", "refunded", Some(&order.order_id), order.total, "usd");
    let garbage = b"{ definitely not an event".to_vec();
    for body in [unknown, no_metadata, wrong_amount, other_kind, garbage] {
        let (status, _) = send(&app, webhook(body, Some(FAKE_SIGNATURE))).await;
        assert_eq!(status, StatusCode::OK);
    }
    let stored = env.db.fetch_order(&order.order_id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatusType::Pending);
    assert!(env.db.fetch_payment_for_order(&order.order_id).await.unwrap().is_none());
    env.tear_down().await;
}

#[actix_web::test]
async fn datastore_failure_asks_for_a_retry() {
    let mut db = MockCheckoutDb::new();
    db.expect_gateway_event_exists().returning(|_| Err(StoreError::DatabaseError("database is locked".into())));
    db.expect_apply_payment_outcome().never();
    let api = OrderFlowApi::new(db, FakeGateway::default(), EventProducers::default(), StatusFeed::default());
    let app = test::init_service(App::new().configure(move |cfg: &mut ServiceConfig| configure_order_flow(cfg, api, false))).await;
    let body = FakeGateway::succeeded_body("evt_1", &OrderId::from("o1"), Cents::from(4999));
    let (status, text) = send(&app, webhook(body, Some(FAKE_SIGNATURE))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(text.contains("try again"), "was: {text}");
    assert!(!text.contains("database is locked"), "datastore details leaked: {text}");
}

#[actix_web::test]
async fn datastore_failure_on_fetch() {
    let mut db = MockCheckoutDb::new();
    db.expect_fetch_order().returning(|_| Err(StoreError::DatabaseError("disk I/O error".into())));
    let api = OrderFlowApi::new(db, FakeGateway::default(), EventProducers::default(), StatusFeed::default());
    let app = test::init_service(App::new().configure(move |cfg: &mut ServiceConfig| configure_order_flow(cfg, api, false))).await;
    let (status, body) = send(&app, get("/api/orders/o1", Some(ALICE))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body.contains("disk I/O"), "datastore details leaked: {body}");
}

#[actix_web::test]
async fn simulated_payment() {
    let env = TestEnv::new().await;
    let order = env.order_for(ALICE, "49.99").await;
    let app = test::init_service(App::new().configure(env.configure())).await;
    let (status, body) =
        send(&app, post_json("/dev/simulate_payment", None, json!({ "orderId": order.order_id }))).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(body.contains(r#""success":true"#), "was: {body}");
    let stored = env.db.fetch_order(&order.order_id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatusType::Paid);

    // Simulating twice is a duplicate, not a second payment
    let (status, body) =
        send(&app, post_json("/dev/simulate_payment", None, json!({ "order_id": order.order_id }))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""success":false"#), "was: {body}");

    let (status, _) = send(&app, post_json("/dev/simulate_payment", None, json!({ "order_id": "nope" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    env.tear_down().await;
}

#[actix_web::test]
async fn simulator_is_not_mounted_outside_dev_mode() {
    let env = TestEnv::new().await;
    let order = env.order_for(ALICE, "49.99").await;
    let app = test::init_service(App::new().configure(env.configure_with(false))).await;
    let (status, _) =
        send(&app, post_json("/dev/simulate_payment", None, json!({ "orderId": order.order_id }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let stored = env.db.fetch_order(&order.order_id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatusType::Pending);
    // The rest of the app is unaffected
    let (status, _) = send(&app, get(&format!("/api/orders/{}", order.order_id), Some(ALICE))).await;
    assert_eq!(status, StatusCode::OK);
    env.tear_down().await;
}
