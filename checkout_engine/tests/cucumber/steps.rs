use checkout_engine::{
    db_types::{Cents, NewOrder, NewOrderItem, OrderStatusType, PaymentStatus, ShippingDetails},
    order_objects::EventOutcome,
    test_utils::fake_gateway::{FakeGateway, FAKE_SIGNATURE},
    OrderFlowError,
    OrderPaymentDatabase,
};
use cucumber::{then, when};

use crate::cucumber::CheckoutWorld;

#[when(expr = "{word} places an order for {word}")]
async fn place_order(world: &mut CheckoutWorld, customer: String, price: String) {
    let price: Cents = price.parse().expect("Invalid price");
    let shipping = ShippingDetails {
        full_name: "Cucumber Customer".into(),
        email: customer.clone(),
        address: "2 Side St".into(),
        city: "Shelbyville".into(),
        zip: "54321".into(),
        country: "US".into(),
    };
    let order = NewOrder::new(customer, vec![NewOrderItem::new("sku-cuke", 1, price)], shipping);
    let order = world.api().create_order(order).await.expect("Error creating order");
    world.current_order = Some(order.order_id);
}

#[when(expr = "{word} requests a payment intent")]
async fn request_intent(world: &mut CheckoutWorld, requester: String) {
    let order_id = world.order_id();
    match world.api().request_payment_intent(&order_id, &requester).await {
        Ok(_) => world.last_error = None,
        Err(e) => world.last_error = Some(e),
    }
}

async fn gateway_reports(world: &mut CheckoutWorld, kind: &str, event_id: &str, signature: &str) {
    let order_id = world.order_id();
    let order = world.api().db().fetch_order(&order_id).await.expect("DB error").expect("Order is missing");
    let body = FakeGateway::event_body(event_id, kind, Some(&order_id), order.total, &order.currency);
    match world.api().process_gateway_event(&body, signature).await {
        Ok(outcome) => {
            world.last_outcome = Some(outcome);
            world.last_error = None;
        },
        Err(e) => {
            world.last_outcome = None;
            world.last_error = Some(e);
        },
    }
}

#[when(expr = "the gateway reports payment {word} with event {word}")]
async fn gateway_event(world: &mut CheckoutWorld, kind: String, event_id: String) {
    gateway_reports(world, &kind, &event_id, FAKE_SIGNATURE).await;
}

#[when(expr = "a forged webhook reports payment {word} with event {word}")]
async fn forged_event(world: &mut CheckoutWorld, kind: String, event_id: String) {
    gateway_reports(world, &kind, &event_id, "forged").await;
}

#[then(expr = "the order status is {word}")]
async fn check_order_status(world: &mut CheckoutWorld, status: String) {
    let expected: OrderStatusType = status.parse().expect("Invalid order status");
    let current = world.api().get_status(&world.order_id()).await.expect("Error fetching status");
    assert_eq!(current.order_status, expected);
}

#[then(expr = "the payment status is {word}")]
async fn check_payment_status(world: &mut CheckoutWorld, status: String) {
    let expected: PaymentStatus = status.parse().expect("Invalid payment status");
    let current = world.api().get_status(&world.order_id()).await.expect("Error fetching status");
    assert_eq!(current.payment_status, expected);
}

#[then(expr = "the order has {int} payment record(s)")]
async fn check_payment_records(world: &mut CheckoutWorld, count: i64) {
    let order_id = world.order_id();
    let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM payments WHERE order_id = $1")
        .bind(order_id.as_str())
        .fetch_one(world.api().db().pool())
        .await
        .expect("Error counting payments");
    assert_eq!(n, count);
}

#[then(expr = "the order has an intent id")]
async fn check_intent_id(world: &mut CheckoutWorld) {
    let order = world.api().db().fetch_order(&world.order_id()).await.expect("DB error").expect("Order is missing");
    assert!(order.intent_id.is_some(), "Order has no intent id");
}

#[then(expr = "the gateway has created {int} intent(s)")]
async fn check_intents(world: &mut CheckoutWorld, count: usize) {
    assert_eq!(world.api().gateway().intent_count(), count);
}

#[then(expr = "the event was a duplicate")]
async fn check_duplicate(world: &mut CheckoutWorld) {
    assert!(matches!(world.last_outcome, Some(EventOutcome::Duplicate { .. })), "{:?}", world.last_outcome);
}

#[then(expr = "the request fails with {word}")]
async fn check_error(world: &mut CheckoutWorld, error: String) {
    let err = world.last_error.as_ref().expect("The request did not fail");
    let matched = match error.as_str() {
        "Unauthorized" => matches!(err, OrderFlowError::Unauthorized(_)),
        "OrderAlreadyProcessed" => matches!(err, OrderFlowError::OrderAlreadyProcessed(..)),
        "InvalidSignature" => matches!(err, OrderFlowError::InvalidSignature(_)),
        "OrderNotFound" => matches!(err, OrderFlowError::OrderNotFound(_)),
        other => panic!("Unknown error name in feature file: {other}"),
    };
    assert!(matched, "Expected {error}, got {err:?}");
}
