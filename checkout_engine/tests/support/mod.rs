#![allow(dead_code)]
use checkout_engine::{
    db_types::{Cents, NewOrder, NewOrderItem, Order, ShippingDetails},
    events::{EventProducers, StatusFeed},
    test_utils::{
        fake_gateway::{FakeGateway, FAKE_SIGNATURE},
        prepare_env::{drop_database, new_test_database},
    },
    OrderFlowApi,
    SqliteDatabase,
};

pub const ALICE: &str = "alice@example.com";
pub const BOB: &str = "bob@example.com";

pub type TestApi = OrderFlowApi<SqliteDatabase, FakeGateway>;

pub async fn setup() -> TestApi {
    setup_with_producers(EventProducers::default()).await
}

pub async fn setup_with_producers(producers: EventProducers) -> TestApi {
    let db = new_test_database().await;
    OrderFlowApi::new(db, FakeGateway::default(), producers, StatusFeed::default())
}

pub async fn tear_down(api: TestApi) {
    drop_database(api.db().clone()).await;
}

pub fn shipping_for(email: &str) -> ShippingDetails {
    ShippingDetails {
        full_name: "Test Customer".into(),
        email: email.into(),
        address: "1 Main St".into(),
        city: "Springfield".into(),
        zip: "12345".into(),
        country: "US".into(),
    }
}

/// Creates a pending order for `customer` with a single item priced at `price` (e.g. "49.99").
pub async fn order_for(api: &TestApi, customer: &str, price: &str) -> Order {
    let price: Cents = price.parse().expect("Invalid price");
    let order = NewOrder::new(customer.into(), vec![NewOrderItem::new("sku-1", 1, price)], shipping_for(customer));
    api.create_order(order).await.expect("Error creating order")
}

pub async fn deliver(api: &TestApi, body: &[u8]) -> checkout_engine::order_objects::EventOutcome {
    api.process_gateway_event(body, FAKE_SIGNATURE).await.expect("Error applying gateway event")
}
