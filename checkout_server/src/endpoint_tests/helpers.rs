use std::time::Duration;

use actix_http::Request;
use actix_web::{
    body::MessageBody,
    dev::{Service, ServiceResponse},
    http::StatusCode,
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
};
use checkout_engine::{
    db_types::{Cents, NewOrder, NewOrderItem, Order, ShippingDetails},
    events::{EventProducers, StatusFeed},
    test_utils::{
        fake_gateway::FakeGateway,
        prepare_env::{drop_database, new_test_database},
    },
    traits::{OrderPaymentDatabase, PaymentGateway},
    OrderFlowApi,
    SqliteDatabase,
    StatusNotifier,
};
use log::debug;

use crate::{
    auth::TokenAuthority,
    config::AuthConfig,
    data_objects::CheckoutSettings,
    server::configure_routes,
};

pub const TEST_JWT_SECRET: &str = "endpoint-test-secret. DO NOT re-use anywhere";
pub const ALICE: &str = "alice@example.com";
pub const BOB: &str = "bob@example.com";

pub fn authority() -> TokenAuthority {
    TokenAuthority::new(&AuthConfig::new(TEST_JWT_SECRET))
}

pub fn bearer(email: &str) -> (&'static str, String) {
    let token = authority().issue_token(email, chrono::Duration::hours(1)).expect("Failed to sign token");
    ("Authorization", format!("Bearer {token}"))
}

/// A real (throwaway) SQLite database behind the in-memory fake gateway.
pub struct TestEnv {
    pub db: SqliteDatabase,
    pub gateway: FakeGateway,
    pub feed: StatusFeed,
}

impl TestEnv {
    pub async fn new() -> Self {
        let db = new_test_database().await;
        Self { db, gateway: FakeGateway::default(), feed: StatusFeed::default() }
    }

    /// An order flow sharing this environment's database, gateway and status feed.
    pub fn api(&self) -> OrderFlowApi<SqliteDatabase, FakeGateway> {
        OrderFlowApi::new(self.db.clone(), self.gateway.clone(), EventProducers::default(), self.feed.clone())
    }

    /// The full app, with development routes mounted.
    pub fn configure(&self) -> impl FnOnce(&mut ServiceConfig) + 'static {
        self.configure_with(true)
    }

    pub fn configure_with(&self, dev_mode: bool) -> impl FnOnce(&mut ServiceConfig) + 'static {
        let api = self.api();
        let notifier = StatusNotifier::new(self.db.clone(), self.feed.clone(), Duration::from_millis(100));
        move |cfg: &mut ServiceConfig| {
            cfg.app_data(web::Data::new(notifier));
            configure_order_flow(cfg, api, dev_mode);
        }
    }

    pub async fn order_for(&self, customer: &str, price: &str) -> Order {
        let price: Cents = price.parse().expect("Invalid price");
        let order = NewOrder::new(customer.into(), vec![NewOrderItem::new("sku-1", 1, price)], shipping_for(customer));
        self.api().create_order(order).await.expect("Error creating order")
    }

    pub async fn tear_down(self) {
        drop_database(self.db).await;
    }
}

/// Registers the server's routes against `api`, together with the app data the handlers expect. The status route
/// also needs a `StatusNotifier<B>`, which callers register themselves.
pub fn configure_order_flow<B, G>(cfg: &mut ServiceConfig, api: OrderFlowApi<B, G>, dev_mode: bool)
where
    B: OrderPaymentDatabase + 'static,
    G: PaymentGateway + 'static,
{
    cfg.app_data(web::Data::new(api))
        .app_data(web::Data::new(authority()))
        .app_data(web::Data::new(CheckoutSettings { currency: "usd".into() }));
    configure_routes::<B, G>(cfg, dev_mode);
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

pub async fn send<S, B>(app: &S, req: Request) -> (StatusCode, String)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let res = test::call_service(app, req).await;
    let status = res.status();
    let body = test::read_body(res).await;
    let body = String::from_utf8_lossy(&body).into_owned();
    debug!("🚀️ Response: {status} {body}");
    (status, body)
}

pub fn get(path: &str, user: Option<&str>) -> Request {
    let mut req = TestRequest::get().uri(path);
    if let Some(user) = user {
        req = req.insert_header(bearer(user));
    }
    req.to_request()
}

pub fn post_json(path: &str, user: Option<&str>, body: serde_json::Value) -> Request {
    let mut req = TestRequest::post().uri(path).set_json(body);
    if let Some(user) = user {
        req = req.insert_header(bearer(user));
    }
    req.to_request()
}
