use checkout_engine::{
    db_types::OrderId,
    events::{EventProducers, StatusFeed},
    order_objects::EventOutcome,
    test_utils::{
        fake_gateway::FakeGateway,
        prepare_env::{create_database, random_db_path, run_migrations},
    },
    OrderFlowApi,
    OrderFlowError,
    SqliteDatabase,
};
use cucumber::World;
use log::*;

#[derive(Default, Debug, World)]
pub struct CheckoutWorld {
    pub system: Option<CheckoutSystem>,
    pub current_order: Option<OrderId>,
    pub last_outcome: Option<EventOutcome>,
    pub last_error: Option<OrderFlowError>,
}

#[derive(Debug)]
pub struct CheckoutSystem {
    pub db_path: String,
    pub api: OrderFlowApi<SqliteDatabase, FakeGateway>,
}

impl CheckoutWorld {
    pub fn api(&self) -> &OrderFlowApi<SqliteDatabase, FakeGateway> {
        &self.system.as_ref().expect("OrderFlowApi not initialised").api
    }

    pub fn order_id(&self) -> OrderId {
        self.current_order.clone().expect("No order has been placed")
    }
}

impl CheckoutSystem {
    pub async fn new() -> Self {
        let url = random_db_path();
        create_database(&url).await;
        run_migrations(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 1).await.expect("Error creating connection to database");
        debug!("Created database: {url}");
        let api = OrderFlowApi::new(db, FakeGateway::default(), EventProducers::default(), StatusFeed::default());
        Self { db_path: url, api }
    }
}
