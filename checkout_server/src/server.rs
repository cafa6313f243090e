use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, web::ServiceConfig, App, HttpServer};
use checkout_engine::{
    events::{EventProducers, StatusFeed},
    OrderFlowApi,
    OrderPaymentDatabase,
    PaymentGateway,
    SqliteDatabase,
    StatusNotifier,
};
use log::*;

use crate::{
    auth::TokenAuthority,
    config::ServerConfig,
    data_objects::CheckoutSettings,
    errors::ServerError,
    integrations::{order_log::create_order_log_handlers, stripe::StripeGateway},
    routes::{
        health,
        CreateOrderRoute,
        OrderByIdRoute,
        OrderStatusRoute,
        PaymentIntentRoute,
        SimulatePaymentRoute,
        StripeWebhookRoute,
    },
};

pub const ACCESS_LOG_TARGET: &str = "checkout::access_log";

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(format!("Migrations failed. {e}")))?;
    info!("🗃️ Database at {} is up to date", config.database_url);
    let gateway = StripeGateway::new(config.stripe.clone())
        .map_err(|e| ServerError::ConfigurationError(format!("Could not create the Stripe client. {e}")))?;
    let handlers = create_order_log_handlers();
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let srv = create_server_instance(config, db, gateway, producers)?;
    srv.await.map_err(ServerError::IOError)
}

/// Builds the HTTP server. Every worker shares the same database pool, gateway client and status feed, so a change
/// applied by one worker reaches status streams served by the others.
pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    gateway: StripeGateway,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let feed = StatusFeed::default();
    let authority = TokenAuthority::new(&config.auth);
    let settings = CheckoutSettings { currency: config.currency.clone() };
    let dev_mode = config.dev_mode;
    let poll_interval = config.status_poll_interval;
    let srv = HttpServer::new(move || {
        let orders_api = OrderFlowApi::new(db.clone(), gateway.clone(), producers.clone(), feed.clone());
        let notifier = StatusNotifier::new(db.clone(), feed.clone(), poll_interval);
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target(ACCESS_LOG_TARGET))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(notifier))
            .app_data(web::Data::new(authority.clone()))
            .app_data(web::Data::new(settings.clone()))
            .configure(|cfg| configure_routes::<SqliteDatabase, StripeGateway>(cfg, dev_mode))
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Registers every route. The handlers expect `OrderFlowApi<B, G>`, `StatusNotifier<B>`, `TokenAuthority` and
/// `CheckoutSettings` in the app data. The payment simulator is only mounted when `dev_mode` is set.
pub fn configure_routes<B, G>(cfg: &mut ServiceConfig, dev_mode: bool)
where
    B: OrderPaymentDatabase + 'static,
    G: PaymentGateway + 'static,
{
    let api_scope = web::scope("/api")
        .service(CreateOrderRoute::<B, G>::new())
        .service(OrderByIdRoute::<B, G>::new())
        .service(PaymentIntentRoute::<B, G>::new())
        .service(OrderStatusRoute::<B>::new());
    cfg.service(health).service(api_scope).service(StripeWebhookRoute::<B, G>::new());
    if dev_mode {
        cfg.service(SimulatePaymentRoute::<B, G>::new());
    }
}
