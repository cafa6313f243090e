//! Request handler definitions
//!
//! Define each route and its handler here. Handlers stay thin: they authenticate, translate the request into a call
//! on [`OrderFlowApi`] or [`StatusNotifier`], and translate the result back into a response. All order and payment
//! rules live in the engine.
//!
//! Handlers must never block the worker thread. Every database and payment processor call is awaited.
use actix_web::{
    get,
    http::header::{CACHE_CONTROL, CONTENT_TYPE},
    web,
    HttpRequest,
    HttpResponse,
    Responder,
};
use bytes::Bytes;
use checkout_engine::{
    db_types::OrderId,
    events::OrderPaymentStatus,
    traits::{OrderPaymentDatabase, PaymentGateway},
    OrderFlowApi,
    OrderFlowError,
    StatusNotifier,
};
use futures::StreamExt;
use log::*;

use crate::{
    auth::JwtClaims,
    data_objects::{CheckoutSettings, JsonResponse, NewOrderRequest, SimulatePaymentRequest, StatusMessage, WebhookAck},
    errors::ServerError,
};

pub const STRIPE_SIGNATURE_HEADER: &str = "Stripe-Signature";

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

// ----------------------------------------------   Orders  ----------------------------------------------------
route!(create_order => Post "/orders" impl OrderPaymentDatabase, PaymentGateway);
/// Creates a pending order from a finalized cart. The order is owned by the authenticated customer.
///
/// Prices are given in major units (`"19.99"` or `19.99`) and stored exactly in cents.
pub async fn create_order<B, G>(
    claims: JwtClaims,
    body: web::Json<NewOrderRequest>,
    settings: web::Data<CheckoutSettings>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderPaymentDatabase,
    G: PaymentGateway,
{
    debug!("💻️ POST new order for {}", claims.sub);
    let order = body.into_inner().into_new_order(&claims.sub, &settings.currency).map_err(ServerError::InvalidOrder)?;
    let order = api.create_order(order).await?;
    Ok(HttpResponse::Created().json(order))
}

route!(order_by_id => Get "/orders/{order_id}" impl OrderPaymentDatabase, PaymentGateway);
pub async fn order_by_id<B, G>(
    claims: JwtClaims,
    path: web::Path<OrderId>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderPaymentDatabase,
    G: PaymentGateway,
{
    let order_id = path.into_inner();
    debug!("💻️ GET order [{order_id}] for {}", claims.sub);
    let order = api.fetch_order(&order_id, &claims.sub).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(payment_intent => Post "/orders/{order_id}/payment_intent" impl OrderPaymentDatabase, PaymentGateway);
/// Returns the payment intent for a pending order, creating it at the payment processor the first time.
///
/// Calling this repeatedly is safe. The same intent is returned every time.
pub async fn payment_intent<B, G>(
    claims: JwtClaims,
    path: web::Path<OrderId>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderPaymentDatabase,
    G: PaymentGateway,
{
    let order_id = path.into_inner();
    debug!("💻️ POST payment intent for order [{order_id}] by {}", claims.sub);
    let intent = api.request_payment_intent(&order_id, &claims.sub).await?;
    Ok(HttpResponse::Ok().json(intent))
}

route!(order_status => Get "/orders/{order_id}/status" impl OrderPaymentDatabase);
/// A Server-Sent Events stream of the order's payment status.
///
/// The current status is sent immediately, then again each time it changes. The stream closes after `SUCCESS` or
/// `FAILED`. For an unknown order a single error message is sent before the stream closes.
pub async fn order_status<B>(
    path: web::Path<OrderId>,
    notifier: web::Data<StatusNotifier<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderPaymentDatabase + 'static,
{
    let order_id = path.into_inner();
    debug!("💻️ GET status stream for order [{order_id}]");
    let events = notifier.subscribe(order_id).map(|update| Ok::<_, ServerError>(sse_message(update)));
    Ok(HttpResponse::Ok()
        .insert_header((CONTENT_TYPE, "text/event-stream"))
        .insert_header((CACHE_CONTROL, "no-cache"))
        .streaming(events))
}

fn sse_message(update: Result<OrderPaymentStatus, OrderFlowError>) -> Bytes {
    let payload = match update {
        Ok(status) => serde_json::to_string(&StatusMessage::from(&status)),
        Err(OrderFlowError::OrderNotFound(_)) => Ok(r#"{"error":"Order not found"}"#.to_string()),
        Err(e) => {
            warn!("💻️ Status stream failed. {e}");
            Ok(r#"{"error":"Status unavailable"}"#.to_string())
        },
    };
    let payload = payload.unwrap_or_else(|e| {
        error!("💻️ Could not serialize status message. {e}");
        r#"{"error":"Status unavailable"}"#.to_string()
    });
    Bytes::from(format!("data: {payload}\n\n"))
}

// ----------------------------------------------   Webhooks  ----------------------------------------------------
route!(stripe_webhook => Post "/webhook/stripe" impl OrderPaymentDatabase, PaymentGateway);
/// Receives Stripe event callbacks.
///
/// The raw body is handed to the engine untouched, since the signature covers the exact bytes that were sent.
/// Anything that was authenticated is acknowledged with a 200, including duplicates and events we can't use, so that
/// Stripe stops retrying. A bad signature gets a 400. Only a datastore failure gets a 500, so that Stripe retries
/// later.
pub async fn stripe_webhook<B, G>(
    req: HttpRequest,
    body: web::Bytes,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderPaymentDatabase,
    G: PaymentGateway,
{
    trace!("💻️ Received Stripe webhook ({} bytes)", body.len());
    let signature = req
        .headers()
        .get(STRIPE_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            warn!("💻️ Stripe webhook arrived without a {STRIPE_SIGNATURE_HEADER} header");
            ServerError::InvalidSignature(format!("Missing {STRIPE_SIGNATURE_HEADER} header"))
        })?;
    let outcome = api.process_gateway_event(&body, signature).await?;
    if outcome.is_applied() {
        info!("💻️ Stripe webhook {outcome}");
    } else {
        debug!("💻️ Stripe webhook acknowledged: {outcome}");
    }
    Ok(HttpResponse::Ok().json(WebhookAck::received()))
}

// ----------------------------------------------   Dev only  ----------------------------------------------------
route!(simulate_payment => Post "/dev/simulate_payment" impl OrderPaymentDatabase, PaymentGateway);
/// Marks an order as paid without going through the payment processor. Only mounted in development mode.
pub async fn simulate_payment<B, G>(
    body: web::Json<SimulatePaymentRequest>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderPaymentDatabase,
    G: PaymentGateway,
{
    let order_id = body.into_inner().order_id;
    let outcome = api.simulate_payment(&order_id).await?;
    let response = if outcome.is_applied() {
        JsonResponse::success(outcome)
    } else {
        JsonResponse::failure(outcome)
    };
    Ok(HttpResponse::Ok().json(response))
}
