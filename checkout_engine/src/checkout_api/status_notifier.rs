//! Status subscriptions for clients waiting on a payment.
//!
//! A subscription first yields the order's current status and then one item per change in the derived status
//! (`PENDING`, `SUCCESS` or `FAILED`). Changes are pushed through the [`StatusFeed`]. A periodic re-read of the
//! database catches changes committed by another process, and recovers from a lagging feed receiver. The stream ends
//! after a final status, or after a single `OrderNotFound` error for an unknown order.
use std::time::Duration;

use futures_util::{stream, Stream};
use log::*;
use tokio::{
    sync::broadcast::{error::RecvError, Receiver},
    time::{interval_at, Instant, Interval, MissedTickBehavior},
};

use crate::{
    checkout_api::errors::OrderFlowError,
    db_types::{OrderId, PaymentStatus},
    events::{OrderPaymentStatus, StatusFeed},
    traits::OrderPaymentDatabase,
};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Reads the current order status and payment status. A missing payment record counts as `Pending`.
pub async fn current_status<B: OrderPaymentDatabase>(
    db: &B,
    order_id: &OrderId,
) -> Result<OrderPaymentStatus, OrderFlowError> {
    let order = db.fetch_order(order_id).await?.ok_or_else(|| OrderFlowError::OrderNotFound(order_id.clone()))?;
    let payment_status = db.fetch_payment_for_order(order_id).await?.map(|p| p.status).unwrap_or_default();
    Ok(OrderPaymentStatus::new(order.order_id, order.status, payment_status))
}

#[derive(Clone)]
pub struct StatusNotifier<B> {
    db: B,
    feed: StatusFeed,
    poll_interval: Duration,
}

impl<B> StatusNotifier<B>
where B: OrderPaymentDatabase + 'static
{
    pub fn new(db: B, feed: StatusFeed, poll_interval: Duration) -> Self {
        Self { db, feed, poll_interval: poll_interval.max(MIN_POLL_INTERVAL) }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Returns an independent status stream for `order_id`. Dropping the stream ends the subscription.
    pub fn subscribe(&self, order_id: OrderId) -> impl Stream<Item = Result<OrderPaymentStatus, OrderFlowError>> {
        trace!("📡️ New status subscription for order [{order_id}]");
        let subscription = Subscription {
            db: self.db.clone(),
            order_id,
            // Subscribe before the first read so that no change can slip in between
            receiver: Some(self.feed.receiver()),
            ticker: None,
            poll_interval: self.poll_interval,
            last: None,
            finished: false,
        };
        stream::unfold(subscription, |mut sub| async move {
            let item = sub.next_update().await?;
            Some((item, sub))
        })
    }
}

enum Wake {
    Feed(Result<OrderPaymentStatus, RecvError>),
    Tick,
}

struct Subscription<B> {
    db: B,
    order_id: OrderId,
    receiver: Option<Receiver<OrderPaymentStatus>>,
    ticker: Option<Interval>,
    poll_interval: Duration,
    last: Option<PaymentStatus>,
    finished: bool,
}

impl<B: OrderPaymentDatabase> Subscription<B> {
    async fn next_update(&mut self) -> Option<Result<OrderPaymentStatus, OrderFlowError>> {
        if self.finished {
            return None;
        }
        if self.last.is_none() {
            return match current_status(&self.db, &self.order_id).await {
                Ok(status) => Some(Ok(self.emit(status))),
                Err(e) => {
                    debug!("📡️ Status subscription for order [{}] ends: {e}", self.order_id);
                    self.finished = true;
                    Some(Err(e))
                },
            };
        }
        loop {
            let wake = {
                let period = self.poll_interval;
                let ticker = self.ticker.get_or_insert_with(|| {
                    let mut t = interval_at(Instant::now() + period, period);
                    t.set_missed_tick_behavior(MissedTickBehavior::Delay);
                    t
                });
                tokio::select! {
                    msg = recv_or_pending(&mut self.receiver) => Wake::Feed(msg),
                    _ = ticker.tick() => Wake::Tick,
                }
            };
            let candidate = match wake {
                Wake::Feed(Ok(status)) if status.order_id == self.order_id => Some(status),
                Wake::Feed(Ok(_)) => None,
                Wake::Feed(Err(RecvError::Lagged(n))) => {
                    debug!("📡️ Subscriber for order [{}] missed {n} changes. Re-reading status.", self.order_id);
                    self.recheck().await
                },
                Wake::Feed(Err(RecvError::Closed)) => {
                    debug!("📡️ Status feed closed. Falling back to polling for order [{}]", self.order_id);
                    self.receiver = None;
                    None
                },
                Wake::Tick => self.recheck().await,
            };
            if let Some(status) = candidate {
                if Some(status.derived_status()) != self.last {
                    return Some(Ok(self.emit(status)));
                }
            }
        }
    }

    fn emit(&mut self, status: OrderPaymentStatus) -> OrderPaymentStatus {
        self.last = Some(status.derived_status());
        if status.is_terminal() {
            trace!("📡️ Order [{}] reached a final status. Closing subscription.", self.order_id);
            self.finished = true;
        }
        status
    }

    async fn recheck(&self) -> Option<OrderPaymentStatus> {
        match current_status(&self.db, &self.order_id).await {
            Ok(status) => Some(status),
            Err(e) => {
                warn!("📡️ Could not re-read status for order [{}]: {e}", self.order_id);
                None
            },
        }
    }
}

async fn recv_or_pending(receiver: &mut Option<Receiver<OrderPaymentStatus>>) -> Result<OrderPaymentStatus, RecvError> {
    match receiver {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
