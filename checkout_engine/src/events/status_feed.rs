use log::*;
use tokio::sync::broadcast;

use crate::events::OrderPaymentStatus;

/// An in-process broadcast of committed order status changes.
///
/// The order flow publishes to it after every committed transition, and each status subscriber holds its own receiver.
/// Messages published while nobody is listening are dropped. Subscribers that fall behind re-read the database.
#[derive(Debug, Clone)]
pub struct StatusFeed {
    sender: broadcast::Sender<OrderPaymentStatus>,
}

impl StatusFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn publish(&self, status: OrderPaymentStatus) {
        match self.sender.send(status) {
            Ok(n) => trace!("📡️ Status change sent to {n} subscribers"),
            Err(_) => trace!("📡️ Status change not sent. There are no subscribers"),
        }
    }

    pub fn receiver(&self) -> broadcast::Receiver<OrderPaymentStatus> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for StatusFeed {
    fn default() -> Self {
        Self::new(256)
    }
}
