mod channel;
mod event_types;
mod hooks;
mod status_feed;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::*;
pub use hooks::{EventHandlers, EventHooks, EventProducers};
pub use status_feed::StatusFeed;
