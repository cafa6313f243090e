pub mod order_log;
pub mod stripe;
