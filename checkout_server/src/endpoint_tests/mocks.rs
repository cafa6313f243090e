use checkout_engine::{
    db_types::{Cents, NewOrder, Order, OrderId, OrderItem, Payment, PaymentOutcome},
    traits::{OrderPaymentDatabase, StoreError, TransitionResult},
};
use mockall::mock;

mock! {
    pub CheckoutDb {}
    impl Clone for CheckoutDb {
        fn clone(&self) -> Self;
    }
    impl OrderPaymentDatabase for CheckoutDb {
        fn url(&self) -> &str;
        async fn insert_order(&self, order: NewOrder) -> Result<Order, StoreError>;
        async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, StoreError>;
        async fn fetch_order_items(&self, order_id: &OrderId) -> Result<Vec<OrderItem>, StoreError>;
        async fn fetch_payment_for_order(&self, order_id: &OrderId) -> Result<Option<Payment>, StoreError>;
        async fn attach_payment_intent(&self, order_id: &OrderId, intent_id: &str, amount: Cents, currency: &str) -> Result<Payment, StoreError>;
        async fn apply_payment_outcome(&self, event_id: &str, outcome: &PaymentOutcome) -> Result<TransitionResult, StoreError>;
        async fn gateway_event_exists(&self, event_id: &str) -> Result<bool, StoreError>;
    }
}
