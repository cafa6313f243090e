use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Client,
    Method,
};
use serde::de::DeserializeOwned;

use crate::{config::StripeConfig, NewPaymentIntent, StripeApiError, StripePaymentIntent, WebhookVerifier};

#[derive(Clone)]
pub struct StripeApi {
    config: StripeConfig,
    client: Arc<Client>,
}

impl StripeApi {
    pub fn new(config: StripeConfig) -> Result<Self, StripeApiError> {
        let mut headers = HeaderMap::with_capacity(1);
        let mut val = HeaderValue::from_str(&format!("Bearer {}", config.secret_key.reveal()))
            .map_err(|e| StripeApiError::Initialization(e.to_string()))?;
        val.set_sensitive(true);
        headers.insert(AUTHORIZATION, val);
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| StripeApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_url.trim_end_matches('/'))
    }

    pub fn webhook_verifier(&self) -> WebhookVerifier {
        WebhookVerifier::new(self.config.webhook_secret.clone(), self.config.webhook_tolerance)
    }

    async fn rest_query<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        form: Option<&[(String, String)]>,
        idempotency_key: Option<&str>,
    ) -> Result<T, StripeApiError> {
        let url = self.url(path);
        trace!("💳️ Sending Stripe request: {method} {url}");
        let mut req = self.client.request(method, url);
        if let Some(key) = idempotency_key {
            req = req.header("Idempotency-Key", key);
        }
        if let Some(form) = form {
            req = req.form(form);
        }
        let response = req.send().await.map_err(|e| StripeApiError::RequestFailed(e.to_string()))?;
        if response.status().is_success() {
            trace!("💳️ Stripe request successful. {}", response.status());
            response.json::<T>().await.map_err(|e| StripeApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| StripeApiError::RequestFailed(e.to_string()))?;
            Err(StripeApiError::QueryError { status, message })
        }
    }

    pub async fn create_payment_intent(&self, intent: &NewPaymentIntent) -> Result<StripePaymentIntent, StripeApiError> {
        debug!(
            "💳️ Creating payment intent for {} {} (key {})",
            intent.amount, intent.currency, intent.idempotency_key
        );
        let params = intent.form_params();
        let result = self
            .rest_query::<StripePaymentIntent>(
                Method::POST,
                "/v1/payment_intents",
                Some(&params),
                Some(&intent.idempotency_key),
            )
            .await?;
        info!("💳️ Payment intent {} ready for key {}", result.id, intent.idempotency_key);
        Ok(result)
    }

    pub async fn retrieve_payment_intent(&self, intent_id: &str) -> Result<StripePaymentIntent, StripeApiError> {
        debug!("💳️ Fetching payment intent {intent_id}");
        let path = format!("/v1/payment_intents/{intent_id}");
        self.rest_query::<StripePaymentIntent>(Method::GET, &path, None, None).await
    }
}
