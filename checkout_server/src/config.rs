use std::{env, time::Duration};

use checkout_common::{parse_boolean_flag, Secret, DEFAULT_CURRENCY_CODE};
use checkout_engine::DEFAULT_POLL_INTERVAL;
use log::*;
use stripe_tools::StripeConfig;

const DEFAULT_CHECKOUT_HOST: &str = "127.0.0.1";
const DEFAULT_CHECKOUT_PORT: u16 = 8360;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/checkout.db";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
    /// When true, `POST /dev/simulate_payment` is mounted. Never enable this in production.
    pub dev_mode: bool,
    /// How often status streams re-read the database when no change has been pushed to them.
    pub status_poll_interval: Duration,
    /// The currency new orders are priced in.
    pub currency: String,
    pub stripe: StripeConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_CHECKOUT_HOST.to_string(),
            port: DEFAULT_CHECKOUT_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            auth: AuthConfig::default(),
            dev_mode: false,
            status_poll_interval: DEFAULT_POLL_INTERVAL,
            currency: DEFAULT_CURRENCY_CODE.to_string(),
            stripe: StripeConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("CHECKOUT_HOST").ok().unwrap_or_else(|| DEFAULT_CHECKOUT_HOST.into());
        let port = env::var("CHECKOUT_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for CHECKOUT_PORT. {e} Using the default, {DEFAULT_CHECKOUT_PORT}, \
                         instead."
                    );
                    DEFAULT_CHECKOUT_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_CHECKOUT_PORT);
        let database_url = env::var("CHECKOUT_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ CHECKOUT_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}");
            DEFAULT_DATABASE_URL.to_string()
        });
        let auth = AuthConfig::from_env_or_default();
        let dev_mode = parse_boolean_flag(env::var("CHECKOUT_DEV_MODE").ok(), false);
        if dev_mode {
            warn!("🪛️ Development mode is ON. Payments can be simulated without a payment processor.");
        }
        let status_poll_interval = env::var("CHECKOUT_STATUS_POLL_INTERVAL")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| {
                        error!("🪛️ {s} is not a valid value for CHECKOUT_STATUS_POLL_INTERVAL. {e}");
                    })
                    .ok()
            })
            .map(Duration::from_secs)
            .unwrap_or_else(|| {
                info!("🪛️ Status streams will re-check the database every {}s", DEFAULT_POLL_INTERVAL.as_secs());
                DEFAULT_POLL_INTERVAL
            });
        let currency = env::var("CHECKOUT_CURRENCY")
            .map(|s| s.trim().to_lowercase())
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_CURRENCY_CODE.to_string());
        let stripe = StripeConfig::new_from_env_or_default();
        Self { host, port, database_url, auth, dev_mode, status_poll_interval, currency, stripe }
    }
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The HS256 secret shared with the identity provider that issues access tokens.
    pub jwt_secret: Secret<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        warn!(
            "🪛️ Using the default JWT secret. Every access token the server accepts can be forged. Set \
             CHECKOUT_JWT_SECRET to the secret shared with your identity provider."
        );
        Self { jwt_secret: Secret::new("insecure-default-jwt-secret".to_string()) }
    }
}

impl AuthConfig {
    pub fn new<S: Into<String>>(secret: S) -> Self {
        Self { jwt_secret: Secret::new(secret.into()) }
    }

    pub fn from_env_or_default() -> Self {
        match env::var("CHECKOUT_JWT_SECRET").ok().filter(|s| !s.is_empty()) {
            Some(secret) => Self::new(secret),
            None => {
                error!("🪛️ CHECKOUT_JWT_SECRET is not set.");
                Self::default()
            },
        }
    }
}
