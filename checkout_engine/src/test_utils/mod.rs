//! Helpers for testing against the checkout engine: throwaway SQLite databases and a deterministic payment gateway.
pub mod fake_gateway;
pub mod prepare_env;
