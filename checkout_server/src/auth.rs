//! Bearer token authentication.
//!
//! Access tokens are HS256 JWTs issued by the storefront's identity provider. The server never issues tokens in
//! production; it only verifies them. The `sub` claim is the customer's email address, and orders are owned by it.
//!
//! Handlers that need an authenticated customer simply take a [`JwtClaims`] argument. The extractor looks for
//! `Authorization: Bearer <token>` and verifies it with the [`TokenAuthority`] registered as app data.
use actix_web::{dev::Payload, http::header::AUTHORIZATION, web, FromRequest, HttpRequest};
use chrono::{Duration, Utc};
use futures::future::{ready, Ready};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// The customer's email address
    pub sub: String,
    /// Expiry, as a unix timestamp
    pub exp: i64,
}

#[derive(Clone)]
pub struct TokenAuthority {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenAuthority {
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.jwt_secret.reveal().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    pub fn verify(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let data = decode::<JwtClaims>(token, &self.decoding_key, &self.validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
                AuthError::PoorlyFormattedToken(e.to_string())
            },
            _ => AuthError::ValidationError(e.to_string()),
        })?;
        Ok(data.claims)
    }

    /// Signs a token for `email`, valid for `duration`. Used by tests and local tooling in place of the identity
    /// provider.
    pub fn issue_token(&self, email: &str, duration: Duration) -> Result<String, AuthError> {
        let claims = JwtClaims { sub: email.to_string(), exp: (Utc::now() + duration).timestamp() };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::ValidationError(e.to_string()))
    }
}

impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(claims_from_request(req))
    }
}

fn claims_from_request(req: &HttpRequest) -> Result<JwtClaims, ServerError> {
    let authority = req.app_data::<web::Data<TokenAuthority>>().ok_or_else(|| {
        error!("🔐️ No TokenAuthority has been registered with the app. All authenticated routes will fail.");
        AuthError::MisconfiguredAuthority
    })?;
    let header = req.headers().get(AUTHORIZATION).ok_or(AuthError::MissingToken)?;
    let value = header.to_str().map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))?;
    let token = value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AuthError::PoorlyFormattedToken("Expected 'Bearer <token>'".to_string()))?;
    let claims = authority.verify(token).map_err(|e| {
        debug!("🔐️ Rejected access token. {e}");
        e
    })?;
    trace!("🔐️ Authenticated {}", claims.sub);
    Ok(claims)
}
