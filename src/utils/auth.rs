use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::entities::users;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Claims carried by a short-lived access token.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AccessClaims {
    pub typ: TokenKind,
    pub sub: String, // user_id
    pub email: String,
    pub username: String,
    pub full_name: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

/// Claims carried by a long-lived refresh token. Only the subject is embedded;
/// everything else is looked up from the user record on rotation.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RefreshClaims {
    pub typ: TokenKind,
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

fn expiry_from(ttl: Duration) -> Result<(i64, i64)> {
    let now = Utc::now();
    let exp = now
        .checked_add_signed(ttl)
        .context("token expiry overflows")?
        .timestamp();
    Ok((now.timestamp(), exp))
}

fn validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "sub"]);
    validation
}

pub fn create_access_token(user: &users::Model, secret: &str, ttl: Duration) -> Result<String> {
    let (iat, exp) = expiry_from(ttl)?;
    let claims = AccessClaims {
        typ: TokenKind::Access,
        sub: user.id.clone(),
        email: user.email.clone(),
        username: user.username.clone(),
        full_name: user.full_name.clone(),
        iat,
        exp,
        jti: uuid::Uuid::new_v4().to_string(),
    };
    encode_claims(&claims, secret)
}

pub fn create_refresh_token(user_id: &str, secret: &str, ttl: Duration) -> Result<String> {
    let (iat, exp) = expiry_from(ttl)?;
    let claims = RefreshClaims {
        typ: TokenKind::Refresh,
        sub: user_id.to_owned(),
        iat,
        exp,
        jti: uuid::Uuid::new_v4().to_string(),
    };
    encode_claims(&claims, secret)
}

pub fn encode_claims<T: Serialize>(claims: &T, secret: &str) -> Result<String> {
    let token = encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )?;
    Ok(token)
}

pub fn validate_access_token(token: &str, secret: &str) -> Result<AccessClaims> {
    let token_data = decode::<AccessClaims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &validation(),
    )?;

    if token_data.claims.typ != TokenKind::Access {
        anyhow::bail!("expected an access token");
    }
    Ok(token_data.claims)
}

pub fn validate_refresh_token(token: &str, secret: &str) -> Result<RefreshClaims> {
    let token_data = decode::<RefreshClaims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &validation(),
    )?;

    if token_data.claims.typ != TokenKind::Refresh {
        anyhow::bail!("expected a refresh token");
    }
    Ok(token_data.claims)
}
