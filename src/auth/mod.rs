use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SecurityConfig;

/// Session token claims. `sub` carries the identity provider's user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(identity: &Identity, expiry_hours: u64) -> Result<Self, SessionError> {
        let now = Utc::now();
        let exp = i64::try_from(expiry_hours)
            .ok()
            .and_then(Duration::try_hours)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or(SessionError::ExpiryOutOfRange(expiry_hours))?
            .timestamp();

        Ok(Self {
            sub: identity.id.clone(),
            name: identity.name.clone(),
            email: identity.email.clone(),
            picture: identity.image.clone(),
            exp,
            iat: now.timestamp(),
        })
    }
}

/// Authenticated member as seen by the identity provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub image: Option<String>,
}

impl Identity {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            email: None,
            image: None,
        }
    }
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            name: claims.name,
            email: claims.email,
            image: claims.picture,
        }
    }
}

/// Outcome of session resolution, handed explicitly to every operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    Anonymous,
    Authenticated(Identity),
}

impl Session {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Session::Authenticated(identity) => Some(identity),
            Session::Anonymous => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Missing Authorization header")]
    MissingToken,

    #[error("Authorization header must use Bearer token format")]
    MalformedHeader,

    #[error("JWT secret not configured")]
    InvalidSecret,

    #[error("Invalid session token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    #[error("Session token has an empty subject")]
    EmptySubject,

    #[error("Token lifetime of {0} hours is out of range")]
    ExpiryOutOfRange(u64),
}

/// Signs and verifies HS256 session tokens with the configured secret
#[derive(Clone)]
pub struct SessionResolver {
    secret: String,
    expiry_hours: u64,
}

impl SessionResolver {
    pub fn new(secret: impl Into<String>, expiry_hours: u64) -> Self {
        Self {
            secret: secret.into(),
            expiry_hours,
        }
    }

    pub fn from_config(security: &SecurityConfig) -> Self {
        Self::new(security.jwt_secret.clone(), security.jwt_expiry_hours)
    }

    /// Resolve an `Authorization` header value to a session.
    /// Every failure is reported; callers decide whether it is fatal.
    pub fn resolve(&self, authorization: Option<&str>) -> Result<Session, SessionError> {
        let header = authorization.ok_or(SessionError::MissingToken)?;
        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(SessionError::MalformedHeader)?;

        let claims = self.validate(token)?;
        if claims.sub.trim().is_empty() {
            return Err(SessionError::EmptySubject);
        }
        Ok(Session::Authenticated(Identity::from(claims)))
    }

    pub fn validate(&self, token: &str) -> Result<Claims, SessionError> {
        if self.secret.is_empty() {
            return Err(SessionError::InvalidSecret);
        }
        let key = DecodingKey::from_secret(self.secret.as_bytes());
        let data = decode::<Claims>(token, &key, &Validation::default())?;
        Ok(data.claims)
    }

    /// Mint a token for `identity`, used by the `token` CLI command and tests
    pub fn issue(&self, identity: &Identity) -> Result<String, SessionError> {
        if self.secret.is_empty() {
            return Err(SessionError::InvalidSecret);
        }
        let key = EncodingKey::from_secret(self.secret.as_bytes());
        let claims = Claims::new(identity, self.expiry_hours)?;
        Ok(encode(&Header::default(), &claims, &key)?)
    }
}
