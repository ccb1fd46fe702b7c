// Token Codec - seals and unseals signed claims with expiry

use std::str::FromStr;
use std::sync::Arc;

use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::port::time_provider::{SystemTimeProvider, TimeProvider};

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("failed to sign claim: {0}")]
    Signing(String),

    #[error("invalid token")]
    Invalid,

    #[error("expired token")]
    Expired,
}

/// Token time-to-live.
///
/// Accepts plain seconds (`90`) or a short duration string (`"30s"`, `"15m"`,
/// `"2h"`, `"7d"`). A bare number parses as seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ttl(u64);

impl Ttl {
    pub fn seconds(secs: u64) -> Self {
        Self(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }
}

impl FromStr for Ttl {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(TokenError::Signing("empty ttl".to_string()));
        }
        let (value, unit) = match s.char_indices().last() {
            Some((idx, c)) if c.is_ascii_alphabetic() => (&s[..idx], Some(c)),
            _ => (s, None),
        };
        let n: u64 = value
            .trim()
            .parse()
            .map_err(|_| TokenError::Signing(format!("invalid ttl: {s}")))?;
        let secs = match unit {
            None | Some('s') => n,
            Some('m') => n * 60,
            Some('h') => n * 3600,
            Some('d') => n * 86_400,
            Some(u) => return Err(TokenError::Signing(format!("invalid ttl unit: {u}"))),
        };
        Ok(Self(secs))
    }
}

/// Wire shape of a sealed token: the opaque claim plus registered timestamps.
#[derive(Debug, Serialize, Deserialize)]
struct ClaimEnvelope {
    claim: serde_json::Value,
    iat: u64,
    exp: u64,
}

/// Seals and unseals HMAC-SHA256 signed claims.
///
/// Round-trip law: `unseal(seal(x)) == x` for the claim contents, until the
/// token expires.
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    time_provider: Arc<dyn TimeProvider>,
}

impl TokenCodec {
    pub fn new(secret: &str) -> Self {
        Self::with_time_provider(secret, Arc::new(SystemTimeProvider))
    }

    /// Inject a clock, so expiry can be tested deterministically.
    pub fn with_time_provider(secret: &str, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            time_provider,
        }
    }

    /// Produce a signed token embedding `claim`, expiring after `ttl`.
    pub fn seal<C: Serialize>(&self, claim: &C, ttl: Ttl) -> Result<String, TokenError> {
        let claim = serde_json::to_value(claim).map_err(|e| TokenError::Signing(e.to_string()))?;
        let iat = (self.time_provider.now_millis() / 1000).max(0) as u64;
        let envelope = ClaimEnvelope {
            claim,
            iat,
            exp: iat + ttl.as_secs(),
        };
        encode(&Header::default(), &envelope, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify signature and expiry, returning exactly the sealed claim.
    pub fn unseal<C: DeserializeOwned>(&self, token: &str) -> Result<C, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<ClaimEnvelope>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            }
        })?;

        serde_json::from_value(data.claims.claim).map_err(|_| TokenError::Invalid)
    }
}
