//! Bearer token claims, decoded without contacting the server.
//!
//! Signatures are not verified. Claims drive client-side routing only.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// base64url that accepts payloads with or without `=` padding
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClaimsError {
    #[error("token is empty")]
    Empty,

    #[error("token must have 3 segments, found {0}")]
    SegmentCount(usize),

    #[error("payload is not valid base64url: {0}")]
    Base64(String),

    #[error("payload is not valid JSON: {0}")]
    Json(String),

    #[error("payload is not a JSON object")]
    NotAnObject,
}

/// Structured claims carried in the token payload
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TokenClaims {
    /// Principal id (`id`, `userId` or `sub`)
    pub id: Option<String>,
    /// Owning school (tenant) id
    pub school_id: Option<String>,
    pub role: Option<String>,
    pub exp: Option<i64>,
    pub iat: Option<i64>,
    /// Remaining claims, untouched
    pub extra: Map<String, Value>,
}

impl TokenClaims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| DateTime::from_timestamp(exp, 0))
    }

    /// Informational only; routing does not consult expiry.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.exp.is_some_and(|exp| exp <= now.timestamp())
    }

    fn from_object(mut object: Map<String, Value>) -> Self {
        let id = ["id", "userId", "sub"]
            .iter()
            .find_map(|key| object.remove(*key).and_then(id_string));
        let school_id = object.remove("schoolId").and_then(id_string);
        let role = object
            .remove("role")
            .and_then(|v| v.as_str().map(str::to_string));
        let exp = object.remove("exp").and_then(|v| v.as_i64());
        let iat = object.remove("iat").and_then(|v| v.as_i64());

        Self {
            id,
            school_id,
            role,
            exp,
            iat,
            extra: object,
        }
    }
}

/// Ids arrive as strings or numbers depending on the issuing service
fn id_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Decode the claims of a compact `header.payload.signature` token.
///
/// Never fails loudly: malformed input is logged and yields `None`, which
/// callers treat as "no usable claims".
pub fn decode_claims(token: &str) -> Option<TokenClaims> {
    match try_decode_claims(token) {
        Ok(claims) => Some(claims),
        Err(ClaimsError::Empty) => None,
        Err(e) => {
            tracing::warn!("Invalid token: {}", e);
            None
        }
    }
}

pub fn try_decode_claims(token: &str) -> Result<TokenClaims, ClaimsError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(ClaimsError::Empty);
    }

    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(ClaimsError::SegmentCount(segments.len()));
    }

    let payload = PAYLOAD_ENGINE
        .decode(segments[1])
        .map_err(|e| ClaimsError::Base64(e.to_string()))?;

    let value: Value =
        serde_json::from_slice(&payload).map_err(|e| ClaimsError::Json(e.to_string()))?;

    match value {
        Value::Object(object) => Ok(TokenClaims::from_object(object)),
        _ => Err(ClaimsError::NotAnObject),
    }
}
