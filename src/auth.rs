//! Request signing for the Bringin API.
//!
//! Every signed request carries an `authorization` header of the form
//! `HMAC <timestamp>:<signature>`, where `timestamp` is Unix milliseconds and `signature` is
//! the lowercase hex HMAC-SHA256 of `timestamp + method + path + md5hex(body)` keyed by the
//! application secret. The body digest is taken over compact JSON; an absent or empty body is
//! digested as `{}`.

use hmac::{Hmac, Mac as _};
use reqwest::Method;
use secrecy::{ExposeSecret as _, SecretString};
use serde::Serialize;
use sha2::Sha256;

use crate::error::Error;
use crate::{Result, Timestamp};

/// Serialized stand-in for an absent or empty request body.
pub const EMPTY_BODY: &str = "{}";

type HmacSha256 = Hmac<Sha256>;

/// Application-level credentials issued by Bringin.
#[derive(Clone, Debug)]
pub struct Credentials {
    api_key: String,
    secret: SecretString,
}

impl Credentials {
    pub fn new<K: Into<String>>(api_key: K, secret: SecretString) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::validation("api key must not be empty"));
        }
        if secret.expose_secret().is_empty() {
            return Err(Error::validation("secret key must not be empty"));
        }

        Ok(Self { api_key, secret })
    }

    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    #[must_use]
    pub fn secret(&self) -> &SecretString {
        &self.secret
    }
}

/// A request body together with the authorization computed over exactly those bytes.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SignedBody {
    pub timestamp: Timestamp,
    pub body: String,
    pub authorization: String,
}

/// Serializes `body` the way the signature expects it.
///
/// `None` and values that serialize to an empty JSON value collapse to `{}`.
pub fn canonical_body<T: Serialize + ?Sized>(body: Option<&T>) -> Result<String> {
    let Some(body) = body else {
        return Ok(EMPTY_BODY.to_owned());
    };

    let serialized = serde_json::to_string(body)?;
    if matches!(serialized.as_str(), "null" | "{}" | "[]" | r#""""#) {
        return Ok(EMPTY_BODY.to_owned());
    }

    Ok(serialized)
}

/// Lowercase hex MD5 of the canonical body.
#[must_use]
pub fn content_digest(canonical_body: &str) -> String {
    format!("{:x}", md5::compute(canonical_body.as_bytes()))
}

/// Computes the `authorization` header value for a request.
pub fn sign<T: Serialize + ?Sized>(
    secret: &SecretString,
    method: &Method,
    path: &str,
    body: Option<&T>,
    timestamp: Timestamp,
) -> Result<String> {
    let body = canonical_body(body)?;
    sign_canonical(secret, method, path, &body, timestamp)
}

/// Signs `body` and returns the serialized bytes alongside the header, so the caller sends
/// exactly what was digested.
pub fn sign_body<T: Serialize + ?Sized>(
    secret: &SecretString,
    method: &Method,
    path: &str,
    body: &T,
    timestamp: Timestamp,
) -> Result<SignedBody> {
    let body = canonical_body(Some(body))?;
    let authorization = sign_canonical(secret, method, path, &body, timestamp)?;

    Ok(SignedBody {
        timestamp,
        body,
        authorization,
    })
}

fn sign_canonical(
    secret: &SecretString,
    method: &Method,
    path: &str,
    canonical_body: &str,
    timestamp: Timestamp,
) -> Result<String> {
    let secret = secret.expose_secret();
    if secret.is_empty() {
        return Err(Error::validation("secret key must not be empty"));
    }

    let message = format!(
        "{timestamp}{method}{path}{digest}",
        digest = content_digest(canonical_body)
    );

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| Error::validation(format!("invalid secret key: {e}")))?;
    mac.update(message.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    Ok(format!("HMAC {timestamp}:{signature}"))
}
