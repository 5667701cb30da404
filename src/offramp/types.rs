use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use secrecy::{ExposeSecret as _, SecretString};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};

use crate::Result;
use crate::error::Error;

/// A positive amount of satoshis.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Sats(u64);

impl Sats {
    pub fn new(amount: u64) -> Result<Self> {
        if amount == 0 {
            return Err(Error::validation("amount must be greater than zero sats"));
        }
        Ok(Self(amount))
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Sats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for Sats {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let amount = s
            .trim()
            .parse::<u64>()
            .map_err(|e| Error::validation(format!("invalid sats amount `{s}`: {e}")))?;
        Sats::new(amount)
    }
}

/// Payout rail for the off-ramp order.
#[non_exhaustive]
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize, strum_macros::Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    #[default]
    Lightning,
}

/// Body of `POST /api/v0/application/api-key`.
#[non_exhaustive]
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyRequest {
    pub lightning_address: String,
}

impl ApiKeyRequest {
    #[must_use]
    pub fn new<S: Into<String>>(lightning_address: S) -> Self {
        Self {
            lightning_address: lightning_address.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiKeyResponse {
    pub(crate) apikey: Option<String>,
}

/// Body of `POST /api/v0/offramp/order`.
///
/// `sourceAmount` travels as a decimal string.
#[serde_as]
#[non_exhaustive]
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfframpOrderRequest {
    #[serde_as(as = "DisplayFromStr")]
    pub source_amount: Sats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<IpAddr>,
    pub label: String,
    pub payment_method: PaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
}

impl OfframpOrderRequest {
    #[must_use]
    pub fn new<S: Into<String>>(
        source_amount: Sats,
        ip_address: Option<IpAddr>,
        label: S,
        payment_method: PaymentMethod,
    ) -> Self {
        Self {
            source_amount,
            ip_address,
            label: label.into(),
            payment_method,
            source_id: None,
        }
    }

    #[must_use]
    pub fn with_source_id<S: Into<String>>(mut self, source_id: S) -> Self {
        self.source_id = Some(source_id.into());
        self
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct OfframpOrderResponse {
    pub(crate) invoice: Option<String>,
}

/// User-scoped API key issued for one lightning address.
#[derive(Clone, Debug)]
pub struct UserApiKey(SecretString);

impl UserApiKey {
    #[must_use]
    pub fn new(key: SecretString) -> Self {
        Self(key)
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

/// Lightning invoice returned for a created off-ramp order; paying it completes the payout.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Invoice(String);

impl Invoice {
    #[must_use]
    pub fn new<S: Into<String>>(invoice: S) -> Self {
        Self(invoice.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Invoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use serde_json::json;

    use super::*;

    #[test]
    fn sats_accepts_numeric_strings() -> Result<()> {
        assert_eq!("50000".parse::<Sats>()?.get(), 50_000, "plain");
        assert_eq!(" 21 ".parse::<Sats>()?.get(), 21, "padded");
        assert!("0".parse::<Sats>().is_err(), "zero rejected");
        assert!("-5".parse::<Sats>().is_err(), "negative rejected");
        assert!("1.5".parse::<Sats>().is_err(), "fractional sats rejected");
        Ok(())
    }

    #[test]
    fn order_body_uses_wire_names() -> Result<()> {
        let order = OfframpOrderRequest::new(
            Sats::new(50_000)?,
            Some(IpAddr::V4(Ipv4Addr::new(203, 0, 113, 7))),
            "OPAGO offramp",
            PaymentMethod::Lightning,
        )
        .with_source_id("pos-42");

        assert_eq!(
            serde_json::to_value(&order)?,
            json!({
                "sourceAmount": "50000",
                "ipAddress": "203.0.113.7",
                "label": "OPAGO offramp",
                "paymentMethod": "LIGHTNING",
                "sourceId": "pos-42",
            }),
            "camelCase body with string amount"
        );
        Ok(())
    }

    #[test]
    fn optional_order_fields_are_omitted() -> Result<()> {
        let order = OfframpOrderRequest::new(
            Sats::new(1)?,
            None,
            "label",
            PaymentMethod::Lightning,
        );

        assert_eq!(
            serde_json::to_string(&order)?,
            r#"{"sourceAmount":"1","label":"label","paymentMethod":"LIGHTNING"}"#,
            "no ipAddress or sourceId"
        );
        Ok(())
    }

    #[test]
    fn payment_method_display_matches_wire() {
        assert_eq!(PaymentMethod::Lightning.to_string(), "LIGHTNING", "display");
    }

    #[test]
    fn user_key_is_redacted_in_debug() {
        let key = UserApiKey::new(SecretString::from("userkey123"));

        assert_eq!(key.expose(), "userkey123", "exposed on request");
        assert!(!format!("{key:?}").contains("userkey123"), "redacted in debug");
    }
}
