//! Off-ramp flow against the Bringin API.
//!
//! One run is a fixed sequence:
//! - resolve the caller's public IP per [`IpPolicy`]
//! - issue a user-scoped API key with an HMAC-signed request
//! - submit the order with that key and return its invoice

mod client;
mod config;
mod policy;
mod types;

pub use client::{API_KEY_PATH, ORDER_PATH, OfframpClient};
pub use config::{DEFAULT_LABEL, DEFAULT_TIMEOUT, OfframpConfig};
pub use policy::{IpPolicy, TimePolicy};
pub use types::{ApiKeyRequest, Invoice, OfframpOrderRequest, PaymentMethod, Sats, UserApiKey};
