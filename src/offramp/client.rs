use std::net::IpAddr;

use reqwest::Client as ReqwestClient;
use reqwest::Method;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use secrecy::SecretString;
use url::Url;

use crate::auth;
use crate::error::Error;
use crate::ip::{HttpIpSource, IpSource as _};
use crate::offramp::types::{
    ApiKeyRequest, ApiKeyResponse, Invoice, OfframpOrderRequest, OfframpOrderResponse, UserApiKey,
};
use crate::offramp::{IpPolicy, OfframpConfig};
use crate::{Result, Stage};

/// Path of the user API key issuance endpoint.
pub const API_KEY_PATH: &str = "/api/v0/application/api-key";

/// Path of the off-ramp order endpoint.
pub const ORDER_PATH: &str = "/api/v0/offramp/order";

const API_KEY_HEADER: HeaderName = HeaderName::from_static("api-key");

/// Drives one off-ramp run: optional IP discovery, user key issuance, order creation.
#[derive(Clone, Debug)]
pub struct OfframpClient {
    config: OfframpConfig,
    client: ReqwestClient,
}

impl OfframpClient {
    /// Creates a client whose HTTP calls are bounded by the configured timeout and never reuse
    /// a connection.
    pub fn new(config: OfframpConfig) -> Result<Self> {
        let client = ReqwestClient::builder()
            .timeout(config.timeout)
            .pool_max_idle_per_host(0)
            .build()?;

        Ok(Self::with_client(config, client))
    }

    /// Creates a client on top of a caller-provided HTTP client.
    #[must_use]
    pub fn with_client(config: OfframpConfig, client: ReqwestClient) -> Self {
        Self { config, client }
    }

    #[must_use]
    pub fn config(&self) -> &OfframpConfig {
        &self.config
    }

    /// Runs the whole chain and returns the order invoice.
    ///
    /// The first failing step ends the run; later steps are never attempted.
    pub async fn run(&self) -> Result<Invoice> {
        let ip_address = self.discover_public_ip().await?;
        let user_key = self
            .issue_api_key(&self.config.lightning_address)
            .await?;
        let order = self.order_request(ip_address);

        self.create_offramp_order(&user_key, &order).await
    }

    /// Resolves the order's `ipAddress` according to the configured [`IpPolicy`].
    pub async fn discover_public_ip(&self) -> Result<Option<IpAddr>> {
        #[cfg(feature = "tracing")]
        if self.config.ip.discovers() {
            tracing::debug!("discovering public ip");
        }

        let ip = match &self.config.ip {
            IpPolicy::Echo(url) => {
                let source = HttpIpSource::new(url.clone(), self.client.clone());
                Some(source.public_ip().await?)
            }
            IpPolicy::Discover(source) => Some(source.public_ip().await?),
            IpPolicy::Fixed(ip) => Some(*ip),
            IpPolicy::Omit => None,
        };

        #[cfg(feature = "tracing")]
        if let Some(ip) = ip {
            tracing::info!(%ip, "resolved public ip");
        }

        Ok(ip)
    }

    /// Exchanges the application credentials for a key scoped to `lightning_address`.
    pub async fn issue_api_key(&self, lightning_address: &str) -> Result<UserApiKey> {
        let credentials = &self.config.credentials;
        let signed = auth::sign_body(
            credentials.secret(),
            &Method::POST,
            API_KEY_PATH,
            &ApiKeyRequest::new(lightning_address),
            self.config.time.resolve(),
        )?;

        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, sensitive(credentials.api_key())?);
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&signed.authorization)?);

        let request =
            crate::post_json(&self.client, self.endpoint(API_KEY_PATH)?, headers, signed.body)?;
        let reply = crate::send(&self.client, request, Stage::ApiKey).await?;
        let response: ApiKeyResponse = reply.json(Stage::ApiKey)?;

        let key = response
            .apikey
            .filter(|key| !key.is_empty())
            .ok_or_else(|| reply.missing(Stage::ApiKey, "apikey"))?;

        #[cfg(feature = "tracing")]
        tracing::info!(lightning_address, "issued user api key");

        Ok(UserApiKey::new(SecretString::from(key)))
    }

    /// Submits `order` on behalf of the user and returns the invoice Bringin wants paid.
    pub async fn create_offramp_order(
        &self,
        user_key: &UserApiKey,
        order: &OfframpOrderRequest,
    ) -> Result<Invoice> {
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, sensitive(user_key.expose())?);

        let body = serde_json::to_string(order)?;
        let request = crate::post_json(&self.client, self.endpoint(ORDER_PATH)?, headers, body)?;
        let reply = crate::send(&self.client, request, Stage::Order).await?;
        let response: OfframpOrderResponse = reply.json(Stage::Order)?;

        let invoice = response
            .invoice
            .filter(|invoice| !invoice.is_empty())
            .ok_or_else(|| reply.missing(Stage::Order, "invoice"))?;

        #[cfg(feature = "tracing")]
        tracing::info!(amount = %order.source_amount, "offramp order created");

        Ok(Invoice::new(invoice))
    }

    /// Builds the order body from the configuration and the resolved IP.
    #[must_use]
    pub fn order_request(&self, ip_address: Option<IpAddr>) -> OfframpOrderRequest {
        let order = OfframpOrderRequest::new(
            self.config.amount,
            ip_address,
            self.config.label.clone(),
            self.config.payment_method,
        );

        match &self.config.source_id {
            Some(source_id) => order.with_source_id(source_id.clone()),
            None => order,
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.config.host.join(path)?)
    }
}

fn sensitive(value: &str) -> Result<HeaderValue> {
    let mut value = HeaderValue::from_str(value)
        .map_err(|e| Error::validation(format!("api key is not a valid header value: {e}")))?;
    value.set_sensitive(true);
    Ok(value)
}
