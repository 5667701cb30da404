//! Public IP discovery.
//!
//! Bringin screens orders by originating IP, so the order body carries the caller's public
//! address. Discovery sits behind [`IpSource`] so callers and tests can substitute a fixed
//! address without touching the network.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr as _;

use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, Method};
use serde::Deserialize;
use url::Url;

use crate::error::{Error, Kind};
use crate::{Result, Stage};

/// Default IP echo service.
pub const DEFAULT_IP_SERVICE: &str = "https://httpbin.org/ip";

/// Something that can report the caller's public IP address.
#[async_trait]
pub trait IpSource: fmt::Debug + Send + Sync {
    async fn public_ip(&self) -> Result<IpAddr>;
}

/// Echo-service response; `ipify`-style services answer with `ip`, `httpbin` with `origin`.
#[derive(Debug, Deserialize)]
struct EchoResponse {
    ip: Option<String>,
    origin: Option<String>,
}

/// Asks an HTTPS echo service for the caller's address.
#[derive(Clone, Debug)]
pub struct HttpIpSource {
    url: Url,
    client: ReqwestClient,
}

impl HttpIpSource {
    #[must_use]
    pub fn new(url: Url, client: ReqwestClient) -> Self {
        Self { url, client }
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl IpSource for HttpIpSource {
    async fn public_ip(&self) -> Result<IpAddr> {
        let request = self
            .client
            .request(Method::GET, self.url.clone())
            .build()?;
        let reply = crate::send(&self.client, request, Stage::PublicIp).await?;
        let echo: EchoResponse = reply.json(Stage::PublicIp)?;

        let Some(raw) = echo.ip.or(echo.origin) else {
            return Err(reply.missing(Stage::PublicIp, "ip"));
        };

        parse_echoed(&raw)
    }
}

/// Always reports the same address.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FixedIpSource(pub IpAddr);

#[async_trait]
impl IpSource for FixedIpSource {
    async fn public_ip(&self) -> Result<IpAddr> {
        Ok(self.0)
    }
}

/// Proxied requests make httpbin report `"client, proxy"`; the first entry is the caller.
fn parse_echoed(raw: &str) -> Result<IpAddr> {
    let first = raw.split(',').next().unwrap_or_default().trim();
    IpAddr::from_str(first).map_err(|e| {
        Error::with_source(
            Kind::ResponseShape,
            crate::error::Validation {
                reason: format!("echo service returned `{raw}`: {e}"),
            },
        )
    })
}
