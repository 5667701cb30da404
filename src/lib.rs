//! Client for the [Bringin](https://bringin.xyz) off-ramp API.
//!
//! An off-ramp run is a short, strictly sequential chain:
//! - optionally discover the caller's public IP ([`ip`])
//! - exchange the application API key and an HMAC signature ([`auth`]) for a user-scoped key
//! - submit a Lightning payout order with the user key and receive an invoice
//!
//! Each step feeds the next; the first failure ends the run. See [`offramp::OfframpClient`].

pub mod auth;
pub mod error;
pub mod ip;
pub mod offramp;

use reqwest::header::HeaderMap;
use reqwest::{Client as ReqwestClient, Method, Request, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::{Error, Kind};

pub type Result<T> = std::result::Result<T, Error>;

/// Unix time in milliseconds.
pub type Timestamp = i64;

/// Production API host.
pub const BRINGIN_HOST: &str = "https://api.bringin.xyz";

/// Step of the off-ramp chain a request belongs to; decides how failures are classified.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Stage {
    PublicIp,
    ApiKey,
    Order,
}

impl Stage {
    const fn status_kind(self) -> Kind {
        match self {
            Stage::PublicIp => Kind::Network,
            Stage::ApiKey => Kind::Auth,
            Stage::Order => Kind::Order,
        }
    }

    const fn shape_kind(self) -> Kind {
        match self {
            Stage::PublicIp | Stage::ApiKey => Kind::ResponseShape,
            Stage::Order => Kind::Order,
        }
    }
}

/// A success reply whose body has been read in full.
#[derive(Debug)]
pub(crate) struct Reply {
    status_code: StatusCode,
    body: String,
}

impl Reply {
    pub(crate) fn json<T: DeserializeOwned>(&self, stage: Stage) -> Result<T> {
        serde_json::from_str(&self.body).map_err(|e| {
            #[cfg(feature = "tracing")]
            tracing::warn!(?stage, error = %e, "undecodable response body");
            Error::undecodable(stage.shape_kind(), self.status_code, self.body.clone(), e)
        })
    }

    pub(crate) fn missing(&self, stage: Stage, field: &'static str) -> Error {
        Error::missing_field(stage.shape_kind(), field, self.status_code, self.body.clone())
    }
}

/// Sends `request` and reads the body, classifying non-success replies by `stage`.
pub(crate) async fn send(
    client: &ReqwestClient,
    request: Request,
    stage: Stage,
) -> Result<Reply> {
    let method = request.method().clone();
    let path = request.url().path().to_owned();

    #[cfg(feature = "tracing")]
    tracing::debug!(?stage, %method, %path, "sending request");

    let response = client.execute(request).await?;
    let status_code = response.status();
    let body = response.text().await?;

    #[cfg(feature = "tracing")]
    tracing::debug!(?stage, %status_code, "received response");

    if !status_code.is_success() {
        return Err(Error::status(
            stage.status_kind(),
            status_code,
            method,
            path,
            body,
        ));
    }

    Ok(Reply { status_code, body })
}

/// Builds a JSON `POST` with `body` sent verbatim.
pub(crate) fn post_json(
    client: &ReqwestClient,
    url: url::Url,
    headers: HeaderMap,
    body: String,
) -> Result<Request> {
    Ok(client
        .request(Method::POST, url)
        .headers(headers)
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .body(body)
        .build()?)
}
