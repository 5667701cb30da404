use std::time::Duration;

use bon::bon;
use url::Url;

use crate::auth::Credentials;
use crate::error::Error;
use crate::ip::DEFAULT_IP_SERVICE;
use crate::offramp::policy::{IpPolicy, TimePolicy};
use crate::offramp::types::{PaymentMethod, Sats};
use crate::{BRINGIN_HOST, Result};

/// Label Bringin shows for the payout when none is given.
pub const DEFAULT_LABEL: &str = "OPAGO offramp";

/// Upper bound for each individual HTTP call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything one off-ramp run needs, supplied up front.
#[derive(Clone, Debug)]
pub struct OfframpConfig {
    pub host: Url,
    pub credentials: Credentials,
    pub lightning_address: String,
    pub amount: Sats,
    pub label: String,
    pub payment_method: PaymentMethod,
    pub source_id: Option<String>,
    pub ip: IpPolicy,
    pub time: TimePolicy,
    pub timeout: Duration,
}

#[bon]
impl OfframpConfig {
    #[builder]
    pub fn new(
        credentials: Credentials,
        #[builder(into)] lightning_address: String,
        amount: Sats,
        host: Option<Url>,
        #[builder(into, default = DEFAULT_LABEL.to_owned())] label: String,
        #[builder(default)] payment_method: PaymentMethod,
        #[builder(into)] source_id: Option<String>,
        ip: Option<IpPolicy>,
        #[builder(default)] time: TimePolicy,
        #[builder(default = DEFAULT_TIMEOUT)] timeout: Duration,
    ) -> Result<Self> {
        let host = match host {
            Some(host) => host,
            None => Url::parse(BRINGIN_HOST)?,
        };
        if host.cannot_be_a_base() {
            return Err(Error::validation(format!("host `{host}` cannot be a base URL")));
        }

        let lightning_address = lightning_address.trim().to_owned();
        validate_lightning_address(&lightning_address)?;

        if label.trim().is_empty() {
            return Err(Error::validation("label must not be empty"));
        }
        if source_id.as_deref().is_some_and(|id| id.trim().is_empty()) {
            return Err(Error::validation("source id must not be blank when given"));
        }
        if timeout.is_zero() {
            return Err(Error::validation("timeout must be greater than zero"));
        }

        let ip = match ip {
            Some(ip) => ip,
            None => IpPolicy::Echo(Url::parse(DEFAULT_IP_SERVICE)?),
        };

        Ok(Self {
            host,
            credentials,
            lightning_address,
            amount,
            label,
            payment_method,
            source_id,
            ip,
            time,
            timeout,
        })
    }
}

/// Lightning addresses look like e-mail addresses: `user@domain`.
fn validate_lightning_address(address: &str) -> Result<()> {
    let Some((user, domain)) = address.split_once('@') else {
        return Err(Error::validation(format!(
            "invalid lightning address `{address}`; expected user@domain"
        )));
    };
    if user.is_empty() || domain.is_empty() || domain.contains('@') || !domain.contains('.') {
        return Err(Error::validation(format!(
            "invalid lightning address `{address}`; expected user@domain"
        )));
    }
    Ok(())
}
