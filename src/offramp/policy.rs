use std::net::IpAddr;
use std::sync::Arc;

use chrono::Utc;
use url::Url;

use crate::Timestamp;
use crate::ip::IpSource;

/// Where signature timestamps come from.
///
/// `System` reads the wall clock on every request; `Fixed` pins the clock so signatures are
/// reproducible.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum TimePolicy {
    #[default]
    System,
    Fixed(Timestamp),
}

impl TimePolicy {
    pub(crate) fn resolve(self) -> Timestamp {
        match self {
            TimePolicy::System => Utc::now().timestamp_millis(),
            TimePolicy::Fixed(timestamp) => timestamp,
        }
    }
}

/// How the order's `ipAddress` is obtained.
#[non_exhaustive]
#[derive(Clone, Debug)]
pub enum IpPolicy {
    /// Ask an HTTP echo service through the client's own HTTP stack.
    Echo(Url),
    /// Ask a caller-provided source.
    Discover(Arc<dyn IpSource>),
    /// Use a known address; no discovery call is made.
    Fixed(IpAddr),
    /// Send the order without `ipAddress`.
    Omit,
}

impl IpPolicy {
    /// Whether resolving this policy costs a network call.
    #[must_use]
    pub fn discovers(&self) -> bool {
        matches!(self, IpPolicy::Echo(_) | IpPolicy::Discover(_))
    }
}
