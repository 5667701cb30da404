use std::backtrace::Backtrace;
use std::error::Error as StdError;
use std::fmt;

use reqwest::{Method, StatusCode};

/// Broad category of a failed off-ramp run.
///
/// Every kind is terminal: the client never retries internally.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Kind {
    /// No response at all: connection, TLS, timeout, or a non-success reply from the IP echo
    /// service.
    Network,
    /// Non-success status while issuing the user-scoped API key.
    Auth,
    /// Success status, but the expected field was absent or the body was not JSON.
    ResponseShape,
    /// Non-success status or missing invoice while creating the off-ramp order.
    Order,
    /// Caller-supplied configuration was rejected before any request was sent.
    Validation,
    /// Local failures such as request body serialization.
    Internal,
}

#[derive(Debug)]
pub struct Error {
    kind: Kind,
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    backtrace: Backtrace,
}

impl Error {
    pub fn with_source<S: StdError + Send + Sync + 'static>(kind: Kind, source: S) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
            backtrace: Backtrace::capture(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> Kind {
        self.kind
    }

    #[must_use]
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    #[must_use]
    pub fn inner(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.source.as_deref()
    }

    #[must_use]
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        let e = self.source.as_deref()?;
        e.downcast_ref::<E>()
    }

    /// HTTP status attached to this error, when the service answered at all.
    #[must_use]
    pub fn status_code(&self) -> Option<StatusCode> {
        if let Some(status) = self.downcast_ref::<Status>() {
            return Some(status.status_code);
        }
        if let Some(missing) = self.downcast_ref::<MissingField>() {
            return Some(missing.status_code);
        }
        self.downcast_ref::<Undecodable>()
            .map(|undecodable| undecodable.status_code)
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        Validation {
            reason: message.into(),
        }
        .into()
    }

    pub fn status<S: Into<String>>(
        kind: Kind,
        status_code: StatusCode,
        method: Method,
        path: String,
        message: S,
    ) -> Self {
        Error::with_source(
            kind,
            Status {
                status_code,
                method,
                path,
                message: message.into(),
            },
        )
    }

    pub fn missing_field<S: Into<String>>(
        kind: Kind,
        field: &'static str,
        status_code: StatusCode,
        body: S,
    ) -> Self {
        Error::with_source(
            kind,
            MissingField {
                field,
                status_code,
                body: body.into(),
            },
        )
    }

    pub fn undecodable<S: Into<String>>(
        kind: Kind,
        status_code: StatusCode,
        body: S,
        source: serde_json::Error,
    ) -> Self {
        Error::with_source(
            kind,
            Undecodable {
                status_code,
                body: body.into(),
                source,
            },
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(src) => write!(f, "{:?}: {}", self.kind, src),
            None => write!(f, "{:?}", self.kind),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn StdError + 'static))
    }
}

/// The service answered with a non-success status.
#[non_exhaustive]
#[derive(Debug)]
pub struct Status {
    pub status_code: StatusCode,
    pub method: Method,
    pub path: String,
    pub message: String,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "error({}) making {} call to {} with {}",
            self.status_code, self.method, self.path, self.message
        )
    }
}

impl StdError for Status {}

/// The service answered with a success status but without the field the flow depends on.
#[non_exhaustive]
#[derive(Debug)]
pub struct MissingField {
    pub field: &'static str,
    pub status_code: StatusCode,
    pub body: String,
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "response ({}) is missing `{}`: {}",
            self.status_code, self.field, self.body
        )
    }
}

impl StdError for MissingField {}

/// The service answered with a success status but a body that does not decode.
#[non_exhaustive]
#[derive(Debug)]
pub struct Undecodable {
    pub status_code: StatusCode,
    pub body: String,
    pub source: serde_json::Error,
}

impl fmt::Display for Undecodable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "undecodable response ({}): {}: {}",
            self.status_code, self.source, self.body
        )
    }
}

impl StdError for Undecodable {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&self.source)
    }
}

#[non_exhaustive]
#[derive(Debug)]
pub struct Validation {
    pub reason: String,
}

impl fmt::Display for Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid: {}", self.reason)
    }
}

impl StdError for Validation {}

impl From<Validation> for Error {
    fn from(err: Validation) -> Self {
        Error::with_source(Kind::Validation, err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::with_source(Kind::Network, e)
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Error::with_source(Kind::Validation, e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::with_source(Kind::Internal, e)
    }
}

impl From<reqwest::header::InvalidHeaderValue> for Error {
    fn from(e: reqwest::header::InvalidHeaderValue) -> Self {
        Error::with_source(Kind::Validation, e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_keeps_code_and_body() {
        let err = Error::status(
            Kind::Auth,
            StatusCode::UNAUTHORIZED,
            Method::POST,
            "/api/v0/application/api-key".to_owned(),
            r#"{"error":"bad signature"}"#,
        );

        assert_eq!(err.kind(), Kind::Auth, "kind is preserved");
        assert_eq!(
            err.status_code(),
            Some(StatusCode::UNAUTHORIZED),
            "status is reachable through the error"
        );
        let rendered = err.to_string();
        assert!(rendered.contains("401"), "rendered: {rendered}");
        assert!(rendered.contains("bad signature"), "rendered: {rendered}");
    }

    #[test]
    fn missing_field_reports_field_name() {
        let err = Error::missing_field(Kind::Order, "invoice", StatusCode::OK, "{}");

        assert_eq!(err.kind(), Kind::Order, "kind is preserved");
        assert_eq!(err.status_code(), Some(StatusCode::OK), "status is kept");
        assert!(
            err.to_string().contains("`invoice`"),
            "field name is rendered"
        );
    }

    #[test]
    fn undecodable_keeps_status_and_body() {
        let source = serde_json::from_str::<serde_json::Value>("<html>down</html>")
            .expect_err("html is not json");
        let err = Error::undecodable(Kind::Order, StatusCode::OK, "<html>down</html>", source);

        assert_eq!(err.kind(), Kind::Order, "kind is preserved");
        assert_eq!(err.status_code(), Some(StatusCode::OK), "status is kept");
        assert!(err.to_string().contains("<html>down</html>"), "body is rendered");
    }

    #[test]
    fn validation_has_no_status() {
        let err = Error::validation("amount must be positive");

        assert_eq!(err.kind(), Kind::Validation, "kind is validation");
        assert!(err.status_code().is_none(), "no HTTP status involved");
        assert!(err.downcast_ref::<Validation>().is_some(), "typed source");
    }
}
