//! HTTP transport to the licensing server

use std::time::Duration;

use reqwest::Url;

/// Failures before a response body was obtained.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("could not reach licensing server: {0}")]
    Connect(String),
    #[error("licensing server returned HTTP {0}")]
    Status(u16),
    #[error("transport error: {0}")]
    Other(String),
}

/// Sends one form-encoded POST and returns the raw response body.
///
/// One call is one outbound request; implementations never retry.
pub trait Transport: Send + Sync {
    fn post_form(
        &self,
        fields: &[(&'static str, String)],
        timeout: Duration,
    ) -> Result<String, TransportError>;
}

/// reqwest-backed transport.
///
/// Certificate verification is always on and plain `http` is refused.
pub struct HttpTransport {
    endpoint: Url,
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new(endpoint: Url) -> Result<Self, TransportError> {
        if endpoint.scheme() != "https" {
            return Err(TransportError::Other(format!(
                "licensing server must use https, got {}",
                endpoint.scheme()
            )));
        }
        let client = reqwest::blocking::Client::builder()
            .https_only(true)
            .user_agent(concat!("keyward/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;
        Ok(Self { endpoint, client })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl Transport for HttpTransport {
    fn post_form(
        &self,
        fields: &[(&'static str, String)],
        timeout: Duration,
    ) -> Result<String, TransportError> {
        let resp = self
            .client
            .post(self.endpoint.clone())
            .timeout(timeout)
            .form(fields)
            .send()
            .map_err(|e| classify(e, timeout))?;

        if !resp.status().is_success() {
            return Err(TransportError::Status(resp.status().as_u16()));
        }

        resp.text().map_err(|e| classify(e, timeout))
    }
}

fn classify(err: reqwest::Error, timeout: Duration) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(timeout)
    } else if err.is_connect() {
        TransportError::Connect(err.to_string())
    } else {
        TransportError::Other(err.to_string())
    }
}
