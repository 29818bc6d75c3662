use crate::fetch::client::HttpClient;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};

/// Header Banxico SIE reads the query token from.
pub const BANXICO_TOKEN_HEADER: &str = "Bmx-Token";

/// An [`HttpClient`] wrapper that injects an API token as an HTTP header.
///
/// The header name and value are validated once, when the wrapper is built,
/// so a malformed token surfaces as a configuration error instead of failing
/// on every request.
pub struct ApiKey<C> {
    inner: C,
    header_name: HeaderName,
    value: HeaderValue,
}

impl<C> ApiKey<C> {
    pub fn new(inner: C, header_name: &str, key: &str) -> Result<Self> {
        let header_name = HeaderName::from_bytes(header_name.as_bytes())
            .with_context(|| format!("Invalid header name '{header_name}'"))?;
        let mut value = HeaderValue::from_str(key).context("API token is not a valid header value")?;
        value.set_sensitive(true);
        Ok(Self {
            inner,
            header_name,
            value,
        })
    }

    /// Wraps `inner` with the `Bmx-Token` header Banxico expects.
    pub fn banxico(inner: C, token: &str) -> Result<Self> {
        Self::new(inner, BANXICO_TOKEN_HEADER, token)
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for ApiKey<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        req.headers_mut()
            .insert(self.header_name.clone(), self.value.clone());
        self.inner.execute(req).await
    }
}
