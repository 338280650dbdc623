//! A thin wrapper over `reqwest::Client` exposing the one thing the core
//! actually needs from a transport: perform a request, get back a status
//! code and a body, with transport failures mapped onto the error
//! taxonomy's three named conditions instead of leaking `reqwest`'s own
//! error shape everywhere.

use std::time::Duration;

use crate::error::{Error, ErrorKind, Result};
use crate::http::headers::HeaderMap;

#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        ConnectOptions {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Connection {
    client: reqwest::Client,
}

impl Connection {
    pub fn new(client: reqwest::Client) -> Self {
        Connection { client }
    }

    pub fn with_options(options: &ConnectOptions) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(options.connect_timeout)
            .timeout(options.request_timeout)
            .user_agent(options.user_agent.clone())
            .build()?;
        Ok(Connection { client })
    }

    #[tracing::instrument(level = "debug", skip(self, headers), fields(url = %url))]
    pub async fn get(&self, url: &str, headers: &HeaderMap) -> Result<(u16, Vec<u8>)> {
        let mut req = self.client.get(url);
        req = apply_headers(req, headers)?;
        self.perform(req).await
    }

    #[tracing::instrument(level = "debug", skip(self, headers, body), fields(url = %url, body_len = body.len()))]
    pub async fn post_bytes(
        &self,
        url: &str,
        headers: &HeaderMap,
        body: Vec<u8>,
    ) -> Result<(u16, Vec<u8>)> {
        let mut req = self.client.post(url).body(body);
        req = apply_headers(req, headers)?;
        self.perform(req).await
    }

    #[tracing::instrument(level = "debug", skip(self, headers, form), fields(url = %url))]
    pub async fn post_form(
        &self,
        url: &str,
        headers: &HeaderMap,
        form: reqwest::multipart::Form,
    ) -> Result<(u16, Vec<u8>)> {
        let mut req = self.client.post(url).multipart(form);
        req = apply_headers(req, headers)?;
        self.perform(req).await
    }

    async fn perform(&self, req: reqwest::RequestBuilder) -> Result<(u16, Vec<u8>)> {
        let resp = req.send().await.map_err(map_transport_error)?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await.map_err(map_transport_error)?;
        Ok((status, body.to_vec()))
    }
}

fn apply_headers(
    mut req: reqwest::RequestBuilder,
    headers: &HeaderMap,
) -> Result<reqwest::RequestBuilder> {
    for (name, value) in headers.iter() {
        req = req.header(name, value);
    }
    Ok(req)
}

/// §4.7's transport error mapping table.
fn map_transport_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        return Error::new(ErrorKind::TryAgain, e.to_string());
    }
    if e.is_connect() {
        let msg = e.to_string();
        if msg.to_ascii_lowercase().contains("dns") {
            return Error::new(ErrorKind::HttpDnsFailed, msg);
        }
        return Error::Reqwest(e);
    }
    if e.is_body() || e.is_decode() || e.is_request() {
        return Error::new(ErrorKind::HttpTransmissionFailed, e.to_string());
    }
    Error::Reqwest(e)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_are_sane() {
        let options = ConnectOptions::default();
        assert!(options.connect_timeout <= options.request_timeout);
    }
}
