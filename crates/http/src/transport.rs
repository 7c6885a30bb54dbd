//! Raw HTTP transport
//!
//! The client only needs two verbs from the network: a GET returning the body
//! and a form POST returning the body. Connection settings are passed in
//! explicitly through `TransportConfig`.

use std::collections::BTreeMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use pan_core::{Config, Error, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, RequestBuilder, StatusCode};

const DEFAULT_USER_AGENT: &str = concat!("pan/", env!("CARGO_PKG_VERSION"));

/// Byte-level access to the service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `url` and return the response body
    async fn get(&self, url: &str) -> Result<Vec<u8>>;

    /// POST `fields` as a url-encoded form and return the response body
    async fn post_form(&self, url: &str, fields: &[(String, String)]) -> Result<Vec<u8>>;
}

/// Connection settings for `HttpTransport`
#[derive(Debug, Clone, PartialEq)]
pub struct TransportConfig {
    /// http, https or socks5 proxy url
    pub proxy: Option<String>,
    /// Local addresses to bind, used round-robin
    pub local_addrs: Vec<IpAddr>,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
    /// Sent with every request
    pub headers: BTreeMap<String, String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            proxy: None,
            local_addrs: Vec::new(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            headers: BTreeMap::new(),
        }
    }
}

impl TryFrom<&Config> for TransportConfig {
    type Error = Error;

    fn try_from(config: &Config) -> Result<Self> {
        Ok(Self {
            proxy: (!config.proxy.is_empty()).then(|| config.proxy.clone()),
            local_addrs: config.local_addr_list()?,
            connect_timeout: Duration::from_millis(config.transport.connect_timeout_ms),
            request_timeout: Duration::from_millis(config.transport.request_timeout_ms),
            user_agent: config
                .transport
                .user_agent
                .clone()
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            headers: config.transport.headers.clone(),
        })
    }
}

/// `Transport` backed by reqwest
#[derive(Debug)]
pub struct HttpTransport {
    /// One client per local address, or a single unbound client
    clients: Vec<Client>,
    next: AtomicUsize,
}

impl HttpTransport {
    pub fn new(config: &TransportConfig) -> Result<Self> {
        let headers = header_map(&config.headers)?;

        let bind_addrs: Vec<Option<IpAddr>> = if config.local_addrs.is_empty() {
            vec![None]
        } else {
            config.local_addrs.iter().copied().map(Some).collect()
        };

        let clients = bind_addrs
            .into_iter()
            .map(|addr| build_client(config, headers.clone(), addr))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            clients,
            next: AtomicUsize::new(0),
        })
    }

    fn client(&self) -> &Client {
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.clients.len();
        &self.clients[index]
    }

    async fn send(&self, request: RequestBuilder, url: &str) -> Result<Vec<u8>> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::Network(format!("Request to {url} failed: {e}")))?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(map_status(status, &error_body));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Network(format!("Failed to read response: {e}")))?;
        Ok(body.to_vec())
    }
}

fn build_client(
    config: &TransportConfig,
    headers: HeaderMap,
    local_addr: Option<IpAddr>,
) -> Result<Client> {
    let mut builder = Client::builder()
        .connect_timeout(config.connect_timeout)
        .timeout(config.request_timeout)
        .user_agent(config.user_agent.clone())
        .default_headers(headers)
        .local_address(local_addr);

    if let Some(proxy) = &config.proxy {
        let proxy = reqwest::Proxy::all(proxy)
            .map_err(|e| Error::Config(format!("Invalid proxy '{proxy}': {e}")))?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| Error::Network(format!("Failed to create HTTP client: {e}")))
}

fn header_map(headers: &BTreeMap<String, String>) -> Result<HeaderMap> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let header_name = HeaderName::try_from(name.as_str())
            .map_err(|e| Error::Config(format!("Invalid header name '{name}': {e}")))?;
        let header_value = HeaderValue::try_from(value.as_str())
            .map_err(|e| Error::Config(format!("Invalid value for header '{name}': {e}")))?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}

/// Map HTTP status codes to appropriate errors
fn map_status(status: StatusCode, body: &str) -> Error {
    match status {
        StatusCode::NOT_FOUND => Error::NotFound(body.to_string()),
        StatusCode::FORBIDDEN | StatusCode::UNAUTHORIZED => Error::Remote {
            code: format!("HTTP{}", status.as_u16()),
            message: "access denied, check the session headers in the config".to_string(),
        },
        StatusCode::BAD_REQUEST => Error::InvalidInput(body.to_string()),
        _ => Error::Network(format!("HTTP {}: {}", status.as_u16(), body)),
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<Vec<u8>> {
        tracing::debug!("GET {}", url);
        self.send(self.client().get(url), url).await
    }

    async fn post_form(&self, url: &str, fields: &[(String, String)]) -> Result<Vec<u8>> {
        tracing::debug!("POST {} ({} field(s))", url, fields.len());
        self.send(self.client().post(url).form(fields), url).await
    }
}
