//! HTTP transport backed by reqwest
//!
//! Each opened operation runs in its own spawned task, which sends the
//! request, reports the response head and then streams the body chunk by
//! chunk as it arrives.

use super::{EventSender, OperationHandle, ResponseMeta, Transport, TransportEvent};
use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::target::{HeaderSet, RequestParams};
use crate::TransportError;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, Response};
use std::time::Duration;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The user agent configuration
/// * `crawler` - Timeouts for the client
///
/// # Example
///
/// ```no_run
/// use sumi_tide::config::{CrawlerConfig, UserAgentConfig};
/// use sumi_tide::transport::build_http_client;
///
/// let user_agent = UserAgentConfig {
///     crawler_name: "SumiTide".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&user_agent, &CrawlerConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    crawler: &CrawlerConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(Duration::from_secs(crawler.request_timeout_secs))
        .connect_timeout(Duration::from_secs(crawler.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// [`Transport`] that performs real HTTP requests
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Wraps an existing client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds the client from configuration
    pub fn from_config(
        user_agent: &UserAgentConfig,
        crawler: &CrawlerConfig,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(user_agent, crawler)?))
    }

    fn build_request(&self, params: &RequestParams) -> Result<RequestBuilder, TransportError> {
        let url = params
            .url()
            .map_err(|e| TransportError::InvalidParams(e.to_string()))?;

        let method = Method::from_bytes(params.method.as_bytes())
            .map_err(|_| TransportError::InvalidParams(format!("method '{}'", params.method)))?;

        Ok(self
            .client
            .request(method, url)
            .headers(to_header_map(&params.headers)?))
    }
}

impl Transport for HttpTransport {
    fn open(&self, params: RequestParams) -> Result<OperationHandle, TransportError> {
        let request = self.build_request(&params)?;
        let (handle, events) = OperationHandle::channel(params);

        tracing::trace!("Opening operation {}", handle.id());
        tokio::spawn(stream_response(request, events));

        Ok(handle)
    }
}

fn to_header_map(headers: &HeaderSet) -> Result<HeaderMap, TransportError> {
    let mut map = HeaderMap::with_capacity(headers.len());

    for (name, value) in headers {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| TransportError::InvalidHeader {
                name: name.clone(),
                message: e.to_string(),
            })?;
        let header_value = HeaderValue::from_str(value).map_err(|e| TransportError::InvalidHeader {
            name: name.clone(),
            message: e.to_string(),
        })?;
        map.insert(header_name, header_value);
    }

    Ok(map)
}

fn response_meta(response: &Response) -> ResponseMeta {
    let headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();

    ResponseMeta {
        status: response.status().as_u16(),
        url: response.url().to_string(),
        headers,
    }
}

/// Drives one request to completion, reporting every step to `events`
///
/// Stops early once the receiving handle has been dropped.
async fn stream_response(request: RequestBuilder, events: EventSender) {
    let mut response = match request.send().await {
        Ok(response) => response,
        Err(e) => {
            events.send(TransportEvent::Error(TransportError::Request(e.to_string())));
            return;
        }
    };

    if !events.send(TransportEvent::Response(response_meta(&response))) {
        return;
    }

    loop {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                if !events.send(TransportEvent::Data(chunk.to_vec())) {
                    return;
                }
            }
            Ok(None) => {
                events.send(TransportEvent::End);
                return;
            }
            Err(e) => {
                events.send(TransportEvent::Error(TransportError::Request(e.to_string())));
                return;
            }
        }
    }
}
