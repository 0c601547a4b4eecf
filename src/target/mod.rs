//! Fetch targets and the request parameters they resolve to
//!
//! A queued target is either a bare address string, a parsed URL, or a fully
//! specified set of request parameters. Every variant resolves to
//! [`RequestParams`] before it is handed to a transport.

mod headers;

pub use headers::inject_headers;

use crate::{TargetError, TargetResult};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use url::Url;

/// A set of header name/value pairs
pub type HeaderSet = BTreeMap<String, String>;

/// Fully specified connection parameters for one request
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RequestParams {
    /// HTTP method (defaults to GET)
    #[serde(default = "default_method")]
    pub method: String,

    /// URL scheme, `http` or `https`
    #[serde(default = "default_scheme")]
    pub scheme: String,

    /// Host name or IP address
    pub host: String,

    /// Explicit port, if any
    #[serde(default)]
    pub port: Option<u16>,

    /// Path including the query string
    #[serde(default = "default_path")]
    pub path: String,

    /// Per-target request headers
    #[serde(default)]
    pub headers: HeaderSet,
}

fn default_method() -> String {
    "GET".to_string()
}

fn default_scheme() -> String {
    "https".to_string()
}

fn default_path() -> String {
    "/".to_string()
}

impl RequestParams {
    /// Creates GET parameters for the given host and path
    pub fn new(scheme: &str, host: &str, path: &str) -> Self {
        Self {
            method: default_method(),
            scheme: scheme.to_string(),
            host: host.to_string(),
            port: None,
            path: path.to_string(),
            headers: HeaderSet::new(),
        }
    }

    /// Splits a parsed URL into request parameters
    ///
    /// The query string is kept as part of the path. Fragments are dropped
    /// since they never reach the server.
    pub fn from_url(url: &Url) -> TargetResult<Self> {
        check_scheme(url.scheme())?;

        let host = url
            .host_str()
            .ok_or_else(|| TargetError::MissingHost(url.to_string()))?;

        let mut path = url.path().to_string();
        if let Some(query) = url.query() {
            path.push('?');
            path.push_str(query);
        }

        Ok(Self {
            method: default_method(),
            scheme: url.scheme().to_string(),
            host: host.to_string(),
            port: url.port(),
            path,
            headers: HeaderSet::new(),
        })
    }

    /// Reassembles the absolute URL these parameters point at
    pub fn url(&self) -> TargetResult<Url> {
        self.validate()?;

        let port = self.port.map(|p| format!(":{}", p)).unwrap_or_default();
        let path = if self.path.starts_with('/') {
            self.path.clone()
        } else {
            format!("/{}", self.path)
        };
        let address = format!("{}://{}{}{}", self.scheme, self.host, port, path);

        Url::parse(&address).map_err(|e| TargetError::Parse {
            address,
            message: e.to_string(),
        })
    }

    /// Checks scheme, host and method without building a URL
    pub fn validate(&self) -> TargetResult<()> {
        check_scheme(&self.scheme)?;

        if self.host.trim().is_empty() {
            return Err(TargetError::MissingHost(format!(
                "{}://{}",
                self.scheme, self.path
            )));
        }

        let method_ok = !self.method.is_empty()
            && self
                .method
                .chars()
                .all(|c| c.is_ascii_alphabetic() || c == '-');
        if !method_ok {
            return Err(TargetError::InvalidMethod(self.method.clone()));
        }

        Ok(())
    }

    /// Looks up a header value, ignoring ASCII case in the name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Sets a header, replacing any existing entry whose name differs only in case
    pub fn set_header(&mut self, name: &str, value: &str) {
        self.headers.retain(|key, _| !key.eq_ignore_ascii_case(name));
        self.headers.insert(name.to_string(), value.to_string());
    }
}

fn check_scheme(scheme: &str) -> TargetResult<()> {
    match scheme {
        "http" | "https" => Ok(()),
        other => Err(TargetError::UnsupportedScheme(other.to_string())),
    }
}

/// One queued resource to fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchTarget {
    /// A bare address string such as `https://example.com/page`
    Address(String),

    /// An already parsed URL
    Url(Url),

    /// Fully specified connection parameters
    Params(RequestParams),
}

impl FetchTarget {
    /// Resolves the target into request parameters
    pub fn to_params(&self) -> TargetResult<RequestParams> {
        match self {
            Self::Address(address) => {
                let url = Url::parse(address).map_err(|e| TargetError::Parse {
                    address: address.clone(),
                    message: e.to_string(),
                })?;
                RequestParams::from_url(&url)
            }
            Self::Url(url) => RequestParams::from_url(url),
            Self::Params(params) => {
                params.validate()?;
                Ok(params.clone())
            }
        }
    }
}

impl fmt::Display for FetchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Address(address) => write!(f, "{}", address),
            Self::Url(url) => write!(f, "{}", url),
            Self::Params(params) => {
                write!(f, "{} {}://{}", params.method, params.scheme, params.host)?;
                if let Some(port) = params.port {
                    write!(f, ":{}", port)?;
                }
                write!(f, "{}", params.path)
            }
        }
    }
}

impl From<&str> for FetchTarget {
    fn from(address: &str) -> Self {
        Self::Address(address.to_string())
    }
}

impl From<String> for FetchTarget {
    fn from(address: String) -> Self {
        Self::Address(address)
    }
}

impl From<Url> for FetchTarget {
    fn from(url: Url) -> Self {
        Self::Url(url)
    }
}

impl From<RequestParams> for FetchTarget {
    fn from(params: RequestParams) -> Self {
        Self::Params(params)
    }
}
