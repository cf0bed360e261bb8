//! HTTP transport used by the job client.
//!
//! The job client only deals with [`Request`] and [`Response`] values, and delegates their
//! exchange to a [`Transport`]. The production transport is [`HttpTransport`], built on a
//! blocking reqwest client.

use log::debug;
use reqwest::blocking::Client as HttpClient;
use reqwest::Url;
use serde_json::Value;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

/// A request to the job service, relative to the service base URL.
#[derive(Clone, Debug, PartialEq)]
pub struct Request {
    method: Method,
    segments: Vec<String>,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    body: Option<Value>,
}

impl Request {
    /// Create a new request on the endpoint made of the given path segments. Segments are escaped
    /// by the transport, they must not be escaped beforehand.
    pub fn new(method: Method, segments: Vec<String>) -> Request {
        Request {
            method: method,
            segments: segments,
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn get_method(&self) -> Method {
        self.method
    }

    pub fn get_segments(&self) -> &[String] {
        &self.segments
    }

    pub fn get_query(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn get_headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn get_body(&self) -> Option<&Value> {
        self.body.as_ref()
    }
}

/// A raw response of the job service.
#[derive(Clone, Debug, PartialEq)]
pub struct Response {
    status: u16,
    body: String,
}

impl Response {
    /// Create a new response.
    pub fn new(status: u16, body: String) -> Response {
        Response {
            status: status,
            body: body,
        }
    }

    pub fn get_status(&self) -> u16 {
        self.status
    }

    pub fn get_body(&self) -> &str {
        &self.body
    }

    /// Check if the status code is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Reqwest error, typically related to network issues or request failures.
    #[error("Reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),
    /// The endpoint URL cannot be built.
    #[error("Invalid endpoint: {0}")]
    Endpoint(String),
}

/// Exchange requests and responses with the job service. There is no retry, pooling or timeout
/// policy at this level, implementations are free to add their own.
pub trait Transport {
    fn send(&self, request: &Request) -> Result<Response, TransportError>;
}

/// A transport sending requests over HTTPS with a blocking reqwest client.
pub struct HttpTransport {
    client: HttpClient,
    base_url: Url,
}

impl HttpTransport {
    /// Create a new transport for the service at the given base URL (for example
    /// `https://submit.plgrid.pl/api/`). A timeout applies to every request when given.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<HttpTransport, TransportError> {
        let base_url = match Url::parse(base_url) {
            Ok(url) if !url.cannot_be_a_base() => url,
            Ok(_) => return Err(TransportError::Endpoint(format!("{} cannot be a base URL", base_url))),
            Err(error) => return Err(TransportError::Endpoint(format!("{} ({})", base_url, error))),
        };
        let client = HttpClient::builder().timeout(timeout).build()?;

        Ok(HttpTransport {
            client: client,
            base_url: base_url,
        })
    }

    /// Build the URL of the endpoint made of the given segments, escaping each of them.
    pub fn endpoint(&self, segments: &[String]) -> Result<Url, TransportError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| TransportError::Endpoint(self.base_url.to_string()))?
            ;
            path.pop_if_empty().extend(segments);
        }

        Ok(url)
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &Request) -> Result<Response, TransportError> {
        let url = self.endpoint(request.get_segments())?;
        let method = match request.get_method() {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };
        debug!("Sending {} {}.", method, url);

        let mut builder = self.client.request(method, url);
        if !request.get_query().is_empty() {
            builder = builder.query(request.get_query());
        }
        for (name, value) in request.get_headers() {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.get_body() {
            builder = builder.json(body);
        }

        let response = builder.send()?;
        let status = response.status().as_u16();
        let body = response.text()?;
        debug!("Received status {} ({} bytes).", status, body.len());

        Ok(Response::new(status, body))
    }
}
