//! HTTP plumbing: URL building, credential header, response classification.

use std::time::Duration;

use cinema_shared::error::{ApiError, ErrorCode};
use reqwest::{header, Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::{
    error::{ClientError, Result},
    session::BasicCredential,
};

/// Decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    Empty,
    Json(Value),
    Text(String),
}

impl ApiResponse {
    pub fn into_json<T: DeserializeOwned>(self, context: &'static str) -> Result<T> {
        match self {
            ApiResponse::Json(value) => {
                serde_json::from_value(value).map_err(|err| ClientError::UnexpectedResponse {
                    context,
                    reason: err.to_string(),
                })
            }
            ApiResponse::Empty => Err(ClientError::UnexpectedResponse {
                context,
                reason: "empty body".into(),
            }),
            ApiResponse::Text(text) => Err(ClientError::UnexpectedResponse {
                context,
                reason: format!("expected JSON, got text '{}'", text.trim()),
            }),
        }
    }
}

pub struct ApiRequest<'a> {
    pub method: Method,
    pub segments: &'a [&'a str],
    pub query: &'a [(&'a str, Option<&'a str>)],
    pub body: Option<Value>,
}

impl<'a> ApiRequest<'a> {
    pub fn get(segments: &'a [&'a str]) -> Self {
        Self::new(Method::GET, segments)
    }

    pub fn post(segments: &'a [&'a str]) -> Self {
        Self::new(Method::POST, segments)
    }

    pub fn put(segments: &'a [&'a str]) -> Self {
        Self::new(Method::PUT, segments)
    }

    pub fn delete(segments: &'a [&'a str]) -> Self {
        Self::new(Method::DELETE, segments)
    }

    fn new(method: Method, segments: &'a [&'a str]) -> Self {
        Self {
            method,
            segments,
            query: &[],
            body: None,
        }
    }

    pub fn query(mut self, query: &'a [(&'a str, Option<&'a str>)]) -> Self {
        self.query = query;
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

#[derive(Debug, Clone)]
pub struct Transport {
    http: Client,
    base_url: Url,
}

impl Transport {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let invalid = |reason: String| ClientError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason,
        };
        let base_url = Url::parse(base_url.trim()).map_err(|err| invalid(err.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(invalid("url cannot carry a path".into()));
        }
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Appends `segments` to the base path, percent-encoding each one.
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    pub async fn send(
        &self,
        request: ApiRequest<'_>,
        credential: Option<&BasicCredential>,
    ) -> Result<ApiResponse> {
        let url = self.endpoint(request.segments);
        let query: Vec<(&str, &str)> = request
            .query
            .iter()
            .filter_map(|(key, value)| match value {
                Some(value) if !value.is_empty() => Some((*key, *value)),
                _ => None,
            })
            .collect();

        debug!(method = %request.method, path = url.path(), "http: request");

        let mut builder = self
            .http
            .request(request.method.clone(), url.clone())
            .header(header::ACCEPT, "application/json");
        if !query.is_empty() {
            builder = builder.query(&query);
        }
        if let Some(credential) = credential {
            builder = builder.header(header::AUTHORIZATION, credential.header_value());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(ApiResponse::Empty);
        }

        let is_json = is_json(&response);
        if !status.is_success() {
            let body = read_error_body(response, is_json).await;
            let message = if body.trim().is_empty() {
                format!(
                    "HTTP {}: {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("Request failed")
                )
            } else {
                body.clone()
            };
            warn!(
                method = %request.method,
                path = url.path(),
                status = status.as_u16(),
                "http: request rejected"
            );
            return Err(ClientError::Http {
                status: status.as_u16(),
                code: ErrorCode::from_status(status.as_u16()),
                message,
                detail: ApiError::parse(&body),
            });
        }

        let text = response.text().await?;
        if !is_json {
            return Ok(ApiResponse::Text(text));
        }
        if text.trim().is_empty() {
            return Ok(ApiResponse::Empty);
        }
        let value = serde_json::from_str(&text).map_err(|err| ClientError::UnexpectedResponse {
            context: "json body",
            reason: err.to_string(),
        })?;
        Ok(ApiResponse::Json(value))
    }
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.contains("application/json"))
}

/// Error bodies are shown as received; a bare JSON string is unquoted.
async fn read_error_body(response: Response, is_json: bool) -> String {
    let text = response.text().await.unwrap_or_default();
    if is_json {
        if let Ok(Value::String(message)) = serde_json::from_str::<Value>(&text) {
            return message;
        }
    }
    text
}
