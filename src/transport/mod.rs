// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

#[cfg(test)]
pub(crate) mod fake;
mod http;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    header::{self, HeaderMap, HeaderValue},
    Method, StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    error::{self, Result},
    session::Token,
};

pub(crate) use http::Http;

#[derive(Clone, Debug)]
pub(crate) enum Body {
    Empty,
    Json(serde_json::Value),
    File {
        field: String,
        file_name: String,
        content: Vec<u8>,
    },
}

/// Everything needed to send (and resend) one API call. Paths are relative to
/// the API base URL and start with `/`.
#[derive(Clone, Debug)]
pub(crate) struct Request {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: Body,
    timeout: Option<Duration>,
    retried: bool,
}

impl Request {
    pub(crate) fn new<P: Into<String>>(method: Method, path: P) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: Body::Empty,
            timeout: None,
            retried: false,
        }
    }

    pub(crate) fn get<P: Into<String>>(path: P) -> Self {
        Self::new(Method::GET, path)
    }

    pub(crate) fn post<P: Into<String>>(path: P) -> Self {
        Self::new(Method::POST, path)
    }

    pub(crate) fn patch<P: Into<String>>(path: P) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub(crate) fn delete<P: Into<String>>(path: P) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub(crate) fn with_json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        self.body = Body::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    pub(crate) fn with_file<F: Into<String>, N: Into<String>>(
        mut self,
        field: F,
        file_name: N,
        content: Vec<u8>,
    ) -> Self {
        self.body = Body::File {
            field: field.into(),
            file_name: file_name.into(),
            content,
        };
        self
    }

    pub(crate) fn with_query<K: Into<String>, V: ToString>(mut self, key: K, value: V) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    #[cfg(test)]
    pub(crate) fn with_header(mut self, name: header::HeaderName, value: HeaderValue) -> Self {
        _ = self.headers.insert(name, value);
        self
    }

    pub(crate) const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub(crate) const fn method(&self) -> &Method {
        &self.method
    }

    pub(crate) fn path(&self) -> &str {
        &self.path
    }

    pub(crate) fn query(&self) -> &[(String, String)] {
        &self.query
    }

    pub(crate) const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub(crate) const fn body(&self) -> &Body {
        &self.body
    }

    pub(crate) const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub(crate) fn authorization(&self) -> Option<&HeaderValue> {
        self.headers.get(header::AUTHORIZATION)
    }

    pub(crate) fn set_bearer(&mut self, token: &Token) -> Result<()> {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose()))?;
        value.set_sensitive(true);
        _ = self.headers.insert(header::AUTHORIZATION, value);
        Ok(())
    }

    pub(crate) const fn is_retried(&self) -> bool {
        self.retried
    }

    pub(crate) fn mark_retried(&mut self) {
        self.retried = true;
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Response {
    status: StatusCode,
    body: Vec<u8>,
}

impl Response {
    pub(crate) const fn new(status: StatusCode, body: Vec<u8>) -> Self {
        Self { status, body }
    }

    pub(crate) const fn status(&self) -> StatusCode {
        self.status
    }

    /// Decodes the body. An empty body decodes as JSON `null`, which is what
    /// endpoints answering `204 No Content` map to.
    pub(crate) fn json<T: DeserializeOwned>(&self) -> Result<T> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            Ok(serde_json::from_value(serde_json::Value::Null)?)
        } else {
            Ok(serde_json::from_slice(&self.body)?)
        }
    }

    /// A human-readable summary of an error body. Understands
    /// `{"detail": "..."}` and field error maps like
    /// `{"email": ["already taken"]}`.
    pub(crate) fn detail(&self) -> String {
        match serde_json::from_slice::<serde_json::Value>(&self.body) {
            Ok(serde_json::Value::Object(fields)) => {
                if let Some(serde_json::Value::String(detail)) = fields.get("detail") {
                    return detail.clone();
                }
                fields
                    .iter()
                    .map(|(field, problem)| match *problem {
                        serde_json::Value::Array(ref problems) => format!(
                            "{}: {}",
                            field,
                            problems
                                .iter()
                                .map(|p| p.as_str().map_or_else(|| p.to_string(), str::to_owned))
                                .collect::<Vec<_>>()
                                .join(" ")
                        ),
                        serde_json::Value::String(ref problem) => format!("{field}: {problem}"),
                        _ => format!("{field}: {problem}"),
                    })
                    .collect::<Vec<_>>()
                    .join("; ")
            }
            Ok(other) => other.to_string(),
            Err(_) if self.body.is_empty() => self
                .status
                .canonical_reason()
                .unwrap_or("no details")
                .to_owned(),
            Err(_) => String::from_utf8_lossy(&self.body).trim().to_owned(),
        }
    }

    pub(crate) fn error_for_status(self) -> Result<Self> {
        if self.status.is_success() {
            Ok(self)
        } else {
            Err(error::Api::Status {
                status: self.status,
                detail: self.detail(),
            }
            .into())
        }
    }
}

/// Moves requests to the backend and back. Implementations report only
/// failures to get a response at all; HTTP error statuses are returned as
/// ordinary responses.
#[async_trait]
pub(crate) trait Transport: Send + Sync {
    async fn send(&self, request: &Request) -> Result<Response>;
}
