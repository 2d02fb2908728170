// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::multipart;
use url::Url;

use crate::{error::Result, metadata};

use super::{Body, Request, Response, Transport};

/// `reqwest`-backed transport rooted at the API base URL.
pub(crate) struct Http {
    base: Url,
    client: reqwest::Client,
}

impl Http {
    pub(crate) fn new(base: Url, timeout: Duration) -> Result<Self> {
        Ok(Self {
            base,
            client: reqwest::Client::builder()
                .timeout(timeout)
                .user_agent(metadata::USER_AGENT.as_str())
                .build()?,
        })
    }

    // `Url::join` would replace the last segment of a base like
    // `http://host/api`, so paths are appended textually.
    fn url(&self, path: &str) -> Result<Url> {
        Ok(Url::parse(&format!(
            "{}{}",
            self.base.as_str().trim_end_matches('/'),
            path
        ))?)
    }
}

#[async_trait]
impl Transport for Http {
    async fn send(&self, request: &Request) -> Result<Response> {
        let url = self.url(request.path())?;
        debug!("Sending {} {}", request.method(), url);

        let mut builder = self
            .client
            .request(request.method().clone(), url)
            .headers(request.headers().clone());
        if !request.query().is_empty() {
            builder = builder.query(request.query());
        }
        if let Some(timeout) = request.timeout() {
            builder = builder.timeout(timeout);
        }
        builder = match *request.body() {
            Body::Empty => builder,
            Body::Json(ref value) => builder.json(value),
            Body::File {
                ref field,
                ref file_name,
                ref content,
            } => builder.multipart(multipart::Form::new().part(
                field.clone(),
                multipart::Part::bytes(content.clone()).file_name(file_name.clone()),
            )),
        };

        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?.to_vec();
        debug!("Received {} for {}", status, request.path());
        Ok(Response::new(status, body))
    }
}
