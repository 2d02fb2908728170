// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

pub(crate) mod auth;
pub(crate) mod images;
pub(crate) mod model;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::{client::Client, error::Result, transport::Request};

/// One backend operation: how to phrase it as a request and what comes back.
#[async_trait]
pub(crate) trait Endpoint: Sized + Send {
    type Response: DeserializeOwned + Send;

    fn request(&self) -> Result<Request>;

    async fn execute(self, client: &Client) -> Result<Self::Response> {
        client.send(self.request()?).await?.json()
    }
}
