// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use url::Url;

pub(crate) const DEFAULT_API_URL: &str = "http://localhost:8000/api";
pub(crate) const DEFAULT_TIMEOUT_SECS: &str = "15";

#[derive(Clone, Debug)]
pub(crate) struct Config {
    pub(crate) api_url: Url,
    pub(crate) timeout: Duration,
    pub(crate) refresh_timeout: Duration,
}

impl Config {
    pub(crate) fn new(api_url: Url, timeout_secs: u64, refresh_timeout_secs: u64) -> Self {
        Self {
            api_url: normalize_base_url(api_url),
            timeout: Duration::from_secs(timeout_secs),
            refresh_timeout: Duration::from_secs(refresh_timeout_secs),
        }
    }
}

/// Drops trailing slashes so that `http://host/api/` and `http://host/api`
/// name the same backend, including as a storage key.
pub(crate) fn normalize_base_url(mut url: Url) -> Url {
    let trimmed = url.path().trim_end_matches('/').to_owned();
    if trimmed.len() != url.path().len() && !trimmed.is_empty() {
        url.set_path(&trimmed);
    }
    url
}
