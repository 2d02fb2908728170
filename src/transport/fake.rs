// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

//! Scripted in-process backend for exercising the request pipeline.

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex, MutexGuard, PoisonError,
    },
    time::Duration,
};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::json;

use crate::{
    api::auth::{PROFILE_PATH, REFRESH_PATH},
    error::{Error, Result},
};

use super::{Request, Response, Transport};

#[derive(Clone, Debug)]
pub(crate) enum RefreshReply {
    Grant {
        access: &'static str,
        refresh: Option<&'static str>,
    },
    Status(StatusCode),
    Hang,
}

struct Script {
    valid_access: String,
    refresh_reply: RefreshReply,
    refresh_delay: Duration,
    always_unauthorized: bool,
    profile_status: Option<StatusCode>,
    offline: bool,
}

pub(crate) struct Backend {
    script: Mutex<Script>,
    refresh_calls: AtomicUsize,
    sent: Mutex<Vec<Request>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn reply(status: StatusCode, body: &serde_json::Value) -> Response {
    Response::new(status, body.to_string().into_bytes())
}

impl Backend {
    /// A backend that accepts `valid_access` and, on refresh, grants `A2`
    /// without rotating the refresh token.
    pub(crate) fn new(valid_access: &str) -> Self {
        Self {
            script: Mutex::new(Script {
                valid_access: valid_access.to_owned(),
                refresh_reply: RefreshReply::Grant {
                    access: "A2",
                    refresh: None,
                },
                refresh_delay: Duration::from_millis(20),
                always_unauthorized: false,
                profile_status: None,
                offline: false,
            }),
            refresh_calls: AtomicUsize::new(0),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_refresh_reply(self, refresh_reply: RefreshReply) -> Self {
        lock(&self.script).refresh_reply = refresh_reply;
        self
    }

    pub(crate) fn always_unauthorized(self) -> Self {
        lock(&self.script).always_unauthorized = true;
        self
    }

    pub(crate) fn with_profile_status(self, status: StatusCode) -> Self {
        lock(&self.script).profile_status = Some(status);
        self
    }

    pub(crate) fn offline(self) -> Self {
        lock(&self.script).offline = true;
        self
    }

    pub(crate) fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn sent_to(&self, path: &str) -> Vec<Request> {
        lock(&self.sent)
            .iter()
            .filter(|req| req.path() == path)
            .cloned()
            .collect()
    }

    fn is_authorized(&self, request: &Request) -> bool {
        let script = lock(&self.script);
        let expected = format!("Bearer {}", script.valid_access);
        !script.always_unauthorized
            && request
                .authorization()
                .and_then(|value| value.to_str().ok())
                .map_or(false, |value| value == expected)
    }

    async fn refresh(&self) -> Result<Response> {
        _ = self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        let (delay, refresh_reply) = {
            let script = lock(&self.script);
            (script.refresh_delay, script.refresh_reply.clone())
        };
        tokio::time::sleep(delay).await;

        match refresh_reply {
            RefreshReply::Grant { access, refresh } => {
                lock(&self.script).valid_access = access.to_owned();
                Ok(reply(
                    StatusCode::OK,
                    &json!({"access": access, "refresh": refresh}),
                ))
            }
            RefreshReply::Status(status) => Ok(reply(
                status,
                &json!({"detail": "Token is invalid or expired"}),
            )),
            RefreshReply::Hang => std::future::pending().await,
        }
    }
}

#[async_trait]
impl Transport for Backend {
    async fn send(&self, request: &Request) -> Result<Response> {
        lock(&self.sent).push(request.clone());
        let (offline, profile_status) = {
            let script = lock(&self.script);
            (script.offline, script.profile_status)
        };
        if offline {
            return Err(Error::Timeout);
        }

        if request.path() == REFRESH_PATH {
            return self.refresh().await;
        }
        if !self.is_authorized(request) {
            return Ok(reply(
                StatusCode::UNAUTHORIZED,
                &json!({"detail": "Given token not valid for any token type"}),
            ));
        }
        match (request.path(), profile_status) {
            (PROFILE_PATH, Some(status)) => Ok(reply(status, &json!({"detail": "unavailable"}))),
            (PROFILE_PATH, None) => Ok(reply(
                StatusCode::OK,
                &json!({
                    "id": "u1",
                    "email": "ada@example.com",
                    "username": "ada",
                    "is_verified": true,
                }),
            )),
            ("/broken/", _) => Ok(reply(
                StatusCode::INTERNAL_SERVER_ERROR,
                &json!({"detail": "boom"}),
            )),
            _ => Ok(reply(StatusCode::OK, &json!({"ok": true}))),
        }
    }
}
