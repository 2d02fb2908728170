// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::{ffi::OsString, path::Path};

use async_trait::async_trait;
use secrecy::{ExposeSecret as _, SecretString};
use tokio::task;

use crate::{
    error::{self, Result},
    metadata,
};

#[derive(Debug, Clone)]
pub(crate) struct Request {
    label: String,
    description: String,
}

impl Request {
    pub(crate) fn new<L: Into<String>, D: Into<String>>(label: L, description: D) -> Self {
        Self {
            label: label.into(),
            description: description.into(),
        }
    }
}

#[async_trait]
pub(crate) trait Prompt: Send + Sync {
    async fn prompt(&self, req: Request) -> Result<Option<SecretString>>;
}

#[async_trait]
impl<T: Prompt + ?Sized> Prompt for Box<T> {
    async fn prompt(&self, req: Request) -> Result<Option<SecretString>> {
        (**self).prompt(req).await
    }
}

#[async_trait]
impl<T: Prompt> Prompt for Vec<T> {
    async fn prompt(&self, req: Request) -> Result<Option<SecretString>> {
        for candidate in self {
            if let r @ (Ok(Some(_)) | Err(_)) = candidate.prompt(req.clone()).await {
                return r;
            }
        }

        Ok(None)
    }
}

/// Asks for a secret, failing when no prompt can supply one.
pub(crate) async fn require<P: Prompt + ?Sized>(prompt: &P, req: Request) -> Result<SecretString> {
    prompt
        .prompt(req)
        .await?
        .ok_or_else(|| error::Password::NoPrompt.into())
}

/// Asks for a new password twice and insists that both entries agree.
pub(crate) async fn require_confirmed<P: Prompt + ?Sized>(
    prompt: &P,
    label: &str,
) -> Result<(SecretString, SecretString)> {
    let first = require(prompt, Request::new(label, format!("Choose a {}.", label.to_lowercase())))
        .await?;
    let second = require(
        prompt,
        Request::new(
            format!("Confirm {}", label.to_lowercase()),
            "Enter the same password again.",
        ),
    )
    .await?;
    if first.expose_secret() != second.expose_secret() {
        return Err(error::Password::Mismatch.into());
    }
    Ok((first, second))
}

pub(crate) struct PinentryPrompt {
    executable: Option<OsString>,
}

impl PinentryPrompt {
    pub(crate) const fn new() -> Self {
        Self { executable: None }
    }

    pub(crate) fn new_with_executable<P: AsRef<Path>>(executable: P) -> Self {
        Self {
            executable: Some(executable.as_ref().as_os_str().into()),
        }
    }
}

#[async_trait]
impl Prompt for PinentryPrompt {
    async fn prompt(&self, req: Request) -> Result<Option<SecretString>> {
        fn interact<'input>(
            mut input: pinentry::PassphraseInput<'input>,
            title: &'input str,
            req: &'input Request,
        ) -> Result<SecretString> {
            _ = input.required("A password is required to continue.");
            _ = input.with_title(title);
            _ = input.with_description(&req.description);
            _ = input.with_prompt(&req.label);

            Ok(input.interact()?)
        }

        let title = format!("{} - {}", req.label, *metadata::CLIENT_DISPLAY_NAME);

        let input = self
            .executable
            .as_ref()
            .and_then(pinentry::PassphraseInput::with_binary)
            .or_else(pinentry::PassphraseInput::with_default_binary)
            .map(|input| task::spawn_blocking(move || interact(input, &title, &req)));

        Ok(match input {
            Some(fut) => Some(fut.await??),
            None => None,
        })
    }
}

pub(crate) struct RpasswordPrompt;

#[async_trait]
impl Prompt for RpasswordPrompt {
    async fn prompt(&self, req: Request) -> Result<Option<SecretString>> {
        Ok(Some(
            task::spawn_blocking(move || {
                rpassword::prompt_password(format!("{}: ", req.label)).map(SecretString::new)
            })
            .await??,
        ))
    }
}
