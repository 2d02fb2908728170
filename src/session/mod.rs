// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

pub(crate) mod guard;
pub(crate) mod hydration;
mod store;

use std::fmt;

use secrecy::{ExposeSecret as _, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::api::model::UserProfile;

pub(crate) use store::Store;

/// A bearer credential. Debug output never shows the value.
#[derive(Clone)]
pub(crate) struct Token(SecretString);

impl Token {
    pub(crate) fn new<S: Into<String>>(value: S) -> Self {
        Self(SecretString::new(value.into()))
    }

    pub(crate) fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.expose().is_empty()
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token([REDACTED])")
    }
}

impl Serialize for Token {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.expose())
    }
}

impl<'de> Deserialize<'de> for Token {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Tokens {
    pub(crate) access: Token,
    pub(crate) refresh: Token,
}

impl Tokens {
    pub(crate) const fn new(access: Token, refresh: Token) -> Self {
        Self { access, refresh }
    }
}

/// The persisted part of the session. Both tokens live in one `Option` so
/// that neither can be present without the other.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(from = "Persisted", into = "Persisted")]
pub(crate) struct Data {
    pub(crate) tokens: Option<Tokens>,
    pub(crate) user: Option<UserProfile>,
}

impl Data {
    pub(crate) fn is_authenticated(&self) -> bool {
        self.tokens
            .as_ref()
            .map_or(false, |tokens| !tokens.access.is_empty())
    }

    pub(crate) fn access_token(&self) -> Option<&Token> {
        self.tokens
            .as_ref()
            .map(|tokens| &tokens.access)
            .filter(|token| !token.is_empty())
    }

    pub(crate) fn refresh_token(&self) -> Option<&Token> {
        self.tokens
            .as_ref()
            .map(|tokens| &tokens.refresh)
            .filter(|token| !token.is_empty())
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Persisted {
    #[serde(default)]
    access_token: Option<Token>,
    #[serde(default)]
    refresh_token: Option<Token>,
    #[serde(default)]
    user: Option<UserProfile>,
}

impl From<Persisted> for Data {
    fn from(value: Persisted) -> Self {
        let tokens = match (value.access_token, value.refresh_token) {
            (Some(access), Some(refresh)) => Some(Tokens::new(access, refresh)),
            _ => None,
        };
        Self {
            tokens,
            user: value.user,
        }
    }
}

impl From<Data> for Persisted {
    fn from(value: Data) -> Self {
        let (access_token, refresh_token) = match value.tokens {
            Some(tokens) => (Some(tokens.access), Some(tokens.refresh)),
            None => (None, None),
        };
        Self {
            access_token,
            refresh_token,
            user: value.user,
        }
    }
}

/// Everything an observer of the session can see.
#[derive(Clone, Debug, Default)]
pub(crate) struct State {
    pub(crate) session: Data,
    pub(crate) has_hydrated: bool,
}

impl State {
    pub(crate) fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }
}
