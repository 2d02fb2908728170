// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use futures_util::lock::Mutex;
use log::{debug, warn};
use tokio::sync::watch;

use crate::{api::model::UserProfile, storage};

use super::{Data, State, Token, Tokens};

/// Owner of the authentication state.
///
/// Every mutation changes the observable [`State`] in one step and then writes
/// the resulting [`Data`] to storage. The storage lock is held across both, so
/// durable writes land in the same order as the in-memory changes.
pub(crate) struct Store {
    state: watch::Sender<State>,
    storage: Mutex<Box<dyn storage::Storage<Data>>>,
}

impl Store {
    pub(crate) fn new(storage: Box<dyn storage::Storage<Data>>) -> Self {
        let (state, _) = watch::channel(State::default());
        Self {
            state,
            storage: Mutex::new(storage),
        }
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<State> {
        self.state.subscribe()
    }

    pub(crate) fn snapshot(&self) -> State {
        self.state.borrow().clone()
    }

    pub(crate) fn access_token(&self) -> Option<Token> {
        self.state.borrow().session.access_token().cloned()
    }

    pub(crate) fn refresh_token(&self) -> Option<Token> {
        self.state.borrow().session.refresh_token().cloned()
    }

    pub(crate) fn user(&self) -> Option<UserProfile> {
        self.state.borrow().session.user.clone()
    }

    pub(crate) async fn set_session(&self, tokens: Tokens, user: Option<UserProfile>) {
        self.commit(|session| {
            *session = Data {
                tokens: Some(tokens),
                user,
            };
            true
        })
        .await;
    }

    /// Replaces both tokens and keeps the cached profile.
    pub(crate) async fn set_tokens(&self, tokens: Tokens) {
        self.commit(|session| {
            session.tokens = Some(tokens);
            true
        })
        .await;
    }

    pub(crate) async fn set_user(&self, user: Option<UserProfile>) {
        self.commit(|session| {
            session.user = user;
            true
        })
        .await;
    }

    pub(crate) async fn logout(&self) {
        self.commit(|session| {
            let modified = session.tokens.is_some() || session.user.is_some();
            *session = Data::default();
            modified
        })
        .await;
    }

    pub(crate) fn mark_hydrated(&self) {
        _ = self
            .state
            .send_if_modified(|state| !std::mem::replace(&mut state.has_hydrated, true));
    }

    /// Loads the persisted session once. Hydration completes even when the
    /// read fails; the session then simply starts out empty.
    pub(crate) async fn hydrate(&self) {
        {
            let mut storage = self.storage.lock().await;
            match storage.get().await {
                Ok(Some(data)) => {
                    debug!(
                        "Restored persisted session (authenticated: {})",
                        data.is_authenticated()
                    );
                    self.state.send_modify(|state| state.session = data);
                }
                Ok(None) => debug!("No persisted session found"),
                Err(err) => warn!("Could not restore the persisted session: {}", err),
            }
        }
        self.mark_hydrated();
    }

    async fn commit<F: FnOnce(&mut Data) -> bool>(&self, mutate: F) {
        let mut storage = self.storage.lock().await;
        _ = self.state.send_if_modified(|state| mutate(&mut state.session));
        let data = self.state.borrow().session.clone();
        if let Err(err) = storage.update(&data).await {
            warn!("Could not persist the session: {}", err);
        }
    }
}
