// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::{future::Future, sync::Arc, time::Duration};

use futures_util::{
    future::{BoxFuture, Shared},
    lock::Mutex,
    FutureExt as _,
};
use log::{debug, info, warn};
use tokio::time;

use crate::{
    api::{auth::RefreshToken, model::RefreshGrant, Endpoint as _},
    error::Result,
    session::{Store, Token, Tokens},
    transport::Transport,
};

type Pending = Shared<BoxFuture<'static, Option<Token>>>;

/// Funnels every token refresh through at most one request.
///
/// The pending exchange itself is the lock: while a [`Pending`] future is
/// stored, callers clone it instead of starting their own, and the exchange
/// removes itself once it has settled.
pub(crate) struct Coordinator {
    transport: Arc<dyn Transport>,
    store: Arc<Store>,
    timeout: Duration,
    in_flight: Arc<Mutex<Option<Pending>>>,
}

impl Coordinator {
    pub(crate) fn new(transport: Arc<dyn Transport>, store: Arc<Store>, timeout: Duration) -> Self {
        Self {
            transport,
            store,
            timeout,
            in_flight: Arc::new(Mutex::new(None)),
        }
    }

    /// Resolves to the new access token, or to `None` once the session has
    /// been cleared because it cannot be renewed.
    pub(crate) async fn refresh(&self) -> Option<Token> {
        let Some(refresh_token) = self.store.refresh_token() else {
            info!("No refresh token is stored; ending the session");
            self.store.logout().await;
            return None;
        };

        let pending = {
            let mut in_flight = self.in_flight.lock().await;
            if let Some(pending) = in_flight.as_ref() {
                debug!("Joining the token refresh already in flight");
                pending.clone()
            } else {
                let pending = self.settle(refresh_token).boxed().shared();
                *in_flight = Some(pending.clone());
                pending
            }
        };
        pending.await
    }

    fn settle(&self, refresh_token: Token) -> impl Future<Output = Option<Token>> + Send + 'static {
        let transport = Arc::clone(&self.transport);
        let store = Arc::clone(&self.store);
        let in_flight = Arc::clone(&self.in_flight);
        let limit = self.timeout;

        async move {
            let tokens = match time::timeout(limit, exchange(transport.as_ref(), refresh_token)).await
            {
                Ok(Ok(Some(tokens))) => Some(tokens),
                Ok(Ok(None)) => {
                    warn!("The token refresh response did not contain an access token");
                    None
                }
                Ok(Err(err)) => {
                    warn!("Could not refresh the access token: {}", err);
                    None
                }
                Err(_) => {
                    warn!(
                        "Token refresh did not finish within {} ms",
                        limit.as_millis()
                    );
                    None
                }
            };

            let access = if let Some(tokens) = tokens {
                let access = tokens.access.clone();
                store.set_tokens(tokens).await;
                debug!("Access token refreshed");
                Some(access)
            } else {
                store.logout().await;
                None
            };

            *in_flight.lock().await = None;
            access
        }
    }
}

/// Keeps the current refresh token when the server does not rotate it.
async fn exchange(transport: &dyn Transport, refresh: Token) -> Result<Option<Tokens>> {
    let request = RefreshToken {
        refresh: refresh.clone(),
    }
    .request()?;
    let grant: RefreshGrant = transport.send(&request).await?.error_for_status()?.json()?;

    Ok(grant
        .access
        .filter(|access| !access.is_empty())
        .map(|access| Tokens::new(access, grant.refresh.unwrap_or(refresh))))
}
