// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use log::{debug, warn};

use crate::{
    api::{auth::FetchProfile, model::UserProfile, Endpoint as _},
    client::Client,
    error::Result,
};

/// Refreshes the cached profile of the current session.
///
/// A session the backend will not describe is ended. Failing to reach the
/// backend leaves the session as it is.
pub(crate) async fn sync_profile(client: &Client) -> Result<Option<UserProfile>> {
    if !client.store().snapshot().is_authenticated() {
        debug!("Not logged in; skipping profile refresh");
        return Ok(None);
    }

    match FetchProfile.execute(client).await {
        Ok(profile) => {
            client.store().set_user(Some(profile.clone())).await;
            Ok(Some(profile))
        }
        Err(err) if err.is_http() => {
            warn!("Profile is unavailable ({}); ending the session", err);
            if client.store().snapshot().is_authenticated() {
                client.store().logout().await;
            }
            Err(err)
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use reqwest::StatusCode;

    use crate::{
        error::Error,
        session::{Data, Store, Token, Tokens},
        storage,
        transport::{fake::Backend, Transport},
    };

    use super::*;

    async fn client_for(backend: &Arc<Backend>) -> Client {
        let store = Arc::new(Store::new(Box::new(storage::Memory::<Data>::new())));
        store
            .set_session(Tokens::new(Token::new("A1"), Token::new("R1")), None)
            .await;
        store.mark_hydrated();
        Client::new(
            Arc::clone(backend) as Arc<dyn Transport>,
            store,
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn fills_in_the_cached_user() -> Result<()> {
        let backend = Arc::new(Backend::new("A1"));
        let client = client_for(&backend).await;

        let profile = sync_profile(&client).await?;

        assert_eq!(profile.map(|p| p.username), Some("ada".to_owned()));
        assert_eq!(
            client.store().user().map(|user| user.id),
            Some("u1".to_owned())
        );
        Ok(())
    }

    #[tokio::test]
    async fn unavailable_profile_ends_the_session() {
        let backend = Arc::new(Backend::new("A1").with_profile_status(StatusCode::NOT_FOUND));
        let client = client_for(&backend).await;

        assert!(sync_profile(&client).await.is_err());
        assert!(!client.store().snapshot().is_authenticated());
    }

    #[tokio::test]
    async fn unreachable_backend_keeps_the_session() {
        let backend = Arc::new(Backend::new("A1").offline());
        let client = client_for(&backend).await;

        assert!(matches!(sync_profile(&client).await, Err(Error::Timeout)));
        assert!(client.store().snapshot().is_authenticated());
    }
}
