// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::{sync::Arc, time::Duration};

use log::{debug, warn};
use reqwest::StatusCode;

use crate::{
    error::{Error, Result},
    refresh::Coordinator,
    session::Store,
    transport::{Request, Response, Transport},
};

/// Sends API requests on behalf of the current session.
///
/// Requests are authorized with the stored access token. A `401` answer
/// triggers one token refresh and one resend; anything the backend says after
/// that is final.
pub(crate) struct Client {
    transport: Arc<dyn Transport>,
    store: Arc<Store>,
    refresh: Coordinator,
}

impl Client {
    pub(crate) fn new(
        transport: Arc<dyn Transport>,
        store: Arc<Store>,
        refresh_timeout: Duration,
    ) -> Self {
        let refresh = Coordinator::new(
            Arc::clone(&transport),
            Arc::clone(&store),
            refresh_timeout,
        );
        Self {
            transport,
            store,
            refresh,
        }
    }

    pub(crate) const fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub(crate) async fn send(&self, mut request: Request) -> Result<Response> {
        if request.authorization().is_none() {
            if let Some(token) = self.store.access_token() {
                request.set_bearer(&token)?;
            }
        }

        let response = self.transport.send(&request).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return response.error_for_status();
        }
        if request.is_retried() {
            return Err(self.reject(&request, &response).await);
        }

        request.mark_retried();
        debug!(
            "{} {} was not authorized; refreshing the session",
            request.method(),
            request.path()
        );
        let Some(token) = self.refresh.refresh().await else {
            // The coordinator has already cleared the session.
            return Err(Error::Unauthorized {
                detail: Some(response.detail()),
            });
        };
        request.set_bearer(&token)?;

        let response = self.transport.send(&request).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(self.reject(&request, &response).await);
        }
        response.error_for_status()
    }

    async fn reject(&self, request: &Request, response: &Response) -> Error {
        warn!(
            "{} {} was not authorized even with a fresh token; ending the session",
            request.method(),
            request.path()
        );
        self.store.logout().await;
        Error::Unauthorized {
            detail: Some(response.detail()),
        }
    }
}

#[cfg(test)]
mod tests {
    use futures_util::future::join_all;
    use reqwest::header::{self, HeaderValue};

    use crate::{
        api::model::UserProfile,
        error,
        session::{Data, Token, Tokens},
        storage,
        transport::fake::{Backend, RefreshReply},
    };

    use super::*;

    const IMAGES: &str = "/images/my-images/";

    async fn store_with(access: &str, refresh: &str) -> Arc<Store> {
        let store = Arc::new(Store::new(Box::new(storage::Memory::<Data>::new())));
        store
            .set_session(
                Tokens::new(Token::new(access), Token::new(refresh)),
                Some(UserProfile {
                    id: "u1".to_owned(),
                    ..UserProfile::default()
                }),
            )
            .await;
        store.mark_hydrated();
        store
    }

    fn client(backend: &Arc<Backend>, store: &Arc<Store>) -> Client {
        Client::new(
            Arc::clone(backend) as Arc<dyn Transport>,
            Arc::clone(store),
            Duration::from_secs(5),
        )
    }

    fn bearer(request: &Request) -> Option<&str> {
        request.authorization().and_then(|value| value.to_str().ok())
    }

    #[tokio::test]
    async fn attaches_the_access_token() -> Result<()> {
        let backend = Arc::new(Backend::new("A1"));
        let store = store_with("A1", "R1").await;

        let _ = client(&backend, &store).send(Request::get(IMAGES)).await?;

        let sent = backend.sent_to(IMAGES);
        assert_eq!(sent.len(), 1);
        assert_eq!(bearer(&sent[0]), Some("Bearer A1"));
        assert_eq!(backend.refresh_calls(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn explicit_authorization_is_left_alone() -> Result<()> {
        let backend = Arc::new(Backend::new("delegated"));
        let store = store_with("A1", "R1").await;
        let request = Request::get(IMAGES).with_header(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer delegated"),
        );

        let _ = client(&backend, &store).send(request).await?;

        assert_eq!(bearer(&backend.sent_to(IMAGES)[0]), Some("Bearer delegated"));
        assert_eq!(backend.refresh_calls(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn expired_token_is_refreshed_and_retried_once() -> Result<()> {
        let backend = Arc::new(Backend::new("expired"));
        let store = store_with("A1", "R1").await;

        let _ = client(&backend, &store).send(Request::get(IMAGES)).await?;

        let sent = backend.sent_to(IMAGES);
        assert_eq!(sent.len(), 2);
        assert_eq!(bearer(&sent[0]), Some("Bearer A1"));
        assert_eq!(bearer(&sent[1]), Some("Bearer A2"));
        assert!(sent[1].is_retried());

        let state = store.snapshot();
        assert_eq!(state.session.access_token().map(Token::expose), Some("A2"));
        assert_eq!(state.session.refresh_token().map(Token::expose), Some("R1"));
        assert_eq!(state.session.user.map(|user| user.id), Some("u1".to_owned()));
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_rejections_share_one_refresh() {
        let backend = Arc::new(Backend::new("expired"));
        let store = store_with("A1", "R1").await;
        let client = client(&backend, &store);

        let results = join_all((0..4).map(|_| client.send(Request::get(IMAGES)))).await;

        assert!(results.iter().all(Result::is_ok));
        assert_eq!(backend.refresh_calls(), 1);
        let retried = backend
            .sent_to(IMAGES)
            .into_iter()
            .filter(Request::is_retried)
            .collect::<Vec<_>>();
        assert_eq!(retried.len(), 4);
        assert!(retried.iter().all(|req| bearer(req) == Some("Bearer A2")));
    }

    #[tokio::test]
    async fn failed_refresh_is_an_authentication_failure() {
        let backend = Arc::new(
            Backend::new("expired").with_refresh_reply(RefreshReply::Status(StatusCode::BAD_REQUEST)),
        );
        let store = store_with("A1", "R1").await;

        let result = client(&backend, &store).send(Request::get(IMAGES)).await;

        assert!(matches!(result, Err(Error::Unauthorized { .. })));
        assert_eq!(backend.sent_to(IMAGES).len(), 1);
        let state = store.snapshot();
        assert!(state.session.tokens.is_none());
        assert!(state.session.user.is_none());
    }

    #[tokio::test]
    async fn concurrent_rejections_share_one_failed_refresh() {
        let backend = Arc::new(
            Backend::new("expired").with_refresh_reply(RefreshReply::Status(StatusCode::BAD_REQUEST)),
        );
        let store = store_with("A1", "R1").await;
        let client = client(&backend, &store);

        let results = join_all((0..4).map(|_| client.send(Request::get(IMAGES)))).await;

        assert_eq!(backend.refresh_calls(), 1);
        assert!(results
            .iter()
            .all(|result| matches!(result, Err(Error::Unauthorized { .. }))));
        assert!(backend.sent_to(IMAGES).iter().all(|req| !req.is_retried()));
        let state = store.snapshot();
        assert!(state.session.tokens.is_none());
        assert!(state.session.user.is_none());
    }

    #[tokio::test]
    async fn second_rejection_is_final() {
        let backend = Arc::new(Backend::new("A1").always_unauthorized());
        let store = store_with("A1", "R1").await;

        let result = client(&backend, &store).send(Request::get(IMAGES)).await;

        assert!(matches!(result, Err(Error::Unauthorized { .. })));
        assert_eq!(backend.sent_to(IMAGES).len(), 2);
        assert_eq!(backend.refresh_calls(), 1);
        assert!(!store.snapshot().is_authenticated());
    }

    #[tokio::test]
    async fn logged_out_rejection_skips_the_refresh_call() {
        let backend = Arc::new(Backend::new("A1"));
        let store = Arc::new(Store::new(Box::new(storage::Memory::<Data>::new())));
        store.mark_hydrated();

        let result = client(&backend, &store).send(Request::get(IMAGES)).await;

        assert!(matches!(
            result,
            Err(Error::Unauthorized { detail: Some(ref detail) }) if detail.contains("not valid")
        ));
        assert_eq!(backend.refresh_calls(), 0);
        assert!(bearer(&backend.sent_to(IMAGES)[0]).is_none());
    }

    #[tokio::test]
    async fn network_errors_keep_the_session() {
        let backend = Arc::new(Backend::new("A1").offline());
        let store = store_with("A1", "R1").await;

        let result = client(&backend, &store).send(Request::get(IMAGES)).await;

        assert!(matches!(result, Err(Error::Timeout)));
        assert_eq!(backend.refresh_calls(), 0);
        assert!(store.snapshot().is_authenticated());
    }

    #[tokio::test]
    async fn other_error_statuses_pass_through() {
        let backend = Arc::new(Backend::new("A1"));
        let store = store_with("A1", "R1").await;

        let result = client(&backend, &store).send(Request::get("/broken/")).await;

        assert!(matches!(
            result,
            Err(Error::Api(error::Api::Status {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                ..
            }))
        ));
        assert!(store.snapshot().is_authenticated());
    }
}
