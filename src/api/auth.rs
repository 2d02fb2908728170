// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use serde_json::json;

use crate::{
    client::Client,
    error::Result,
    session::{Token, Tokens},
    transport::Request,
};

use super::{
    model::{
        AuthGrant, Detail, LoginPayload, PasswordResetConfirmPayload,
        PasswordResetRequestPayload, RefreshGrant, RegisterPayload, UserProfile,
    },
    Endpoint,
};

pub(crate) const REFRESH_PATH: &str = "/auth/token/refresh/";
pub(crate) const PROFILE_PATH: &str = "/auth/profile/";

pub(crate) struct Login(pub(crate) LoginPayload);

impl Endpoint for Login {
    type Response = AuthGrant;

    fn request(&self) -> Result<Request> {
        Request::post("/auth/login/").with_json(&self.0)
    }
}

/// Exchanges a refresh token for a new access token. Sent straight to the
/// transport, never through the request pipeline.
pub(crate) struct RefreshToken {
    pub(crate) refresh: Token,
}

impl Endpoint for RefreshToken {
    type Response = RefreshGrant;

    fn request(&self) -> Result<Request> {
        Request::post(REFRESH_PATH).with_json(&json!({ "refresh": self.refresh }))
    }
}

pub(crate) struct Register(pub(crate) RegisterPayload);

impl Endpoint for Register {
    type Response = Detail;

    fn request(&self) -> Result<Request> {
        Request::post("/auth/register/").with_json(&self.0)
    }
}

pub(crate) struct FetchProfile;

impl Endpoint for FetchProfile {
    type Response = UserProfile;

    fn request(&self) -> Result<Request> {
        Ok(Request::get(PROFILE_PATH))
    }
}

pub(crate) struct RequestPasswordReset(pub(crate) PasswordResetRequestPayload);

impl Endpoint for RequestPasswordReset {
    type Response = Detail;

    fn request(&self) -> Result<Request> {
        Request::post("/auth/password/reset/request/").with_json(&self.0)
    }
}

pub(crate) struct ConfirmPasswordReset(pub(crate) PasswordResetConfirmPayload);

impl Endpoint for ConfirmPasswordReset {
    type Response = Detail;

    fn request(&self) -> Result<Request> {
        Request::post("/auth/password/reset/confirm/").with_json(&self.0)
    }
}

pub(crate) struct VerifyEmail {
    pub(crate) token: String,
}

impl Endpoint for VerifyEmail {
    type Response = Detail;

    fn request(&self) -> Result<Request> {
        Ok(Request::get(format!("/auth/verify-email/{}/", self.token)))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum ProfileImage {
    Avatar,
    Cover,
}

pub(crate) struct UploadProfileImage {
    pub(crate) kind: ProfileImage,
    pub(crate) file_name: String,
    pub(crate) content: Vec<u8>,
}

impl Endpoint for UploadProfileImage {
    type Response = UserProfile;

    fn request(&self) -> Result<Request> {
        let path = match self.kind {
            ProfileImage::Avatar => "/auth/profile/avatar/",
            ProfileImage::Cover => "/auth/profile/cover/",
        };
        Ok(Request::post(path).with_file("file", self.file_name.clone(), self.content.clone()))
    }
}

/// Logs in and starts a new session from the grant.
pub(crate) async fn login(client: &Client, payload: LoginPayload) -> Result<UserProfile> {
    let grant = Login(payload).execute(client).await?;
    client
        .store()
        .set_session(
            Tokens::new(grant.access, grant.refresh),
            Some(grant.user.clone()),
        )
        .await;
    Ok(grant.user)
}
