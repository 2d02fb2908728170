// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use log::info;

use crate::{
    api::{
        self,
        model::{
            LoginPayload, PasswordResetConfirmPayload, PasswordResetRequestPayload,
            RegisterPayload,
        },
        Endpoint as _,
    },
    error::Result,
    password,
};

use super::{Access, Context};

/// Log in and keep the session for later commands.
#[derive(Debug, Parser)]
pub(crate) struct Login {
    /// The email address of the account.
    #[arg(long, short, env = "IMAGAINE_EMAIL")]
    email: String,
}

#[async_trait]
impl super::Command for Login {
    fn access(&self) -> Access {
        Access::PublicOnly
    }

    async fn execute(self, ctx: &Context) -> Result<()> {
        let password = password::require(
            ctx.prompt.as_ref(),
            password::Request::new("Password", format!("Enter the password for {}.", self.email)),
        )
        .await?;

        let user = api::auth::login(
            &ctx.client,
            LoginPayload {
                email: self.email,
                password,
            },
        )
        .await?;
        println!("Logged in as {} <{}>", user.username, user.email);
        if !user.is_verified {
            println!("Your email address is not verified yet; check your inbox.");
        }
        Ok(())
    }
}

/// Forget the current session.
#[derive(Debug, Parser)]
pub(crate) struct Logout;

#[async_trait]
impl super::Command for Logout {
    fn access(&self) -> Access {
        Access::Open
    }

    async fn execute(self, ctx: &Context) -> Result<()> {
        if ctx.client.store().snapshot().is_authenticated() {
            let user = ctx.client.store().user();
            ctx.client.store().logout().await;
            match user {
                Some(user) => println!("Logged out {}", user.username),
                None => println!("Logged out"),
            }
        } else {
            info!("There is no session to log out of");
        }
        Ok(())
    }
}

/// Create a new account.
#[derive(Debug, Parser)]
pub(crate) struct Register {
    /// The email address to register.
    #[arg(long, short)]
    email: String,

    /// The public name of the account.
    #[arg(long, short)]
    username: String,

    #[arg(long)]
    first_name: String,

    #[arg(long)]
    last_name: String,

    /// A short description shown on the profile.
    #[arg(long)]
    bio: Option<String>,
}

#[async_trait]
impl super::Command for Register {
    fn access(&self) -> Access {
        Access::PublicOnly
    }

    async fn execute(self, ctx: &Context) -> Result<()> {
        let (password, password2) =
            password::require_confirmed(ctx.prompt.as_ref(), "Password").await?;

        let resp = api::auth::Register(RegisterPayload {
            email: self.email,
            username: self.username,
            password,
            password2,
            first_name: self.first_name,
            last_name: self.last_name,
            bio: self.bio,
        })
        .execute(&ctx.client)
        .await?;
        println!("{}", resp.detail);
        Ok(())
    }
}

/// Confirm an email address with the token from the verification email.
#[derive(Debug, Parser)]
pub(crate) struct VerifyEmail {
    token: String,
}

#[async_trait]
impl super::Command for VerifyEmail {
    fn access(&self) -> Access {
        Access::Open
    }

    async fn execute(self, ctx: &Context) -> Result<()> {
        let resp = api::auth::VerifyEmail { token: self.token }
            .execute(&ctx.client)
            .await?;
        println!("{}", resp.detail);
        Ok(())
    }
}

#[derive(Debug, Subcommand)]
enum ResetStep {
    /// Email a password reset token to the account.
    Request {
        #[arg(long, short)]
        email: String,
    },
    /// Choose a new password using the emailed token.
    Confirm { token: String },
}

/// Reset a forgotten password.
#[derive(Debug, Parser)]
pub(crate) struct ResetPassword {
    #[clap(subcommand)]
    step: ResetStep,
}

#[async_trait]
impl super::Command for ResetPassword {
    fn access(&self) -> Access {
        Access::PublicOnly
    }

    async fn execute(self, ctx: &Context) -> Result<()> {
        let resp = match self.step {
            ResetStep::Request { email } => {
                api::auth::RequestPasswordReset(PasswordResetRequestPayload { email })
                    .execute(&ctx.client)
                    .await?
            }
            ResetStep::Confirm { token } => {
                let (new_password, new_password_confirm) =
                    password::require_confirmed(ctx.prompt.as_ref(), "New password").await?;
                api::auth::ConfirmPasswordReset(PasswordResetConfirmPayload {
                    token,
                    new_password,
                    new_password_confirm,
                })
                .execute(&ctx.client)
                .await?
            }
        };
        println!("{}", resp.detail);
        Ok(())
    }
}
