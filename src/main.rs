// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
#![deny(elided_lifetimes_in_paths)]
#![warn(
    rust_2018_idioms,
    future_incompatible,
    unused,
    unused_lifetimes,
    unused_qualifications,
    unused_results,
    anonymous_parameters,
    deprecated_in_future,
    elided_lifetimes_in_paths,
    explicit_outlives_requirements,
    keyword_idents,
    macro_use_extern_crate,
    missing_doc_code_examples,
    private_doc_tests,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    clippy::unseparated_literal_suffix,
    clippy::decimal_literal_representation,
    clippy::single_char_lifetime_names,
    clippy::fallible_impl_from,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::wildcard_enum_match_arm,
    clippy::deref_by_slicing,
    clippy::default_numeric_fallback,
    clippy::shadow_reuse,
    clippy::clone_on_ref_ptr,
    clippy::todo,
    clippy::string_add,
    clippy::use_debug,
    clippy::future_not_send
)]
#![cfg_attr(not(test), warn(clippy::panic_in_result_fn))]

mod api;
mod bootstrap;
mod client;
mod command;
mod config;
mod error;
mod metadata;
mod password;
mod refresh;
mod session;
mod storage;
mod transport;

use std::{path::PathBuf, process, sync::Arc};

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use client::Client;
use command::{Access, Command as _, Context};
use config::Config;
use error::Result;
use log::{debug, error, info, warn};
use session::{
    guard::{self, Decision},
    hydration::{Gate, View},
    Data, Store,
};
use storage::IsPersistent as _;
use transport::Transport;
use url::Url;

#[derive(Debug, Subcommand)]
enum Command {
    Login(command::auth::Login),
    Logout(command::auth::Logout),
    Register(command::auth::Register),
    VerifyEmail(command::auth::VerifyEmail),
    ResetPassword(command::auth::ResetPassword),
    Whoami(command::profile::Whoami),
    Avatar(command::profile::Avatar),
    Cover(command::profile::Cover),
    Generate(command::images::Generate),
    Images(command::images::Mine),
    Gallery(command::images::Gallery),
    Share(command::images::Share),
    Like(command::images::Like),
    Download(command::images::Download),
}

#[async_trait]
impl command::Command for Command {
    fn access(&self) -> Access {
        match self {
            Self::Login(cmd) => cmd.access(),
            Self::Logout(cmd) => cmd.access(),
            Self::Register(cmd) => cmd.access(),
            Self::VerifyEmail(cmd) => cmd.access(),
            Self::ResetPassword(cmd) => cmd.access(),
            Self::Whoami(cmd) => cmd.access(),
            Self::Avatar(cmd) => cmd.access(),
            Self::Cover(cmd) => cmd.access(),
            Self::Generate(cmd) => cmd.access(),
            Self::Images(cmd) => cmd.access(),
            Self::Gallery(cmd) => cmd.access(),
            Self::Share(cmd) => cmd.access(),
            Self::Like(cmd) => cmd.access(),
            Self::Download(cmd) => cmd.access(),
        }
    }

    async fn execute(self, ctx: &Context) -> Result<()> {
        match self {
            Self::Login(cmd) => cmd.execute(ctx).await,
            Self::Logout(cmd) => cmd.execute(ctx).await,
            Self::Register(cmd) => cmd.execute(ctx).await,
            Self::VerifyEmail(cmd) => cmd.execute(ctx).await,
            Self::ResetPassword(cmd) => cmd.execute(ctx).await,
            Self::Whoami(cmd) => cmd.execute(ctx).await,
            Self::Avatar(cmd) => cmd.execute(ctx).await,
            Self::Cover(cmd) => cmd.execute(ctx).await,
            Self::Generate(cmd) => cmd.execute(ctx).await,
            Self::Images(cmd) => cmd.execute(ctx).await,
            Self::Gallery(cmd) => cmd.execute(ctx).await,
            Self::Share(cmd) => cmd.execute(ctx).await,
            Self::Like(cmd) => cmd.execute(ctx).await,
            Self::Download(cmd) => cmd.execute(ctx).await,
        }
    }
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// The base URL of the Imagaine API.
    #[arg(long, env = "IMAGAINE_API_URL", default_value = config::DEFAULT_API_URL, value_parser = Url::parse)]
    api_url: Url,

    /// How long to wait for any single API request, in seconds.
    #[arg(long, env = "IMAGAINE_TIMEOUT", default_value = config::DEFAULT_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..))]
    timeout: u64,

    /// How long a token refresh may take before the session is given up, in
    /// seconds.
    #[arg(long, env = "IMAGAINE_REFRESH_TIMEOUT", default_value = config::DEFAULT_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..))]
    refresh_timeout: u64,

    /// Keep the session in memory only. Every command then starts logged out.
    #[arg(long)]
    no_persist_session: bool,

    /// The path to the Pinentry program to use when asking for passwords.
    #[arg(long, value_hint = clap::ValueHint::ExecutablePath)]
    pinentry_program: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

async fn get_session_storage(args: &Args, api_url: &Url) -> Box<dyn storage::Storage<Data>> {
    if !args.no_persist_session {
        #[cfg(feature = "secret-service")]
        match storage::SecretService::new(api_url).await {
            Ok(secret_service_storage) => return Box::new(secret_service_storage),
            Err(e) => {
                warn!("We need to fall back to unencrypted file storage because we can't connect to the secret service: {}", e);
            }
        }

        #[cfg(feature = "keychain")]
        match storage::Keychain::new(api_url) {
            Ok(keychain_storage) => return Box::new(keychain_storage),
            Err(e) => {
                warn!("We need to fall back to unencrypted file storage because we can't connect to Keychain: {}", e);
            }
        }

        match storage::File::new(format!("{}.json", metadata::SESSION_STORAGE_KEY)) {
            Ok(file_storage) => {
                debug!("Keeping the session in {}", file_storage.path().display());
                return Box::new(file_storage);
            }
            Err(e) => warn!("The session will not outlive this command: {}", e),
        }
    }

    // Only referenced when a keyring feature is enabled.
    _ = api_url;
    Box::new(storage::Memory::<Data>::new())
}

/// The command line as typed, for telling the user what to rerun.
fn invocation() -> String {
    std::env::args()
        .skip(1)
        .collect::<Vec<_>>()
        .join(" ")
}

async fn run(args: Args) -> Result<()> {
    let config = Config::new(args.api_url.clone(), args.timeout, args.refresh_timeout);
    if !matches!(config.api_url.scheme(), "http" | "https") {
        error!(
            "The URL scheme {} of URL {} is not supported",
            config.api_url.scheme(),
            config.api_url
        );
        return Err(error::Error::Command);
    }

    let storage = get_session_storage(&args, &config.api_url).await;
    if !storage.is_persistent() {
        info!("The session is kept in memory only");
    }
    let store = Arc::new(Store::new(storage));

    let mut gate = Gate::new(store.subscribe());
    if matches!(gate.view(), View::Loading) {
        info!("Synchronizing session...");
    }
    let ((), state) = tokio::join!(store.hydrate(), gate.opened());
    let state = state?;

    let cmd = args.command;
    let access = command::Command::access(&cmd);
    let decision = match access {
        Access::Open => Decision::Proceed,
        Access::Protected => guard::protected(&state, &invocation()),
        Access::PublicOnly => guard::public_only(&state),
    };
    match decision {
        Decision::Proceed => {}
        Decision::Wait => return Err(error::Internal::NotHydrated.into()),
        Decision::Redirect { from, .. } if access == Access::Protected => {
            error!(
                "You are not logged in. Run `{} {}` first, then rerun `{} {}`.",
                *metadata::CLIENT_TYPE_ID,
                guard::LOGIN_LOCATION,
                *metadata::CLIENT_TYPE_ID,
                from.unwrap_or_default()
            );
            return Err(error::Error::Unauthorized { detail: None });
        }
        Decision::Redirect { .. } => {
            warn!(
                "You are already logged in{}; run `{} logout` first to switch accounts",
                state
                    .session
                    .user
                    .as_ref()
                    .map(|user| format!(" as {}", user.username))
                    .unwrap_or_default(),
                *metadata::CLIENT_TYPE_ID
            );
            return Ok(());
        }
    }

    let transport: Arc<dyn Transport> =
        Arc::new(transport::Http::new(config.api_url.clone(), config.timeout)?);
    let client = Client::new(transport, store, config.refresh_timeout);

    let prompt: Vec<Box<dyn password::Prompt>> = vec![
        Box::new(args.pinentry_program.map_or_else(
            password::PinentryPrompt::new,
            password::PinentryPrompt::new_with_executable,
        )),
        Box::new(password::RpasswordPrompt),
    ];
    let ctx = Context {
        client,
        prompt: Box::new(prompt),
    };

    command::Command::execute(cmd, &ctx).await
}

#[tokio::main]
async fn main() {
    let logger_env = env_logger::Env::new()
        .filter_or("IMAGAINE_LOG", "warn")
        .write_style("IMAGAINE_LOG_STYLE");
    env_logger::Builder::from_env(logger_env).init();

    if let Err(e) = run(Args::parse()).await {
        error!("We encountered an error: {}", e);
        process::exit(1);
    };
}
