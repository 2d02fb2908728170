// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::{fs, path::PathBuf};

use async_trait::async_trait;
use clap::Parser;
use tabled::{settings::Style, Table, Tabled};

use crate::{
    api::{
        auth::{ProfileImage, UploadProfileImage},
        model::UserProfile,
        Endpoint as _,
    },
    bootstrap,
    error::{self, Result},
};

use super::{Access, Context};

#[derive(Tabled)]
struct Row {
    #[tabled(rename = "Field")]
    field: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

fn rows(user: &UserProfile) -> Vec<Row> {
    let mut rows = vec![
        Row {
            field: "Username",
            value: user.username.clone(),
        },
        Row {
            field: "Email",
            value: user.email.clone(),
        },
        Row {
            field: "Name",
            value: format!("{} {}", user.first_name, user.last_name)
                .trim()
                .to_owned(),
        },
        Row {
            field: "Verified",
            value: if user.is_verified { "yes" } else { "no" }.to_owned(),
        },
    ];
    if !user.bio.is_empty() {
        rows.push(Row {
            field: "Bio",
            value: user.bio.clone(),
        });
    }
    if let Some(ref url) = user.avatar_url {
        rows.push(Row {
            field: "Avatar",
            value: url.clone(),
        });
    }
    if let Some(ref url) = user.cover_url {
        rows.push(Row {
            field: "Cover",
            value: url.clone(),
        });
    }
    rows
}

/// Show the profile of the logged-in account.
#[derive(Debug, Parser)]
pub(crate) struct Whoami;

#[async_trait]
impl super::Command for Whoami {
    fn access(&self) -> Access {
        Access::Protected
    }

    async fn execute(self, ctx: &Context) -> Result<()> {
        let user = bootstrap::sync_profile(&ctx.client)
            .await?
            .ok_or(error::Error::Unauthorized { detail: None })?;
        println!("{}", Table::new(rows(&user)).with(Style::rounded()));
        Ok(())
    }
}

async fn upload(ctx: &Context, kind: ProfileImage, file: PathBuf) -> Result<()> {
    let content = fs::read(&file)?;
    let file_name = file
        .file_name()
        .map_or_else(|| "upload".to_owned(), |name| name.to_string_lossy().into_owned());

    let user = UploadProfileImage {
        kind,
        file_name,
        content,
    }
    .execute(&ctx.client)
    .await?;
    let url = match kind {
        ProfileImage::Avatar => user.avatar_url.clone(),
        ProfileImage::Cover => user.cover_url.clone(),
    };
    ctx.client.store().set_user(Some(user)).await;

    if let Some(url) = url {
        println!("{url}");
    }
    Ok(())
}

/// Replace the profile picture.
#[derive(Debug, Parser)]
pub(crate) struct Avatar {
    #[arg(value_hint = clap::ValueHint::FilePath)]
    file: PathBuf,
}

#[async_trait]
impl super::Command for Avatar {
    fn access(&self) -> Access {
        Access::Protected
    }

    async fn execute(self, ctx: &Context) -> Result<()> {
        upload(ctx, ProfileImage::Avatar, self.file).await
    }
}

/// Replace the profile cover image.
#[derive(Debug, Parser)]
pub(crate) struct Cover {
    #[arg(value_hint = clap::ValueHint::FilePath)]
    file: PathBuf,
}

#[async_trait]
impl super::Command for Cover {
    fn access(&self) -> Access {
        Access::Protected
    }

    async fn execute(self, ctx: &Context) -> Result<()> {
        upload(ctx, ProfileImage::Cover, self.file).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_fields_are_only_listed_when_present() {
        let user = UserProfile {
            username: "ada".to_owned(),
            first_name: "Ada".to_owned(),
            avatar_url: Some("https://cdn.example.com/a.png".to_owned()),
            ..UserProfile::default()
        };
        let fields = rows(&user).into_iter().map(|row| row.field).collect::<Vec<_>>();
        assert_eq!(fields, ["Username", "Email", "Name", "Verified", "Avatar"]);
        assert_eq!(rows(&user)[2].value, "Ada");
    }
}
