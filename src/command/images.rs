// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::{Parser, ValueEnum};
use tabled::{
    settings::{object::Columns, Alignment, Modify, Style},
    Table,
};

use crate::{
    api::{
        images,
        model::{GenerateImagePayload, ImageRecord, Paginated},
        Endpoint as _,
    },
    error::Result,
};

use super::{page_summary, Access, Context};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
enum AspectRatio {
    #[default]
    #[value(name = "1:1")]
    Square,
    #[value(name = "16:9")]
    Wide,
    #[value(name = "4:3")]
    Classic,
    #[value(name = "9:16")]
    Portrait,
    #[value(name = "3:2")]
    Photo,
}

impl AspectRatio {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::Wide => "16:9",
            Self::Classic => "4:3",
            Self::Portrait => "9:16",
            Self::Photo => "3:2",
        }
    }
}

fn print_listing(page: u32, listing: &Paginated<ImageRecord>) {
    if listing.results.is_empty() {
        println!("No images found");
    } else {
        println!(
            "{}",
            Table::new(&listing.results)
                .with(Style::rounded())
                .with(Modify::new(Columns::single(0)).with(Alignment::right()))
        );
    }
    println!("{}", page_summary(page, listing));
}

fn print_record(record: &ImageRecord) {
    println!("{}", Table::new([record]).with(Style::rounded()));
    if let Some(ref negative_prompt) = record.negative_prompt {
        println!("Negative prompt: {negative_prompt}");
    }
    if let Some(seed) = record.seed {
        println!("Seed: {seed}");
    }
    if let Some(ref url) = record.image_url {
        println!("{url}");
    }
}

/// Generate a new image from a text prompt.
#[derive(Debug, Parser)]
pub(crate) struct Generate {
    /// What the image should show.
    #[arg(required = true, num_args = 1..)]
    prompt: Vec<String>,

    /// What the image should avoid.
    #[arg(long, short)]
    negative: Option<String>,

    #[arg(long, short, value_enum, default_value_t)]
    aspect_ratio: AspectRatio,

    /// A fixed seed for reproducible results.
    #[arg(long, short)]
    seed: Option<i64>,
}

#[async_trait]
impl super::Command for Generate {
    fn access(&self) -> Access {
        Access::Protected
    }

    async fn execute(self, ctx: &Context) -> Result<()> {
        let record = images::Generate(GenerateImagePayload {
            prompt: self.prompt.join(" "),
            negative_prompt: self.negative.filter(|n| !n.trim().is_empty()),
            aspect_ratio: Some(self.aspect_ratio.as_str().to_owned()),
            seed: self.seed,
        })
        .execute(&ctx.client)
        .await?;
        print_record(&record);
        Ok(())
    }
}

/// List the images you generated.
#[derive(Debug, Parser)]
pub(crate) struct Mine {
    #[arg(long, short, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    page: u32,
}

#[async_trait]
impl super::Command for Mine {
    fn access(&self) -> Access {
        Access::Protected
    }

    async fn execute(self, ctx: &Context) -> Result<()> {
        let listing = images::MyImages { page: self.page }
            .execute(&ctx.client)
            .await?;
        print_listing(self.page, &listing);
        Ok(())
    }
}

/// Browse images other people have shared.
#[derive(Debug, Parser)]
pub(crate) struct Gallery {
    /// Only show images matching this text.
    #[arg(long, short = 'q')]
    search: Option<String>,

    #[arg(long, short, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    page: u32,
}

#[async_trait]
impl super::Command for Gallery {
    fn access(&self) -> Access {
        Access::Open
    }

    async fn execute(self, ctx: &Context) -> Result<()> {
        let listing = images::PublicImages {
            search: self.search,
            page: self.page,
        }
        .execute(&ctx.client)
        .await?;
        print_listing(self.page, &listing);
        Ok(())
    }
}

/// Publish one of your images to the public gallery, or take it down.
#[derive(Debug, Parser)]
pub(crate) struct Share {
    id: u64,

    /// Make the image private again.
    #[arg(long)]
    private: bool,
}

#[async_trait]
impl super::Command for Share {
    fn access(&self) -> Access {
        Access::Protected
    }

    async fn execute(self, ctx: &Context) -> Result<()> {
        let record = if self.private {
            images::UpdateShare {
                id: self.id,
                is_public: false,
            }
            .execute(&ctx.client)
            .await?
        } else {
            images::Publish { id: self.id }.execute(&ctx.client).await?
        };
        println!(
            "Image {} is now {}",
            record.id,
            if record.is_public { "public" } else { "private" }
        );
        Ok(())
    }
}

/// Like an image, or take the like back.
#[derive(Debug, Parser)]
pub(crate) struct Like {
    id: u64,

    #[arg(long)]
    undo: bool,
}

#[async_trait]
impl super::Command for Like {
    fn access(&self) -> Access {
        Access::Protected
    }

    async fn execute(self, ctx: &Context) -> Result<()> {
        if self.undo {
            images::Unlike { id: self.id }.execute(&ctx.client).await?;
            println!("Image {} is no longer liked", self.id);
        } else {
            let record = images::Like { id: self.id }.execute(&ctx.client).await?;
            println!("Image {} now has {} likes", record.id, record.like_count);
        }
        Ok(())
    }
}

/// Get a download link for an image.
#[derive(Debug, Parser)]
pub(crate) struct Download {
    id: u64,
}

#[async_trait]
impl super::Command for Download {
    fn access(&self) -> Access {
        Access::Protected
    }

    async fn execute(self, ctx: &Context) -> Result<()> {
        let grant = images::RegisterDownload { id: self.id }
            .execute(&ctx.client)
            .await?;
        println!("{}", grant.download_url);
        Ok(())
    }
}
