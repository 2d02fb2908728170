// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;

use crate::{api::model::Paginated, client::Client, error::Result, password};

pub(crate) mod auth;
pub(crate) mod images;
pub(crate) mod profile;

/// Which sessions a command is available to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Access {
    Open,
    /// Requires a session; anyone else is sent to `login`.
    Protected,
    /// Only makes sense without a session, like logging in.
    PublicOnly,
}

pub(crate) struct Context {
    pub(crate) client: Client,
    pub(crate) prompt: Box<dyn password::Prompt>,
}

#[async_trait]
pub(crate) trait Command {
    fn access(&self) -> Access;

    async fn execute(self, ctx: &Context) -> Result<()>;
}

pub(crate) fn page_summary<T>(page: u32, listing: &Paginated<T>) -> String {
    let mut summary = format!("Page {} · {} images in total", page, listing.count);
    match (listing.previous.is_some(), listing.next.is_some()) {
        (true, true) => summary.push_str(&format!(
            " · --page {} or --page {}",
            page.saturating_sub(1),
            page.saturating_add(1)
        )),
        (false, true) => {
            summary.push_str(&format!(" · more with --page {}", page.saturating_add(1)));
        }
        (true, false) => {
            summary.push_str(&format!(" · back with --page {}", page.saturating_sub(1)));
        }
        (false, false) => {}
    }
    summary
}
