// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use crate::{error::Result, transport::Request};

use super::{
    model::{DownloadGrant, GenerateImagePayload, ImageRecord, Paginated, ShareUpdate},
    Endpoint,
};

/// Generation runs synchronously on the server and outlasts the default
/// request timeout.
const GENERATION_TIMEOUT: Duration = Duration::from_secs(120);

pub(crate) struct MyImages {
    pub(crate) page: u32,
}

impl Endpoint for MyImages {
    type Response = Paginated<ImageRecord>;

    fn request(&self) -> Result<Request> {
        Ok(Request::get("/images/my-images/").with_query("page", self.page))
    }
}

pub(crate) struct PublicImages {
    pub(crate) search: Option<String>,
    pub(crate) page: u32,
}

impl Endpoint for PublicImages {
    type Response = Paginated<ImageRecord>;

    fn request(&self) -> Result<Request> {
        let req = Request::get("/images/public/").with_query("page", self.page);
        Ok(match self.search.as_deref() {
            Some(search) if !search.is_empty() => req.with_query("search", search),
            _ => req,
        })
    }
}

pub(crate) struct Generate(pub(crate) GenerateImagePayload);

impl Endpoint for Generate {
    type Response = ImageRecord;

    fn request(&self) -> Result<Request> {
        Ok(Request::post("/generate/")
            .with_json(&self.0)?
            .with_timeout(GENERATION_TIMEOUT))
    }
}

pub(crate) struct Publish {
    pub(crate) id: u64,
}

impl Endpoint for Publish {
    type Response = ImageRecord;

    fn request(&self) -> Result<Request> {
        Ok(Request::post(format!("/images/{}/share/", self.id)))
    }
}

pub(crate) struct UpdateShare {
    pub(crate) id: u64,
    pub(crate) is_public: bool,
}

impl Endpoint for UpdateShare {
    type Response = ImageRecord;

    fn request(&self) -> Result<Request> {
        Request::patch(format!("/images/{}/share/", self.id)).with_json(&ShareUpdate {
            is_public: self.is_public,
        })
    }
}

pub(crate) struct Like {
    pub(crate) id: u64,
}

/// Answers with the image, its like count already updated.
impl Endpoint for Like {
    type Response = ImageRecord;

    fn request(&self) -> Result<Request> {
        Ok(Request::post(format!("/images/{}/like/", self.id)))
    }
}

pub(crate) struct Unlike {
    pub(crate) id: u64,
}

impl Endpoint for Unlike {
    type Response = ();

    fn request(&self) -> Result<Request> {
        Ok(Request::delete(format!("/images/{}/like/", self.id)))
    }
}

pub(crate) struct RegisterDownload {
    pub(crate) id: u64,
}

impl Endpoint for RegisterDownload {
    type Response = DownloadGrant;

    fn request(&self) -> Result<Request> {
        Ok(Request::post(format!("/images/{}/download/", self.id)))
    }
}

#[cfg(test)]
mod tests {
    use reqwest::{Method, StatusCode};
    use serde_json::json;

    use crate::transport::Response;

    use super::*;

    #[test]
    fn empty_search_is_not_sent() -> Result<()> {
        let req = PublicImages {
            search: Some(String::new()),
            page: 2,
        }
        .request()?;
        assert_eq!(req.query(), &[("page".to_owned(), "2".to_owned())]);
        Ok(())
    }

    #[test]
    fn search_is_sent_with_the_page() -> Result<()> {
        let req = PublicImages {
            search: Some("lighthouse".to_owned()),
            page: 1,
        }
        .request()?;
        assert_eq!(
            req.query(),
            &[
                ("page".to_owned(), "1".to_owned()),
                ("search".to_owned(), "lighthouse".to_owned()),
            ]
        );
        Ok(())
    }

    #[test]
    fn like_reply_carries_the_updated_image() -> Result<()> {
        let body = serde_json::to_vec(&json!({
            "id": 9,
            "user": {"id": "u1", "username": "ada"},
            "prompt": "a lighthouse at dusk",
            "aspect_ratio": "16:9",
            "status": "READY",
            "is_public": true,
            "like_count": 3,
            "is_liked": true,
            "created_at": "2024-05-01T12:00:00Z",
        }))?;
        let record: <Like as Endpoint>::Response =
            Response::new(StatusCode::CREATED, body).json()?;
        assert_eq!(record.id, 9);
        assert_eq!(record.like_count, 3);
        assert!(record.is_liked);
        Ok(())
    }

    #[test]
    fn unlike_deletes_the_like() -> Result<()> {
        let req = Unlike { id: 9 }.request()?;
        assert_eq!(req.method(), &Method::DELETE);
        assert_eq!(req.path(), "/images/9/like/");
        Ok(())
    }

    #[test]
    fn generation_gets_a_longer_timeout() -> Result<()> {
        let req = Generate(GenerateImagePayload {
            prompt: "a fox".to_owned(),
            ..GenerateImagePayload::default()
        })
        .request()?;
        assert_eq!(req.timeout(), Some(GENERATION_TIMEOUT));
        Ok(())
    }
}
