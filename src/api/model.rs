// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use secrecy::{ExposeSecret as _, SecretString};
use serde::{Deserialize, Serialize, Serializer};
use serde_with::skip_serializing_none;
use tabled::Tabled;

use crate::session::Token;

fn expose<S: Serializer>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct UserProfile {
    pub(crate) id: String,
    pub(crate) email: String,
    pub(crate) username: String,
    #[serde(default)]
    pub(crate) first_name: String,
    #[serde(default)]
    pub(crate) last_name: String,
    #[serde(default)]
    pub(crate) bio: String,
    #[serde(default)]
    pub(crate) is_verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) cover_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginPayload {
    pub(crate) email: String,
    #[serde(serialize_with = "expose")]
    pub(crate) password: SecretString,
}

#[skip_serializing_none]
#[derive(Debug, Serialize)]
pub(crate) struct RegisterPayload {
    pub(crate) email: String,
    pub(crate) username: String,
    #[serde(serialize_with = "expose")]
    pub(crate) password: SecretString,
    #[serde(serialize_with = "expose")]
    pub(crate) password2: SecretString,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) bio: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct PasswordResetRequestPayload {
    pub(crate) email: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct PasswordResetConfirmPayload {
    pub(crate) token: String,
    #[serde(serialize_with = "expose")]
    pub(crate) new_password: SecretString,
    #[serde(serialize_with = "expose")]
    pub(crate) new_password_confirm: SecretString,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AuthGrant {
    pub(crate) access: Token,
    pub(crate) refresh: Token,
    pub(crate) user: UserProfile,
}

/// Reply of the token refresh endpoint. Rotation of the refresh token is up
/// to the server.
#[derive(Debug, Deserialize)]
pub(crate) struct RefreshGrant {
    #[serde(default)]
    pub(crate) access: Option<Token>,
    #[serde(default)]
    pub(crate) refresh: Option<Token>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Detail {
    pub(crate) detail: String,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub(crate) enum ImageStatus {
    Generating,
    Ready,
    Failed,
}

impl fmt::Display for ImageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match *self {
            Self::Generating => "Generating",
            Self::Ready => "Ready",
            Self::Failed => "Failed",
        })
    }
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct UserSummary {
    pub(crate) username: String,
}

#[derive(Clone, Debug, Deserialize, Tabled)]
pub(crate) struct ImageRecord {
    #[tabled(rename = "ID")]
    pub(crate) id: u64,
    #[tabled(rename = "Author", display_with = "Self::format_user")]
    pub(crate) user: UserSummary,
    #[tabled(rename = "Prompt", display_with = "Self::format_prompt")]
    pub(crate) prompt: String,
    #[tabled(skip)]
    pub(crate) negative_prompt: Option<String>,
    #[tabled(rename = "Ratio")]
    pub(crate) aspect_ratio: String,
    #[tabled(skip)]
    pub(crate) seed: Option<i64>,
    #[tabled(skip)]
    pub(crate) image_url: Option<String>,
    #[tabled(rename = "Status")]
    pub(crate) status: ImageStatus,
    #[tabled(rename = "Public")]
    pub(crate) is_public: bool,
    #[tabled(rename = "Likes", display_with("Self::format_likes", self))]
    #[serde(default)]
    pub(crate) like_count: u64,
    #[tabled(rename = "Comments")]
    #[serde(default)]
    pub(crate) comment_count: u64,
    #[tabled(rename = "Downloads")]
    #[serde(default)]
    pub(crate) download_count: u64,
    #[tabled(skip)]
    #[serde(default)]
    pub(crate) is_liked: bool,
    #[tabled(rename = "Tags", display_with = "Self::format_tags")]
    #[serde(default)]
    pub(crate) tags: Vec<String>,
    #[tabled(rename = "Created")]
    pub(crate) created_at: String,
}

impl ImageRecord {
    const PROMPT_WIDTH: usize = 48;

    fn format_user(user: &UserSummary) -> String {
        user.username.clone()
    }

    fn format_prompt(prompt: &str) -> String {
        if prompt.chars().count() > Self::PROMPT_WIDTH {
            let mut shortened = prompt
                .chars()
                .take(Self::PROMPT_WIDTH - 1)
                .collect::<String>();
            shortened.push('…');
            shortened
        } else {
            prompt.to_owned()
        }
    }

    fn format_likes(&self) -> String {
        if self.is_liked {
            format!("{} ♥", self.like_count)
        } else {
            self.like_count.to_string()
        }
    }

    fn format_tags(tags: &[String]) -> String {
        tags.join(", ")
    }
}

#[skip_serializing_none]
#[derive(Debug, Default, Serialize)]
pub(crate) struct GenerateImagePayload {
    pub(crate) prompt: String,
    pub(crate) negative_prompt: Option<String>,
    pub(crate) aspect_ratio: Option<String>,
    pub(crate) seed: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ShareUpdate {
    pub(crate) is_public: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DownloadGrant {
    pub(crate) download_url: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Paginated<T> {
    pub(crate) count: u64,
    pub(crate) next: Option<String>,
    pub(crate) previous: Option<String>,
    pub(crate) results: Vec<T>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use serde_test::{assert_tokens, Token as SerdeToken};

    use crate::error::Result;

    use super::*;

    #[test]
    fn image_status_uses_server_spelling() {
        assert_tokens(
            &ImageStatus::Generating,
            &[SerdeToken::UnitVariant {
                name: "ImageStatus",
                variant: "GENERATING",
            }],
        );
    }

    #[test]
    fn image_record_tolerates_missing_counters() -> Result<()> {
        let record: ImageRecord = serde_json::from_value(json!({
            "id": 7,
            "user": {"id": "u1", "username": "ada"},
            "featured": false,
            "prompt": "a lighthouse at dusk",
            "aspect_ratio": "16:9",
            "status": "READY",
            "is_public": true,
            "created_at": "2024-05-01T12:00:00Z",
        }))?;
        assert_eq!(record.status, ImageStatus::Ready);
        assert_eq!(record.like_count, 0);
        assert!(record.tags.is_empty());
        Ok(())
    }

    #[test]
    fn long_prompts_are_shortened_for_display() {
        let prompt = "x".repeat(100);
        let shown = ImageRecord::format_prompt(&prompt);
        assert_eq!(shown.chars().count(), ImageRecord::PROMPT_WIDTH);
        assert!(shown.ends_with('…'));
        assert_eq!(ImageRecord::format_prompt("short"), "short");
    }

    #[test]
    fn passwords_serialize_in_payloads() -> Result<()> {
        let payload = LoginPayload {
            email: "ada@example.com".to_owned(),
            password: SecretString::new("hunter2".to_owned()),
        };
        assert_eq!(
            serde_json::to_value(&payload)?,
            json!({"email": "ada@example.com", "password": "hunter2"}),
        );
        Ok(())
    }

    #[test]
    fn unset_generation_options_are_omitted() -> Result<()> {
        let payload = GenerateImagePayload {
            prompt: "a fox".to_owned(),
            seed: Some(42),
            ..GenerateImagePayload::default()
        };
        assert_eq!(
            serde_json::to_value(&payload)?,
            json!({"prompt": "a fox", "seed": 42}),
        );
        Ok(())
    }

    #[test]
    fn refresh_grant_without_rotation() -> Result<()> {
        let grant: RefreshGrant = serde_json::from_value(json!({"access": "A2"}))?;
        assert_eq!(grant.access.as_ref().map(Token::expose), Some("A2"));
        assert!(grant.refresh.is_none());
        Ok(())
    }
}
