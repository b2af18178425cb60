//! Content task type enumeration.

use super::ParseTaskTypeError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of content a task produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// One-off marketing email.
    SingleEmail,
    /// Multi-step email sequence.
    EmailSequence,
    /// Long-form blog post.
    BlogPost,
    /// Landing page.
    LandingPage,
    /// Social network post.
    SocialPost,
    /// Paid advertising campaign.
    AdCampaign,
}

impl TaskType {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SingleEmail => "single_email",
            Self::EmailSequence => "email_sequence",
            Self::BlogPost => "blog_post",
            Self::LandingPage => "landing_page",
            Self::SocialPost => "social_post",
            Self::AdCampaign => "ad_campaign",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskType {
    type Error = ParseTaskTypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "single_email" => Ok(Self::SingleEmail),
            "email_sequence" => Ok(Self::EmailSequence),
            "blog_post" => Ok(Self::BlogPost),
            "landing_page" => Ok(Self::LandingPage),
            "social_post" => Ok(Self::SocialPost),
            "ad_campaign" => Ok(Self::AdCampaign),
            _ => Err(ParseTaskTypeError(value.to_owned())),
        }
    }
}
