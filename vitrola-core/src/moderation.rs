//! Moderation decides whether customer-provided text may appear on the TVs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{ModerationConfig, Request};

/// The kind of text being checked, so that implementors can be stricter with some
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModerationCategory {
    RequesterName,
    TrackTitle,
    Dedication,
}

/// Represents a type that can judge text
#[async_trait]
pub trait Moderation: Send + Sync + 'static {
    /// Returns true if the text may be shown in the given category
    async fn is_allowed(&self, text: &str, category: ModerationCategory) -> bool;
}

/// The outcome of checking every configured field of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationVerdict {
    Allowed,
    Blocked(ModerationCategory),
}

impl ModerationVerdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, ModerationVerdict::Allowed)
    }
}

/// Runs every enabled category of the config against the request.
/// Stops at the first category that is blocked.
pub async fn moderate(
    moderation: &dyn Moderation,
    config: &ModerationConfig,
    request: &Request,
) -> ModerationVerdict {
    for category in config.categories() {
        let text = match category {
            ModerationCategory::RequesterName => request.requester.as_deref(),
            ModerationCategory::TrackTitle => Some(request.track.title.as_str()),
            ModerationCategory::Dedication => request.dedication.as_ref().map(|d| d.text.as_str()),
        };

        let Some(text) = text.filter(|t| !t.trim().is_empty()) else {
            continue;
        };

        if !moderation.is_allowed(text, category).await {
            return ModerationVerdict::Blocked(category);
        }
    }

    ModerationVerdict::Allowed
}
