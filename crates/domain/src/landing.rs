//! Storefront landing page content.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const DEFAULT_TITLE: &str = "Welcome to Fifth Beryl";
const DEFAULT_SUBTITLE: &str =
    "Elevate your style with our premium collection of handcrafted shirts.";

/// Hero section shown on the home page. There is exactly one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandingPage {
    /// Image or video URL.
    pub hero_media: Option<String>,
    /// `"image"` or `"video"`.
    pub hero_media_type: String,
    pub hero_title: String,
    pub hero_subtitle: String,
    pub updated_at: DateTime<Utc>,
}

impl LandingPage {
    /// Content served before an admin has saved anything.
    pub fn default_at(now: DateTime<Utc>) -> Self {
        Self {
            hero_media: None,
            hero_media_type: "image".to_string(),
            hero_title: DEFAULT_TITLE.to_string(),
            hero_subtitle: DEFAULT_SUBTITLE.to_string(),
            updated_at: now,
        }
    }

    /// Overwrites the fields present in `update` and stamps `updated_at`.
    pub fn apply(&mut self, update: LandingPageUpdate, now: DateTime<Utc>) {
        if let Some(media) = update.hero_media {
            self.hero_media = Some(media);
        }
        if let Some(media_type) = update.hero_media_type {
            self.hero_media_type = media_type;
        }
        if let Some(title) = update.hero_title {
            self.hero_title = title;
        }
        if let Some(subtitle) = update.hero_subtitle {
            self.hero_subtitle = subtitle;
        }
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LandingPageUpdate {
    pub hero_media: Option<String>,
    pub hero_media_type: Option<String>,
    pub hero_title: Option<String>,
    pub hero_subtitle: Option<String>,
}
