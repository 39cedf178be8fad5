use serde::{Deserialize, Serialize};

use super::{scrub, ContentError};

/// Where an image is placed. The role is fixed at construction and decides
/// which visual slot the builder routes the image into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageRole {
    /// Rendered in the body, in document order with the text lines.
    Inline,
    /// Replaces the application logo in the corner of the notification.
    Logo,
    /// Full-width banner across the top.
    Hero,
}

/// Crop applied by the host before display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageCrop {
    None,
    Circle,
}

impl ImageCrop {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageCrop::None => "none",
            ImageCrop::Circle => "circle",
        }
    }
}

/// An image element. `source` may be a local path, a UNC path, or an
/// http(s) URL; remote sources are resolved to cached local files during
/// [`super::ToastBuilder::build`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub source: String,
    pub role: ImageRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop: Option<ImageCrop>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

impl Image {
    pub fn new(source: impl Into<String>, role: ImageRole) -> Self {
        Self {
            source: scrub(source),
            role,
            crop: None,
            alt: None,
        }
    }

    pub fn inline(source: impl Into<String>) -> Self {
        Self::new(source, ImageRole::Inline)
    }

    pub fn logo(source: impl Into<String>) -> Self {
        Self::new(source, ImageRole::Logo)
    }

    pub fn hero(source: impl Into<String>) -> Self {
        Self::new(source, ImageRole::Hero)
    }

    /// Sets the crop hint. Hero images cannot be cropped; asking for a
    /// crop on one fails without altering the image.
    pub fn crop(mut self, crop: ImageCrop) -> Result<Self, ContentError> {
        if self.role == ImageRole::Hero {
            return Err(ContentError::InvalidElement {
                element: "Image",
                reason: "hero images do not accept a crop".into(),
            });
        }
        self.crop = Some(crop);
        Ok(self)
    }

    pub fn alt(mut self, alt: impl Into<String>) -> Self {
        self.alt = Some(alt.into());
        self
    }
}
