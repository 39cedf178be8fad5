use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::controls::ActivationKind;
use super::{scrub, ContentError};

/// Groups notifications under a shared title in the host's listing.
/// Notifications with the same header `id` collapse into one section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
    pub activation: ActivationKind,
}

impl Header {
    /// The id defaults to a fresh unique token, which keeps unrelated
    /// headers from collapsing together by accident.
    pub fn new(title: impl Into<String>) -> Result<Self, ContentError> {
        let title = scrub(title);
        if title.trim().is_empty() {
            return Err(ContentError::MissingField {
                element: "Header",
                field: "title",
            });
        }
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            title,
            arguments: None,
            activation: ActivationKind::Protocol,
        })
    }

    /// Stable id shared across notifications that should stack together.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn arguments(mut self, arguments: impl Into<String>) -> Self {
        self.arguments = Some(scrub(arguments));
        self
    }

    pub fn activation(mut self, kind: ActivationKind) -> Self {
        self.activation = kind;
        self
    }
}
