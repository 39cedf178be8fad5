//! Element model for notification content.
//!
//! A [`ToastContent`] is an immutable tree assembled by [`ToastBuilder`]:
//! a visual region (text, images, progress bars, grouped columns), an
//! optional action set, audio, and a header, plus root-level presentation
//! attributes. Construction is the validation boundary; once a value
//! exists, its invariants hold.

mod actions;
mod audio;
mod builder;
mod controls;
mod header;
mod image;
mod progress;
mod text;
mod visual;

pub use actions::{ActionSet, CustomActions};
pub use audio::{Audio, Sound, SoundSource};
pub use builder::ToastBuilder;
pub use controls::{
    ActionButton, ActivationKind, Button, ButtonColor, ContextMenuItem, DismissButton,
    InputControl, SelectionInput, SelectionItem, SnoozeButton, TextInput,
};
pub use header::Header;
pub use image::{Image, ImageCrop, ImageRole};
pub use progress::{ProgressBar, ProgressValue};
pub use text::{Text, TextAlign, TextStyle};
pub use visual::{BodyElement, Group, Subgroup, SubgroupChild, Visual};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;

/// Reserved control character used internally to escape binding-wrapper
/// braces while a payload is being assembled. Constructors strip it from
/// every caller-supplied string, so it can never collide with user text.
pub const TEMPLATE_SENTINEL: char = '\u{0001}';

pub(crate) fn scrub(input: impl Into<String>) -> String {
    let input = input.into();
    if input.contains(TEMPLATE_SENTINEL) {
        input.chars().filter(|c| *c != TEMPLATE_SENTINEL).collect()
    } else {
        input
    }
}

/// Errors raised while constructing elements or composing content.
///
/// Fatal to the construction call only; previously built values are
/// unaffected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContentError {
    #[error("{element} requires a non-empty `{field}`")]
    MissingField {
        element: &'static str,
        field: &'static str,
    },
    #[error("{element}: {reason}")]
    InvalidElement {
        element: &'static str,
        reason: String,
    },
    #[error("action set holds {count} {kind} controls; the limit is {limit}")]
    TooManyControls {
        kind: &'static str,
        count: usize,
        limit: usize,
    },
}

/// Presentation scenario for the whole notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    Reminder,
    Alarm,
    IncomingCall,
}

impl Scenario {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scenario::Reminder => "reminder",
            Scenario::Alarm => "alarm",
            Scenario::IncomingCall => "incomingCall",
        }
    }
}

/// How long the notification stays on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastDuration {
    Short,
    Long,
}

impl ToastDuration {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToastDuration::Short => "short",
            ToastDuration::Long => "long",
        }
    }
}

/// Person association for the notification, rendered as a scheme-prefixed
/// hint on the root element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum People {
    RemoteId(String),
    Email(String),
    Phone(String),
}

impl People {
    /// Wire value with the scheme prefix the host expects.
    pub fn value(&self) -> String {
        match self {
            People::RemoteId(id) => format!("remoteid:{id}"),
            People::Email(addr) => format!("mailto:{addr}"),
            People::Phone(number) => format!("tel:{number}"),
        }
    }
}

/// A fully assembled notification, ready for serialization and delivery.
///
/// Produced by [`ToastBuilder::build`]; the fields are public for
/// inspection but the builder is the supported way to obtain one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToastContent {
    pub visual: Visual,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actions: Option<ActionSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<Audio>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<Header>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario: Option<Scenario>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<ToastDuration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub launch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activation: Option<ActivationKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub people: Option<People>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<OffsetDateTime>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scrub_removes_sentinel() {
        assert_eq!(scrub("a\u{0001}b\u{0001}"), "ab");
        assert_eq!(scrub("plain"), "plain");
    }

    #[test]
    fn people_values_carry_scheme() {
        assert_eq!(People::RemoteId("abc".into()).value(), "remoteid:abc");
        assert_eq!(People::Email("a@b.c".into()).value(), "mailto:a@b.c");
        assert_eq!(People::Phone("+15551234".into()).value(), "tel:+15551234");
    }

    #[test]
    fn scenario_wire_names() {
        assert_eq!(Scenario::IncomingCall.as_str(), "incomingCall");
        assert_eq!(Scenario::Alarm.as_str(), "alarm");
    }
}
