use serde::{Deserialize, Serialize};

use super::scrub;

/// Horizontal alignment hint for a text element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAlign {
    Auto,
    Left,
    Center,
    Right,
}

impl TextAlign {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextAlign::Auto => "auto",
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
        }
    }
}

/// Typographic style hint. Hosts that do not support styled text ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextStyle {
    Caption,
    CaptionSubtle,
    Body,
    BodySubtle,
    Base,
    BaseSubtle,
    Subtitle,
    SubtitleSubtle,
    Title,
    TitleSubtle,
    Subheader,
    SubheaderSubtle,
    Header,
    HeaderSubtle,
}

impl TextStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextStyle::Caption => "caption",
            TextStyle::CaptionSubtle => "captionSubtle",
            TextStyle::Body => "body",
            TextStyle::BodySubtle => "bodySubtle",
            TextStyle::Base => "base",
            TextStyle::BaseSubtle => "baseSubtle",
            TextStyle::Subtitle => "subtitle",
            TextStyle::SubtitleSubtle => "subtitleSubtle",
            TextStyle::Title => "title",
            TextStyle::TitleSubtle => "titleSubtle",
            TextStyle::Subheader => "subheader",
            TextStyle::SubheaderSubtle => "subheaderSubtle",
            TextStyle::Header => "header",
            TextStyle::HeaderSubtle => "headerSubtle",
        }
    }
}

/// A line (or block) of text in the visual region.
///
/// The body may be a binding template: a value wrapped entirely in curly
/// braces (`"{status}"`) names a binding key instead of literal text.
/// See [`crate::wire::BindingMode`] for how the two are rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Text {
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_lines: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_lines: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wrap: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align: Option<TextAlign>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<TextStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

impl Text {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: scrub(body),
            max_lines: None,
            min_lines: None,
            wrap: None,
            align: None,
            style: None,
            lang: None,
        }
    }

    pub fn max_lines(mut self, lines: u32) -> Self {
        self.max_lines = Some(lines);
        self
    }

    pub fn min_lines(mut self, lines: u32) -> Self {
        self.min_lines = Some(lines);
        self
    }

    pub fn wrap(mut self, wrap: bool) -> Self {
        self.wrap = Some(wrap);
        self
    }

    pub fn align(mut self, align: TextAlign) -> Self {
        self.align = Some(align);
        self
    }

    pub fn style(mut self, style: TextStyle) -> Self {
        self.style = Some(style);
        self
    }

    pub fn lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }
}

impl From<&str> for Text {
    fn from(body: &str) -> Self {
        Text::new(body)
    }
}

impl From<String> for Text {
    fn from(body: String) -> Self {
        Text::new(body)
    }
}
