//! Host wire format: a small element tree and its markup writer.
//!
//! The serializer in [`render`] lowers a [`crate::content::ToastContent`]
//! into a [`WireElement`] tree, runs the wrapper-strip and patch passes
//! over it, validates the result, and only then flattens it to markup.
//! Working on a tree rather than strings keeps the rewrite passes
//! structural; no pass ever regex-edits markup.

mod patch;
mod render;

pub use render::{render_payload, BindingMode, Payload};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::content::TEMPLATE_SENTINEL;

/// Serialization failures. Fatal to the submission attempt; the content
/// value itself remains valid and reusable.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SerializeError {
    #[error("unexpected root element `{0}`")]
    UnexpectedRoot(String),
    #[error("`{0}` is not a legal wire element name")]
    IllegalName(String),
    #[error("attribute `{attr}` on `{element}` has an empty value")]
    EmptyAttribute { element: String, attr: String },
    #[error("template escape sentinel leaked into the payload")]
    SentinelLeak,
}

/// One element of the wire document: a name, ordered attributes, optional
/// text content, and child elements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireElement {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub children: Vec<WireElement>,
}

impl WireElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            text: None,
            children: Vec::new(),
        }
    }

    /// Appends or replaces the attribute `name`.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if let Some(slot) = self.attrs.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.attrs.push((name, value));
        }
    }

    pub fn set_attr_opt(&mut self, name: &str, value: Option<impl Into<String>>) {
        if let Some(value) = value {
            self.set_attr(name, value);
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn push(&mut self, child: WireElement) {
        self.children.push(child);
    }

    pub fn first_child_named(&self, name: &str) -> Option<&WireElement> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn first_child_named_mut(&mut self, name: &str) -> Option<&mut WireElement> {
        self.children.iter_mut().find(|c| c.name == name)
    }

    /// Flattens the tree to compact markup with all text and attribute
    /// values escaped.
    pub fn to_markup(&self) -> String {
        let mut out = String::with_capacity(256);
        self.write(&mut out, None, 0);
        out
    }

    /// Indented markup for human consumption.
    pub fn to_markup_pretty(&self) -> String {
        let mut out = String::with_capacity(256);
        self.write(&mut out, Some(2), 0);
        out
    }

    fn write(&self, out: &mut String, indent: Option<usize>, depth: usize) {
        let pad = |out: &mut String, depth: usize| {
            if let Some(width) = indent {
                if !out.is_empty() {
                    out.push('\n');
                }
                out.push_str(&" ".repeat(width * depth));
            }
        };
        pad(out, depth);
        out.push('<');
        out.push_str(&self.name);
        for (name, value) in &self.attrs {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&escape_attr(value));
            out.push('"');
        }
        match (&self.text, self.children.is_empty()) {
            (None, true) => out.push_str("/>"),
            (text, _) => {
                out.push('>');
                if let Some(text) = text {
                    out.push_str(&escape_text(text));
                }
                for child in &self.children {
                    child.write(out, indent, depth + 1);
                }
                if !self.children.is_empty() {
                    pad(out, depth);
                }
                out.push_str("</");
                out.push_str(&self.name);
                out.push('>');
            }
        }
    }
}

pub fn escape_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
    out
}

pub fn escape_attr(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
    out
}

fn legal_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
        && name.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
}

/// Structural check run after the patch pass and before markup emission.
/// Rejects documents the host would refuse to parse.
pub fn validate_document(root: &WireElement) -> Result<(), SerializeError> {
    if root.name != "toast" {
        return Err(SerializeError::UnexpectedRoot(root.name.clone()));
    }
    validate_element(root)
}

fn validate_element(el: &WireElement) -> Result<(), SerializeError> {
    if !legal_name(&el.name) {
        return Err(SerializeError::IllegalName(el.name.clone()));
    }
    for (name, value) in &el.attrs {
        if !legal_name(name) {
            return Err(SerializeError::IllegalName(name.clone()));
        }
        if value.is_empty() {
            return Err(SerializeError::EmptyAttribute {
                element: el.name.clone(),
                attr: name.clone(),
            });
        }
        if value.contains(TEMPLATE_SENTINEL) {
            return Err(SerializeError::SentinelLeak);
        }
    }
    if el
        .text
        .as_deref()
        .is_some_and(|t| t.contains(TEMPLATE_SENTINEL))
    {
        return Err(SerializeError::SentinelLeak);
    }
    for child in &el.children {
        validate_element(child)?;
    }
    Ok(())
}
