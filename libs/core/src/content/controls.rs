use serde::{Deserialize, Serialize};

use super::{scrub, ContentError};

/// What happens on the host side when a control is invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationKind {
    /// Bring the owning application to the foreground.
    Foreground,
    /// Deliver the arguments to a background task.
    Background,
    /// Treat the arguments as a URI and launch its protocol handler.
    Protocol,
}

impl ActivationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivationKind::Foreground => "foreground",
            ActivationKind::Background => "background",
            ActivationKind::Protocol => "protocol",
        }
    }
}

/// Accent color for a button. Stored as a lowercase marker on the wire
/// element and rewritten to the host's style vocabulary by the patch pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonColor {
    Green,
    Red,
}

impl ButtonColor {
    /// Pre-patch marker value.
    pub fn marker(&self) -> &'static str {
        match self {
            ButtonColor::Green => "green",
            ButtonColor::Red => "red",
        }
    }

    /// Host style name the marker is rewritten to.
    pub fn style(&self) -> &'static str {
        match self {
            ButtonColor::Green => "Success",
            ButtonColor::Red => "Critical",
        }
    }
}

/// A clickable button with caller-defined arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub label: String,
    pub arguments: String,
    pub activation: ActivationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Id of the input this button is docked next to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<ButtonColor>,
}

impl Button {
    pub fn new(label: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            label: scrub(label),
            arguments: scrub(arguments),
            activation: ActivationKind::Foreground,
            icon: None,
            input_id: None,
            color: None,
        }
    }

    pub fn activation(mut self, kind: ActivationKind) -> Self {
        self.activation = kind;
        self
    }

    pub fn icon(mut self, source: impl Into<String>) -> Self {
        self.icon = Some(scrub(source));
        self
    }

    pub fn input_id(mut self, id: impl Into<String>) -> Self {
        self.input_id = Some(id.into());
        self
    }

    pub fn color(mut self, color: ButtonColor) -> Self {
        self.color = Some(color);
        self
    }
}

/// System-handled snooze button. With no label the host supplies its own
/// localized caption; `selection_input` names a [`SelectionInput`] whose
/// chosen item sets the snooze interval.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnoozeButton {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selection_input: Option<String>,
}

impl SnoozeButton {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(scrub(label));
        self
    }

    pub fn selection_input(mut self, id: impl Into<String>) -> Self {
        self.selection_input = Some(id.into());
        self
    }
}

/// System-handled dismiss button.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DismissButton {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl DismissButton {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(scrub(label));
        self
    }
}

/// One button slot in a custom action set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionButton {
    Custom(Button),
    Snooze(SnoozeButton),
    Dismiss(DismissButton),
}

impl From<Button> for ActionButton {
    fn from(b: Button) -> Self {
        ActionButton::Custom(b)
    }
}

impl From<SnoozeButton> for ActionButton {
    fn from(b: SnoozeButton) -> Self {
        ActionButton::Snooze(b)
    }
}

impl From<DismissButton> for ActionButton {
    fn from(b: DismissButton) -> Self {
        ActionButton::Dismiss(b)
    }
}

/// An entry in the right-click context menu of the notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextMenuItem {
    pub label: String,
    pub arguments: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activation: Option<ActivationKind>,
}

impl ContextMenuItem {
    pub fn new(label: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            label: scrub(label),
            arguments: scrub(arguments),
            activation: None,
        }
    }

    pub fn activation(mut self, kind: ActivationKind) -> Self {
        self.activation = Some(kind);
        self
    }
}

/// Free-form text entry field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextInput {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl TextInput {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            placeholder: None,
            default: None,
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(scrub(title));
        self
    }

    pub fn placeholder(mut self, hint: impl Into<String>) -> Self {
        self.placeholder = Some(scrub(hint));
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default = Some(scrub(value));
        self
    }
}

/// One choice in a [`SelectionInput`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionItem {
    pub id: String,
    pub label: String,
}

impl SelectionItem {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: scrub(label),
        }
    }
}

/// Drop-down selection field. Must carry at least one item, and any
/// default must name one of its items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionInput {
    pub id: String,
    pub items: Vec<SelectionItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_item: Option<String>,
}

impl SelectionInput {
    pub fn new(
        id: impl Into<String>,
        items: Vec<SelectionItem>,
    ) -> Result<Self, ContentError> {
        if items.is_empty() {
            return Err(ContentError::MissingField {
                element: "SelectionInput",
                field: "items",
            });
        }
        Ok(Self {
            id: id.into(),
            items,
            title: None,
            default_item: None,
        })
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(scrub(title));
        self
    }

    pub fn default_item(mut self, item_id: impl Into<String>) -> Result<Self, ContentError> {
        let item_id = item_id.into();
        if !self.items.iter().any(|i| i.id == item_id) {
            return Err(ContentError::InvalidElement {
                element: "SelectionInput",
                reason: format!("default item `{item_id}` is not one of the items"),
            });
        }
        self.default_item = Some(item_id);
        Ok(self)
    }
}

/// An input slot in a custom action set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputControl {
    Text(TextInput),
    Selection(SelectionInput),
}

impl InputControl {
    pub fn id(&self) -> &str {
        match self {
            InputControl::Text(t) => &t.id,
            InputControl::Selection(s) => &s.id,
        }
    }
}

impl From<TextInput> for InputControl {
    fn from(i: TextInput) -> Self {
        InputControl::Text(i)
    }
}

impl From<SelectionInput> for InputControl {
    fn from(i: SelectionInput) -> Self {
        InputControl::Selection(i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn button_defaults_to_foreground() {
        let b = Button::new("Open", "open?id=1");
        assert_eq!(b.activation, ActivationKind::Foreground);
        assert!(b.color.is_none());
    }

    #[test]
    fn selection_requires_items() {
        let err = SelectionInput::new("when", vec![]).unwrap_err();
        assert!(matches!(err, ContentError::MissingField { element: "SelectionInput", .. }));
    }

    #[test]
    fn selection_default_must_exist() {
        let input = SelectionInput::new(
            "when",
            vec![SelectionItem::new("5", "5 minutes"), SelectionItem::new("60", "1 hour")],
        )
        .unwrap();
        assert!(input.clone().default_item("5").is_ok());
        assert!(input.default_item("15").is_err());
    }

    #[test]
    fn color_marker_and_style() {
        assert_eq!(ButtonColor::Green.marker(), "green");
        assert_eq!(ButtonColor::Green.style(), "Success");
        assert_eq!(ButtonColor::Red.style(), "Critical");
    }
}
