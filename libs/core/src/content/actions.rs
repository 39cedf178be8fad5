use serde::{Deserialize, Serialize};

use super::controls::{ActionButton, ContextMenuItem, InputControl};
use super::ContentError;

/// Combined limit on buttons plus context menu items.
pub const MAX_COMBINED_CONTROLS: usize = 5;
/// Limit on input fields.
pub const MAX_INPUTS: usize = 5;

/// A validated set of custom controls. Obtainable only through
/// [`ActionSet::custom`], so the caps hold for every value in existence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomActions {
    buttons: Vec<ActionButton>,
    context_menu_items: Vec<ContextMenuItem>,
    inputs: Vec<InputControl>,
}

impl CustomActions {
    pub fn buttons(&self) -> &[ActionButton] {
        &self.buttons
    }

    pub fn context_menu_items(&self) -> &[ContextMenuItem] {
        &self.context_menu_items
    }

    pub fn inputs(&self) -> &[InputControl] {
        &self.inputs
    }
}

/// Interactive region of a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionSet {
    Custom(CustomActions),
    /// Host-rendered snooze and dismiss pair. Counts against no cap; the
    /// host draws its own controls.
    SnoozeDismiss,
}

impl ActionSet {
    /// Builds a custom action set, enforcing the host caps: buttons and
    /// context menu items share the [`MAX_COMBINED_CONTROLS`] slot count,
    /// inputs have their own [`MAX_INPUTS`]. A failed call leaves nothing
    /// behind.
    pub fn custom(
        buttons: Vec<ActionButton>,
        context_menu_items: Vec<ContextMenuItem>,
        inputs: Vec<InputControl>,
    ) -> Result<Self, ContentError> {
        let combined = buttons.len() + context_menu_items.len();
        if combined > MAX_COMBINED_CONTROLS {
            return Err(ContentError::TooManyControls {
                kind: "button and context menu",
                count: combined,
                limit: MAX_COMBINED_CONTROLS,
            });
        }
        if inputs.len() > MAX_INPUTS {
            return Err(ContentError::TooManyControls {
                kind: "input",
                count: inputs.len(),
                limit: MAX_INPUTS,
            });
        }
        Ok(ActionSet::Custom(CustomActions {
            buttons,
            context_menu_items,
            inputs,
        }))
    }

    pub fn buttons(buttons: Vec<ActionButton>) -> Result<Self, ContentError> {
        Self::custom(buttons, Vec::new(), Vec::new())
    }

    pub fn snooze_dismiss() -> Self {
        ActionSet::SnoozeDismiss
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Button, ContextMenuItem};

    fn button(n: usize) -> ActionButton {
        Button::new(format!("B{n}"), format!("arg{n}")).into()
    }

    #[test]
    fn combined_cap_counts_buttons_and_menu_items() {
        let buttons: Vec<_> = (0..3).map(button).collect();
        let menu = vec![
            ContextMenuItem::new("Settings", "settings"),
            ContextMenuItem::new("Mute", "mute"),
        ];
        assert!(ActionSet::custom(buttons.clone(), menu.clone(), vec![]).is_ok());

        let mut menu = menu;
        menu.push(ContextMenuItem::new("Extra", "extra"));
        let err = ActionSet::custom(buttons, menu, vec![]).unwrap_err();
        assert_eq!(
            err,
            ContentError::TooManyControls {
                kind: "button and context menu",
                count: 6,
                limit: MAX_COMBINED_CONTROLS,
            }
        );
    }

    #[test]
    fn input_cap_is_separate() {
        use crate::content::TextInput;
        let inputs: Vec<_> = (0..6)
            .map(|n| TextInput::new(format!("in{n}")).into())
            .collect();
        let err = ActionSet::custom(vec![], vec![], inputs).unwrap_err();
        assert!(matches!(err, ContentError::TooManyControls { kind: "input", count: 6, .. }));
    }

    #[test]
    fn five_buttons_exactly_is_fine() {
        let buttons: Vec<_> = (0..5).map(button).collect();
        assert!(ActionSet::buttons(buttons).is_ok());
    }
}
