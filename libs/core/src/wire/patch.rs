//! Post-serialization structural patches.
//!
//! Each patch rewrites the element tree directly; none of them touch the
//! flattened markup. They run after the wrapper-strip pass so a stripped
//! document and a template document receive identical patches.

use tracing::warn;

use crate::content::{Scenario, ToastContent};

use super::render::binding_mut;
use super::WireElement;

pub(super) fn apply(root: &mut WireElement, content: &ToastContent, urgent: bool) {
    if urgent {
        apply_urgency(root);
    }
    if content.scenario == Some(Scenario::IncomingCall) {
        center_binding_texts(root);
    }
    apply_button_styles(root);
}

/// Flags the notification as high urgency. The host vocabulary has no
/// urgency element, only a root attribute, so an unexpected root means
/// the flag cannot land; the submission still proceeds.
fn apply_urgency(root: &mut WireElement) {
    if root.name != "toast" {
        warn!(root = %root.name, "cannot mark urgency on this document, leaving it unset");
        return;
    }
    root.set_attr("urgency", "high");
}

/// Incoming-call layout centers every text line of the binding,
/// attribution included.
fn center_binding_texts(root: &mut WireElement) {
    let Some(binding) = binding_mut(root) else {
        return;
    };
    for child in binding.children.iter_mut().filter(|c| c.name == "text") {
        child.set_attr("hint-align", "center");
    }
}

/// Rewrites the stored color markers on buttons to the host's style
/// names and switches styled buttons on at the root when any matched.
fn apply_button_styles(root: &mut WireElement) {
    let mut styled = false;
    if let Some(actions) = root.first_child_named_mut("actions") {
        for action in actions.children.iter_mut().filter(|c| c.name == "action") {
            let rewritten = match action.attr("hint-buttonStyle") {
                Some("green") => Some("Success"),
                Some("red") => Some("Critical"),
                _ => None,
            };
            if let Some(style) = rewritten {
                action.set_attr("hint-buttonStyle", style);
                styled = true;
            }
        }
    }
    if styled {
        root.set_attr("useButtonStyle", "true");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toast_with_binding(texts: &[&str]) -> WireElement {
        let mut root = WireElement::new("toast");
        let mut visual = WireElement::new("visual");
        let mut binding = WireElement::new("binding");
        for body in texts {
            let mut text = WireElement::new("text");
            text.text = Some((*body).to_string());
            binding.push(text);
        }
        visual.push(binding);
        root.push(visual);
        root
    }

    #[test]
    fn urgency_lands_on_toast_root() {
        let mut root = toast_with_binding(&["hi"]);
        apply_urgency(&mut root);
        assert_eq!(root.attr("urgency"), Some("high"));
    }

    #[test]
    fn urgency_tolerates_unexpected_root() {
        let mut root = WireElement::new("card");
        apply_urgency(&mut root);
        assert_eq!(root.attr("urgency"), None);
    }

    #[test]
    fn incoming_call_centers_all_texts() {
        let mut root = toast_with_binding(&["line one", "line two"]);
        center_binding_texts(&mut root);
        let binding = root
            .first_child_named("visual")
            .and_then(|v| v.first_child_named("binding"))
            .unwrap();
        for text in &binding.children {
            assert_eq!(text.attr("hint-align"), Some("center"));
        }
    }

    #[test]
    fn button_markers_rewritten_and_root_flagged() {
        let mut root = toast_with_binding(&["hi"]);
        let mut actions = WireElement::new("actions");
        let mut ok = WireElement::new("action");
        ok.set_attr("content", "Accept");
        ok.set_attr("hint-buttonStyle", "green");
        let mut no = WireElement::new("action");
        no.set_attr("content", "Decline");
        no.set_attr("hint-buttonStyle", "red");
        let mut plain = WireElement::new("action");
        plain.set_attr("content", "Later");
        actions.push(ok);
        actions.push(no);
        actions.push(plain);
        root.push(actions);

        apply_button_styles(&mut root);
        let actions = root.first_child_named("actions").unwrap();
        assert_eq!(actions.children[0].attr("hint-buttonStyle"), Some("Success"));
        assert_eq!(actions.children[1].attr("hint-buttonStyle"), Some("Critical"));
        assert_eq!(actions.children[2].attr("hint-buttonStyle"), None);
        assert_eq!(root.attr("useButtonStyle"), Some("true"));
    }

    #[test]
    fn unstyled_buttons_leave_root_untouched() {
        let mut root = toast_with_binding(&["hi"]);
        let mut actions = WireElement::new("actions");
        let mut plain = WireElement::new("action");
        plain.set_attr("content", "Open");
        actions.push(plain);
        root.push(actions);

        apply_button_styles(&mut root);
        assert_eq!(root.attr("useButtonStyle"), None);
    }
}
