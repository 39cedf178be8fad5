use time::format_description::well_known::Rfc3339;

use crate::content::{
    ActionButton, ActionSet, Audio, BodyElement, Group, Header, Image, ImageRole, InputControl,
    ProgressBar, Subgroup, SubgroupChild, Text, ToastContent, Visual,
};

use super::patch;
use super::{validate_document, SerializeError, WireElement};

/// How binding-template wrappers in the content are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingMode {
    /// Wrapper braces are stripped; template values become literal text.
    Literal,
    /// Wrappers are kept so the host substitutes bound data at display
    /// time and on subsequent updates.
    Template,
}

/// A serialized notification: the final element tree, its markup, and
/// the binding keys discovered in the content.
#[derive(Debug, Clone)]
pub struct Payload {
    pub root: WireElement,
    pub markup: String,
    pub binding_keys: Vec<String>,
}

/// Lowers content to a wire payload.
///
/// The passes run in a fixed order: emit the tree, discover binding keys,
/// strip wrappers when rendering literally, apply the structural patches,
/// validate, and only then flatten to markup.
pub fn render_payload(
    content: &ToastContent,
    mode: BindingMode,
    urgent: bool,
) -> Result<Payload, SerializeError> {
    let mut root = emit_toast(content);
    let binding_keys = collect_binding_keys(&root);
    if mode == BindingMode::Literal {
        if let Some(binding) = binding_mut(&mut root) {
            strip_wrappers(binding);
        }
    }
    patch::apply(&mut root, content, urgent);
    validate_document(&root)?;
    let markup = root.to_markup();
    Ok(Payload {
        root,
        markup,
        binding_keys,
    })
}

pub(super) fn binding_mut(root: &mut WireElement) -> Option<&mut WireElement> {
    root.first_child_named_mut("visual")?
        .first_child_named_mut("binding")
}

fn binding_of(root: &WireElement) -> Option<&WireElement> {
    root.first_child_named("visual")?.first_child_named("binding")
}

/// A whole-wrapped template value: `{key}` with a brace-free, non-empty
/// key. Partial wraps and embedded braces are literal text.
fn binding_key(value: &str) -> Option<&str> {
    let inner = value.strip_prefix('{')?.strip_suffix('}')?;
    if inner.is_empty() || inner.contains(['{', '}']) {
        return None;
    }
    Some(inner)
}

/// Binding keys in document order, first occurrence kept.
fn collect_binding_keys(root: &WireElement) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(binding) = binding_of(root) {
        walk_keys(binding, &mut keys);
    }
    keys
}

fn walk_keys(el: &WireElement, keys: &mut Vec<String>) {
    for (_, value) in &el.attrs {
        if let Some(key) = binding_key(value) {
            if !keys.iter().any(|k| k == key) {
                keys.push(key.to_string());
            }
        }
    }
    if let Some(text) = &el.text {
        if let Some(key) = binding_key(text) {
            if !keys.iter().any(|k| k == key) {
                keys.push(key.to_string());
            }
        }
    }
    for child in &el.children {
        walk_keys(child, keys);
    }
}

/// Removes one leading `{` and one trailing `}` from every text body and
/// attribute value in the subtree. The two ends are independent, so an
/// unbalanced wrap still loses its half.
fn strip_wrappers(el: &mut WireElement) {
    for (_, value) in &mut el.attrs {
        strip_wrap(value);
    }
    if let Some(text) = &mut el.text {
        strip_wrap(text);
    }
    for child in &mut el.children {
        strip_wrappers(child);
    }
}

fn strip_wrap(value: &mut String) {
    if value.ends_with('}') {
        value.pop();
    }
    if value.starts_with('{') {
        value.remove(0);
    }
}

fn emit_toast(content: &ToastContent) -> WireElement {
    let mut root = WireElement::new("toast");
    root.set_attr_opt("scenario", content.scenario.map(|s| s.as_str()));
    root.set_attr_opt("duration", content.duration.map(|d| d.as_str()));
    set_nonempty(&mut root, "launch", content.launch.as_deref());
    root.set_attr_opt(
        "activationType",
        content.activation.map(|a| a.as_str()),
    );
    if let Some(ts) = &content.timestamp {
        if let Ok(stamp) = ts.format(&Rfc3339) {
            root.set_attr("displayTimestamp", stamp);
        }
    }
    if let Some(people) = &content.people {
        root.set_attr("hint-people", people.value());
    }

    root.push(emit_visual(&content.visual));
    if let Some(actions) = &content.actions {
        root.push(emit_actions(actions));
    }
    if let Some(audio) = &content.audio {
        root.push(emit_audio(audio));
    }
    if let Some(header) = &content.header {
        root.push(emit_header(header));
    }
    root
}

fn emit_visual(visual: &Visual) -> WireElement {
    let mut el = WireElement::new("visual");
    set_nonempty(&mut el, "baseUri", visual.base_uri.as_deref());
    set_nonempty(&mut el, "lang", visual.lang.as_deref());

    let mut binding = WireElement::new("binding");
    binding.set_attr("template", "ToastGeneric");
    for element in &visual.body {
        match element {
            BodyElement::Text(text) => binding.push(emit_text(text)),
            BodyElement::Image(image) => binding.push(emit_image(image)),
            BodyElement::Progress(bar) => binding.push(emit_progress(bar)),
            BodyElement::Group(group) => binding.push(emit_group(group)),
        }
    }
    if let Some(logo) = &visual.logo {
        binding.push(emit_image(logo));
    }
    if let Some(hero) = &visual.hero {
        binding.push(emit_image(hero));
    }
    if let Some(attribution) = &visual.attribution {
        let mut text = emit_text(attribution);
        text.set_attr("placement", "attribution");
        binding.push(text);
    }
    el.push(binding);
    el
}

fn emit_text(text: &Text) -> WireElement {
    let mut el = WireElement::new("text");
    el.set_attr_opt("hint-style", text.style.map(|s| s.as_str()));
    el.set_attr_opt("hint-align", text.align.map(|a| a.as_str()));
    el.set_attr_opt("hint-maxLines", text.max_lines.map(|n| n.to_string()));
    el.set_attr_opt("hint-minLines", text.min_lines.map(|n| n.to_string()));
    el.set_attr_opt("hint-wrap", text.wrap.map(bool_attr));
    set_nonempty(&mut el, "lang", text.lang.as_deref());
    el.text = Some(text.body.clone());
    el
}

fn emit_image(image: &Image) -> WireElement {
    let mut el = WireElement::new("image");
    el.set_attr("src", image.source.clone());
    match image.role {
        ImageRole::Inline => {}
        ImageRole::Logo => el.set_attr("placement", "appLogoOverride"),
        ImageRole::Hero => el.set_attr("placement", "hero"),
    }
    el.set_attr_opt("hint-crop", image.crop.map(|c| c.as_str()));
    set_nonempty(&mut el, "alt", image.alt.as_deref());
    el
}

fn emit_progress(bar: &ProgressBar) -> WireElement {
    let mut el = WireElement::new("progress");
    set_nonempty(&mut el, "title", bar.title.as_deref());
    el.set_attr("status", bar.status.clone());
    el.set_attr("value", bar.value.wire_value());
    set_nonempty(&mut el, "valueStringOverride", bar.value_override.as_deref());
    el
}

fn emit_group(group: &Group) -> WireElement {
    let mut el = WireElement::new("group");
    for column in &group.columns {
        el.push(emit_subgroup(column));
    }
    el
}

fn emit_subgroup(column: &Subgroup) -> WireElement {
    let mut el = WireElement::new("subgroup");
    el.set_attr_opt("hint-weight", column.weight.map(|w| w.to_string()));
    for child in &column.children {
        match child {
            SubgroupChild::Text(text) => el.push(emit_text(text)),
            SubgroupChild::Image(image) => el.push(emit_image(image)),
        }
    }
    el
}

fn emit_actions(actions: &ActionSet) -> WireElement {
    let mut el = WireElement::new("actions");
    match actions {
        ActionSet::SnoozeDismiss => {
            el.set_attr("hint-systemCommands", "SnoozeAndDismiss");
        }
        ActionSet::Custom(custom) => {
            for input in custom.inputs() {
                el.push(emit_input(input));
            }
            for button in custom.buttons() {
                el.push(emit_button(button));
            }
            for item in custom.context_menu_items() {
                let mut action = WireElement::new("action");
                action.set_attr("content", item.label.clone());
                action.set_attr("arguments", item.arguments.clone());
                action.set_attr_opt(
                    "activationType",
                    item.activation.map(|a| a.as_str()),
                );
                action.set_attr("placement", "contextMenu");
                el.push(action);
            }
        }
    }
    el
}

fn emit_button(button: &ActionButton) -> WireElement {
    let mut el = WireElement::new("action");
    match button {
        ActionButton::Custom(b) => {
            el.set_attr("content", b.label.clone());
            el.set_attr("arguments", b.arguments.clone());
            el.set_attr("activationType", b.activation.as_str());
            set_nonempty(&mut el, "imageUri", b.icon.as_deref());
            set_nonempty(&mut el, "hint-inputId", b.input_id.as_deref());
            el.set_attr_opt("hint-buttonStyle", b.color.map(|c| c.marker()));
        }
        ActionButton::Snooze(b) => {
            set_nonempty(&mut el, "content", b.label.as_deref());
            el.set_attr("arguments", "snooze");
            el.set_attr("activationType", "system");
            set_nonempty(&mut el, "hint-inputId", b.selection_input.as_deref());
        }
        ActionButton::Dismiss(b) => {
            set_nonempty(&mut el, "content", b.label.as_deref());
            el.set_attr("arguments", "dismiss");
            el.set_attr("activationType", "system");
        }
    }
    el
}

fn emit_input(input: &InputControl) -> WireElement {
    let mut el = WireElement::new("input");
    match input {
        InputControl::Text(text) => {
            el.set_attr("id", text.id.clone());
            el.set_attr("type", "text");
            set_nonempty(&mut el, "title", text.title.as_deref());
            set_nonempty(&mut el, "placeHolderContent", text.placeholder.as_deref());
            set_nonempty(&mut el, "defaultInput", text.default.as_deref());
        }
        InputControl::Selection(selection) => {
            el.set_attr("id", selection.id.clone());
            el.set_attr("type", "selection");
            set_nonempty(&mut el, "title", selection.title.as_deref());
            set_nonempty(&mut el, "defaultInput", selection.default_item.as_deref());
            for item in &selection.items {
                let mut choice = WireElement::new("selection");
                choice.set_attr("id", item.id.clone());
                choice.set_attr("content", item.label.clone());
                el.push(choice);
            }
        }
    }
    el
}

fn emit_audio(audio: &Audio) -> WireElement {
    let mut el = WireElement::new("audio");
    match audio {
        Audio::Standard { source, looping } => {
            el.set_attr("src", source.uri());
            if *looping {
                el.set_attr("loop", "true");
            }
        }
        Audio::Silent => {
            el.set_attr("silent", "true");
        }
    }
    el
}

fn emit_header(header: &Header) -> WireElement {
    let mut el = WireElement::new("header");
    el.set_attr("id", header.id.clone());
    el.set_attr("title", header.title.clone());
    set_nonempty(&mut el, "arguments", header.arguments.as_deref());
    el.set_attr("activationType", header.activation.as_str());
    el
}

fn bool_attr(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

fn set_nonempty(el: &mut WireElement, name: &str, value: Option<&str>) {
    if let Some(value) = value {
        if !value.is_empty() {
            el.set_attr(name, value);
        }
    }
}
