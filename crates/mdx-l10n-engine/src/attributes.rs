//! Localizable attributes of HTML tags and JSX components.

use mdx_l10n_syntax::{AttrValue, Element};

use crate::classify::{is_component, is_html_tag};

/// Attributes that carry prose on any HTML element.
const GLOBAL_ATTRIBUTES: &[&str] = &[
    "title",
    "aria-braillelabel",
    "aria-brailleroledescription",
    "aria-description",
    "aria-label",
    "aria-placeholder",
    "aria-roledescription",
    "aria-rowindextext",
    "aria-valuetext",
];

const TAG_ATTRIBUTES: &[(&str, &[&str])] = &[
    ("area", &["alt"]),
    ("img", &["alt"]),
    ("input", &["alt", "placeholder"]),
    ("optgroup", &["label"]),
    ("option", &["label"]),
    ("textarea", &["placeholder"]),
    ("track", &["label"]),
];

const COMPONENT_ATTRIBUTES: &[&str] = &["title", "placeholder", "label"];

fn is_localizable(tag: &str, attribute: &str) -> bool {
    if is_component(tag) || !is_html_tag(tag) {
        return COMPONENT_ATTRIBUTES.contains(&attribute);
    }
    GLOBAL_ATTRIBUTES.contains(&attribute)
        || TAG_ATTRIBUTES
            .iter()
            .any(|(name, attrs)| *name == tag && attrs.contains(&attribute))
}

/// `(attribute index, trimmed value)` for every literal attribute of
/// `element` worth translating.
pub fn localizable_attributes(element: &Element) -> Vec<(usize, String)> {
    element
        .attributes
        .iter()
        .enumerate()
        .filter(|(_, attr)| is_localizable(&element.name, &attr.name))
        .filter_map(|(index, attr)| {
            let value = attr.literal()?.trim();
            (!value.is_empty()).then(|| (index, value.to_string()))
        })
        .collect()
}

/// Replace the literal value of attribute `index`, keeping its quote.
pub fn set_attribute(element: &mut Element, index: usize, translated: &str) {
    let Some(attr) = element.attributes.get_mut(index) else {
        log::debug!("attribute {index} missing on <{}>", element.name);
        return;
    };
    if let AttrValue::Literal { value, .. } = &mut attr.value {
        *value = translated.to_string();
    }
}
