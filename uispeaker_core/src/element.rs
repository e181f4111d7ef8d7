// Copyright 2026 the UISpeaker Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Element classification and event inference.
//!
//! An element is read once into an [`ElementShape`] snapshot. Two pure
//! functions run over that snapshot:
//!
//! - [`ElementShape::kind`] sorts the element into a closed [`ElementKind`]
//!   following the inference priority, and [`ElementKind::inferred_event`]
//!   maps that to an [`EventCategory`].
//! - [`ElementShape::toggle_surface`] picks which native mechanism reports
//!   open/close transitions, used by the binder for `open` and `close`.
//!
//! The two are separate on purpose: `<details role="button">` infers `click`,
//! yet an explicit `open` override on it must still listen to the native
//! toggle signal.

use alloc::string::String;

use crate::category::EventCategory;
use crate::dom::{ATTR_EVENT, DomHost};

/// Input types that behave like click targets rather than text entry.
const CLICK_INPUT_TYPES: &[&str] = &["checkbox", "radio", "range", "color", "file"];

/// ARIA roles treated as click targets.
const CLICK_ROLES: &[&str] = &[
    "button", "link", "checkbox", "switch", "radio", "tab", "menuitem", "option",
];

/// Everything classification needs to know about an element.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ElementShape {
    /// Lowercase tag name.
    pub tag: String,
    /// Normalized input type; only meaningful when `tag == "input"`.
    pub input_type: String,
    /// Value of the `role` attribute.
    pub role: Option<String>,
    /// Value of the `contenteditable` attribute.
    pub content_editable: Option<String>,
    /// Whether a `data-state` attribute is present.
    pub has_data_state: bool,
}

/// The closed set of element shapes the engine distinguishes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// `<details>`: native disclosure with a toggle signal.
    Disclosure,
    /// `<dialog>`: modal with an `open` attribute and a close signal.
    Modal,
    /// Any element exposing `data-state` (headless UI toggles).
    StatefulToggle,
    /// Text entry: text-like inputs, `<textarea>`, contenteditable.
    TextInput,
    /// Buttons, links, click-like inputs, selects and ARIA click roles.
    ClickTarget,
    /// Anything else.
    Generic,
}

/// Native mechanism that reports open/close transitions for an element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ToggleSurface {
    /// Native `toggle` signal; open state read from the `open` attribute.
    Disclosure,
    /// Watch the `open` attribute and the native `close` signal.
    Modal,
    /// Watch `data-state` for `"open"` / `"closed"`.
    DataState,
}

impl ElementShape {
    /// Snapshots `element` through `host`.
    pub fn read<H: DomHost + ?Sized>(host: &H, element: &H::Element) -> Self {
        let tag = host.tag_name(element);
        let input_type = if tag == "input" {
            host.input_type(element)
        } else {
            String::new()
        };
        Self {
            input_type,
            role: host.attribute(element, "role"),
            content_editable: host.attribute(element, "contenteditable"),
            has_data_state: host.has_attribute(element, "data-state"),
            tag,
        }
    }

    /// Classifies the element, highest priority first.
    #[must_use]
    pub fn kind(&self) -> ElementKind {
        match self.tag.as_str() {
            "input" if CLICK_INPUT_TYPES.contains(&self.input_type.as_str()) => {
                return ElementKind::ClickTarget;
            }
            "input" | "textarea" => return ElementKind::TextInput,
            "select" => return ElementKind::ClickTarget,
            _ => {}
        }
        if self.content_editable.as_deref() == Some("true") {
            return ElementKind::TextInput;
        }
        let click_role = self
            .role
            .as_deref()
            .is_some_and(|role| CLICK_ROLES.contains(&role));
        if matches!(self.tag.as_str(), "button" | "a") || click_role {
            return ElementKind::ClickTarget;
        }
        match self.tag.as_str() {
            "details" => ElementKind::Disclosure,
            "dialog" => ElementKind::Modal,
            _ if self.has_data_state => ElementKind::StatefulToggle,
            _ => ElementKind::Generic,
        }
    }

    /// Returns the open/close mechanism for this element, by tag alone.
    #[must_use]
    pub fn toggle_surface(&self) -> ToggleSurface {
        match self.tag.as_str() {
            "details" => ToggleSurface::Disclosure,
            "dialog" => ToggleSurface::Modal,
            _ => ToggleSurface::DataState,
        }
    }
}

impl ElementKind {
    /// Returns the category used when no override is present.
    #[must_use]
    pub const fn inferred_event(self) -> EventCategory {
        match self {
            Self::TextInput => EventCategory::Input,
            Self::Disclosure | Self::Modal | Self::StatefulToggle => EventCategory::Open,
            Self::ClickTarget | Self::Generic => EventCategory::Click,
        }
    }
}

/// Infers the event category for `element` from its shape alone.
pub fn infer_event<H: DomHost + ?Sized>(host: &H, element: &H::Element) -> EventCategory {
    ElementShape::read(host, element).kind().inferred_event()
}

/// Picks the category for `element`: a valid `data-uispeaker-event` override
/// wins, otherwise the category inferred from `shape`.
///
/// An override naming an unknown category is logged and ignored.
pub fn effective_event<H: DomHost + ?Sized>(
    host: &H,
    element: &H::Element,
    shape: &ElementShape,
) -> EventCategory {
    if let Some(value) = host.attribute(element, ATTR_EVENT) {
        match value.parse() {
            Ok(category) => return category,
            Err(err) => tracing::warn!(%err, tag = %shape.tag, "ignoring event override"),
        }
    }
    shape.kind().inferred_event()
}
