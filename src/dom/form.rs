//! Form control state: values, checkedness, option selection and radio groups.
//!
//! Attributes carry the default state; the first write through one of these methods
//! makes the control dirty and detaches it from its attribute.

use super::document::Document;
use super::node::NodeId;

const INPUT_TYPES: &[&str] = &[
    "text", "password", "checkbox", "radio", "submit", "reset", "button", "hidden", "image", "file", "email",
    "url", "tel", "search", "number", "range", "date", "time", "datetime-local", "month", "week", "color",
];

const DISABLEABLE_TAGS: &[&str] = &["button", "fieldset", "input", "optgroup", "option", "select", "textarea"];

impl Document {
    /// The DOM `type` property: normalized input type, `select-one`/`select-multiple`,
    /// `textarea`, or the button type. `None` for elements without one.
    pub fn input_type(&self, id: NodeId) -> Option<String> {
        match self.tag_name(id)? {
            "input" => {
                let declared = self.attr(id, "type").unwrap_or("").to_ascii_lowercase();
                if INPUT_TYPES.contains(&declared.as_str()) {
                    Some(declared)
                } else {
                    Some("text".to_string())
                }
            }
            "select" if self.is_multiple(id) => Some("select-multiple".to_string()),
            "select" => Some("select-one".to_string()),
            "textarea" => Some("textarea".to_string()),
            "button" => {
                let declared = self.attr(id, "type").unwrap_or("").to_ascii_lowercase();
                match declared.as_str() {
                    "reset" | "button" => Some(declared),
                    _ => Some("submit".to_string()),
                }
            }
            _ => None,
        }
    }

    /// Whether the element has a native `value` property
    pub fn has_value_property(&self, id: NodeId) -> bool {
        matches!(
            self.tag_name(id),
            Some("input" | "select" | "textarea" | "button" | "option")
        )
    }

    /// Current value of a control, `None` when the element has no `value` property
    pub fn value(&self, id: NodeId) -> Option<String> {
        let element = self.element(id)?;
        match element.tag.as_str() {
            "input" => match self.input_type(id).as_deref() {
                Some("checkbox" | "radio") => Some(self.attr(id, "value").unwrap_or("on").to_string()),
                _ => Some(
                    element
                        .state
                        .value
                        .clone()
                        .unwrap_or_else(|| self.attr(id, "value").unwrap_or("").to_string()),
                ),
            },
            "textarea" => Some(
                element
                    .state
                    .value
                    .clone()
                    .unwrap_or_else(|| self.text_content(id)),
            ),
            "select" => Some(
                self.selected_options(id)
                    .first()
                    .and_then(|o| self.value(*o))
                    .unwrap_or_default(),
            ),
            "option" => Some(match self.attr(id, "value") {
                Some(value) => value.to_string(),
                None => self.text_content(id).split_whitespace().collect::<Vec<_>>().join(" "),
            }),
            "button" => Some(self.attr(id, "value").unwrap_or("").to_string()),
            _ => None,
        }
    }

    /// Assign the `value` property. Returns false when the element has none.
    ///
    /// For a select this selects the first option with a matching value and deselects
    /// the rest, so an unknown value leaves nothing selected.
    pub fn set_value(&mut self, id: NodeId, value: &str) -> bool {
        match self.tag_name(id) {
            Some("input") => {
                if matches!(self.input_type(id).as_deref(), Some("checkbox" | "radio")) {
                    self.set_attr(id, "value", value);
                } else if let Some(element) = self.element_mut(id) {
                    element.state.value = Some(value.to_string());
                }
                true
            }
            Some("textarea") => {
                if let Some(element) = self.element_mut(id) {
                    element.state.value = Some(value.to_string());
                }
                true
            }
            Some("select") => {
                let mut found = false;
                for option in self.options(id) {
                    let hit = !found && self.value(option).as_deref() == Some(value);
                    found |= hit;
                    if let Some(element) = self.element_mut(option) {
                        element.state.selected = Some(hit);
                    }
                }
                true
            }
            Some("option" | "button") => {
                self.set_attr(id, "value", value);
                true
            }
            _ => false,
        }
    }

    /// Checkedness of an input, `None` for other elements
    pub fn checked(&self, id: NodeId) -> Option<bool> {
        if !self.is_tag(id, "input") {
            return None;
        }
        let element = self.element(id)?;
        Some(element.state.checked.unwrap_or_else(|| self.has_attr(id, "checked")))
    }

    /// Set checkedness of an input. Checking a radio unchecks the rest of its group.
    pub fn set_checked(&mut self, id: NodeId, checked: bool) -> bool {
        if !self.is_tag(id, "input") {
            return false;
        }
        if checked && self.input_type(id).as_deref() == Some("radio") {
            for other in self.radio_group(id) {
                if other != id {
                    if let Some(element) = self.element_mut(other) {
                        element.state.checked = Some(false);
                    }
                }
            }
        }
        if let Some(element) = self.element_mut(id) {
            element.state.checked = Some(checked);
        }
        true
    }

    /// Radios sharing this radio's `name` across the document; an unnamed radio is alone
    pub fn radio_group(&self, id: NodeId) -> Vec<NodeId> {
        let name = match self.attr(id, "name") {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => return vec![id],
        };
        let mut group: Vec<NodeId> = self
            .all_elements()
            .into_iter()
            .filter(|n| {
                self.is_tag(*n, "input")
                    && self.input_type(*n).as_deref() == Some("radio")
                    && self.attr(*n, "name") == Some(name.as_str())
            })
            .collect();
        if !group.contains(&id) {
            group.insert(0, id);
        }
        group
    }

    /// `disabled` property: own attribute on form-associated elements, `None` elsewhere
    pub fn disabled(&self, id: NodeId) -> Option<bool> {
        let tag = self.tag_name(id)?;
        DISABLEABLE_TAGS
            .contains(&tag)
            .then(|| self.has_attr(id, "disabled"))
    }

    pub fn set_disabled(&mut self, id: NodeId, disabled: bool) -> bool {
        if self.disabled(id).is_none() {
            return false;
        }
        if disabled {
            self.set_attr(id, "disabled", "");
        } else {
            self.remove_attr(id, "disabled");
        }
        true
    }

    pub fn is_multiple(&self, id: NodeId) -> bool {
        self.is_tag(id, "select") && self.has_attr(id, "multiple")
    }

    /// Options of a select in document order, including those inside optgroups
    pub fn options(&self, select: NodeId) -> Vec<NodeId> {
        if !self.is_tag(select, "select") {
            return Vec::new();
        }
        self.descendants(select)
            .into_iter()
            .filter(|n| self.is_tag(*n, "option"))
            .collect()
    }

    /// Select that owns an option, looking through an optgroup
    pub fn owner_select(&self, option: NodeId) -> Option<NodeId> {
        let parent = self.parent_element(option)?;
        match self.tag_name(parent)? {
            "select" => Some(parent),
            "optgroup" => self.parent_element(parent).filter(|p| self.is_tag(*p, "select")),
            _ => None,
        }
    }

    fn explicitly_selected(&self, option: NodeId) -> bool {
        self.element(option)
            .map(|e| e.state.selected.unwrap_or_else(|| self.has_attr(option, "selected")))
            .unwrap_or(false)
    }

    /// Selected options of a select, in option order.
    ///
    /// A single select that has never been touched and has no `selected` attribute shows
    /// its first enabled option; with several candidates the last one wins.
    pub fn selected_options(&self, select: NodeId) -> Vec<NodeId> {
        let options = self.options(select);
        let explicit: Vec<NodeId> = options
            .iter()
            .copied()
            .filter(|o| self.explicitly_selected(*o))
            .collect();
        if self.is_multiple(select) {
            return explicit;
        }
        if let Some(last) = explicit.last() {
            return vec![*last];
        }
        let touched = options
            .iter()
            .any(|o| self.element(*o).is_some_and(|e| e.state.selected.is_some()));
        if touched {
            return Vec::new();
        }
        options
            .into_iter()
            .find(|o| self.disabled(*o) != Some(true))
            .into_iter()
            .collect()
    }

    /// `selected` property of an option, `None` for other elements
    pub fn selected(&self, option: NodeId) -> Option<bool> {
        if !self.is_tag(option, "option") {
            return None;
        }
        Some(match self.owner_select(option) {
            Some(select) => self.selected_options(select).contains(&option),
            None => self.explicitly_selected(option),
        })
    }

    /// Set an option's selectedness. Selecting an option of a single select deselects the others.
    pub fn set_selected(&mut self, option: NodeId, selected: bool) -> bool {
        if !self.is_tag(option, "option") {
            return false;
        }
        if let Some(select) = self.owner_select(option) {
            let siblings = self.options(select);
            let single = !self.is_multiple(select);
            for sibling in siblings {
                if sibling == option {
                    continue;
                }
                let current = self.selected(sibling).unwrap_or(false);
                if let Some(element) = self.element_mut(sibling) {
                    if element.state.selected.is_none() || (selected && single) {
                        element.state.selected = Some(current && !(selected && single));
                    }
                }
            }
        }
        if let Some(element) = self.element_mut(option) {
            element.state.selected = Some(selected);
        }
        true
    }

    /// Index of the first selected option, or -1
    pub fn selected_index(&self, select: NodeId) -> i64 {
        let options = self.options(select);
        self.selected_options(select)
            .first()
            .and_then(|s| options.iter().position(|o| o == s))
            .map_or(-1, |i| i as i64)
    }

    /// Select the option at `index` (or none for an out-of-range index)
    pub fn set_selected_index(&mut self, select: NodeId, index: i64) -> bool {
        if !self.is_tag(select, "select") {
            return false;
        }
        for (i, option) in self.options(select).into_iter().enumerate() {
            if let Some(element) = self.element_mut(option) {
                element.state.selected = Some(i as i64 == index);
            }
        }
        true
    }
}
