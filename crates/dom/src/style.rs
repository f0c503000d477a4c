//! Inline style declarations (`element.style`)
//!
//! Parsing is lenient: a declaration without a colon, or with an empty
//! name or value, is dropped.

use serde::{Deserialize, Serialize};

/// Ordered declaration block of an element's `style` attribute
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CssStyleDeclaration {
    declarations: Vec<(String, String)>,
}

impl CssStyleDeclaration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(css_text: &str) -> Self {
        let mut style = Self::new();
        style.set_css_text(css_text);
        style
    }

    /// Replace every declaration with the ones parsed from `css_text`
    pub fn set_css_text(&mut self, css_text: &str) {
        self.declarations.clear();
        for (name, value) in parse_declarations(css_text) {
            self.set_property(name, value);
        }
    }

    /// Serialized form, e.g. `font-size: 12px; color: red;`
    pub fn css_text(&self) -> String {
        self.declarations
            .iter()
            .map(|(name, value)| format!("{}: {};", name, value))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn get_property_value(&self, name: &str) -> Option<&str> {
        let name = name.trim().to_ascii_lowercase();
        self.declarations
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set one property. An empty value removes it.
    pub fn set_property(&mut self, name: &str, value: &str) {
        let name = name.trim().to_ascii_lowercase();
        let value = value.trim();

        if value.is_empty() {
            self.remove_property(&name);
            return;
        }

        match self.declarations.iter_mut().find(|(n, _)| *n == name) {
            Some((_, v)) => *v = value.to_string(),
            None => self.declarations.push((name, value.to_string())),
        }
    }

    pub fn remove_property(&mut self, name: &str) -> Option<String> {
        let name = name.trim().to_ascii_lowercase();
        let index = self.declarations.iter().position(|(n, _)| *n == name)?;
        Some(self.declarations.remove(index).1)
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.declarations
            .iter()
            .map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

/// Split `name: value; name: value` into trimmed pairs
fn parse_declarations(style: &str) -> impl Iterator<Item = (&str, &str)> {
    style.split(';').filter_map(|decl| {
        let decl = decl.trim();
        if decl.is_empty() {
            return None;
        }

        let mut parts = decl.splitn(2, ':');
        let name = parts.next()?.trim();
        let value = parts.next()?.trim();

        if name.is_empty() || value.is_empty() {
            return None;
        }

        Some((name, value))
    })
}
