// Markup element: name, string attributes, ordered children, optional text

use std::collections::BTreeMap;
use std::fmt;

/// A node of a parsed markup document. Read-only while a build pass runs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    name: String,
    attributes: BTreeMap<String, String>,
    children: Vec<Element>,
    text: Option<String>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Element {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Builder-style attribute setter, handy when assembling trees in code
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Returns the attribute value, or `default` when it is absent
    pub fn attribute_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.attribute(name).unwrap_or(default)
    }

    /// Non-empty attribute value. Empty attributes count as absent.
    pub fn non_empty_attribute(&self, name: &str) -> Option<&str> {
        self.attribute(name).filter(|value| !value.is_empty())
    }

    /// Booleans are case-sensitive: only "true" is true
    pub fn bool_attribute(&self, name: &str, default: bool) -> bool {
        match self.non_empty_attribute(name) {
            Some(value) => value == "true",
            None => default,
        }
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut Vec<Element> {
        &mut self.children
    }

    pub fn child_by_name(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.name == name)
    }

    pub fn children_by_name<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |child| child.name == name)
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn set_text(&mut self, text: Option<String>) {
        self.text = text;
    }

    pub(crate) fn attributes_mut(&mut self) -> &mut BTreeMap<String, String> {
        &mut self.attributes
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.name)?;
        for (name, value) in &self.attributes {
            write!(f, " {}=\"{}\"", name, value)?;
        }
        write!(f, ">")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bool_attribute_is_case_sensitive() {
        let element = Element::new("Image")
            .with_attribute("a", "true")
            .with_attribute("b", "True")
            .with_attribute("c", "");
        assert!(element.bool_attribute("a", false));
        assert!(!element.bool_attribute("b", true));
        assert!(element.bool_attribute("c", true));
        assert!(!element.bool_attribute("missing", false));
    }

    #[test]
    fn test_children_by_name() {
        let element = Element::new("Group")
            .with_child(Element::new("Action"))
            .with_child(Element::new("Label"))
            .with_child(Element::new("Action"));
        assert_eq!(element.children_by_name("Action").count(), 2);
        assert_eq!(element.child_by_name("Label").map(Element::name), Some("Label"));
    }

    #[test]
    fn test_display_lists_attributes() {
        let element = Element::new("Label").with_attribute("id", "score");
        assert_eq!(element.to_string(), "<Label id=\"score\">");
    }
}
