// Menu data and the built-in menu item factories

use super::actor::{Actor, ActorId, ActorKind};
use super::builder::UiBuilder;
use super::element::Element;
use super::error::SyntaxError;

/// One entry of a menu, in display order
#[derive(Debug, Clone, PartialEq)]
pub enum MenuItem {
    Button {
        text: String,
        label: Option<String>,
        actor: ActorId,
    },
    Label {
        text: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Menu {
    style: String,
    label_column_width: Option<f32>,
    items: Vec<MenuItem>,
}

impl Menu {
    pub fn new(style: impl Into<String>) -> Self {
        Menu {
            style: style.into(),
            label_column_width: None,
            items: Vec::new(),
        }
    }

    pub fn style(&self) -> &str {
        &self.style
    }

    pub fn label_column_width(&self) -> Option<f32> {
        self.label_column_width
    }

    pub fn set_label_column_width(&mut self, width: f32) {
        self.label_column_width = Some(width);
    }

    pub fn add_item(&mut self, text: impl Into<String>, actor: ActorId) {
        self.items.push(MenuItem::Button {
            text: text.into(),
            label: None,
            actor,
        });
    }

    pub fn add_item_with_label(&mut self, label: impl Into<String>, text: impl Into<String>, actor: ActorId) {
        self.items.push(MenuItem::Button {
            text: text.into(),
            label: Some(label.into()),
            actor,
        });
    }

    pub fn add_label(&mut self, text: impl Into<String>) {
        self.items.push(MenuItem::Label { text: text.into() });
    }

    pub fn items(&self) -> &[MenuItem] {
        &self.items
    }
}

/// `<ButtonMenuItem text="..." label="..."/>`: a text button, optionally with
/// a label in the label column
pub fn create_button_item(
    builder: &mut UiBuilder,
    menu: &mut Menu,
    element: &Element,
) -> Result<Option<ActorId>, SyntaxError> {
    let text = element.attribute_or("text", "").to_string();
    let button = Actor::new(ActorKind::TextButton {
        text: text.clone(),
        style: menu.style().to_string(),
    });
    let actor = builder.tree_mut().add(button);
    match element.attribute("label") {
        Some(label) => menu.add_item_with_label(label, text, actor),
        None => menu.add_item(text, actor),
    }
    Ok(Some(actor))
}

/// `<LabelMenuItem text="..."/>`: a non-interactive line
pub fn create_label_item(
    _builder: &mut UiBuilder,
    menu: &mut Menu,
    element: &Element,
) -> Result<Option<ActorId>, SyntaxError> {
    let text = element.attribute("text").ok_or_else(|| SyntaxError::MissingAttribute {
        element: element.name().to_string(),
        name: "text".to_string(),
    })?;
    menu.add_label(text);
    Ok(None)
}
