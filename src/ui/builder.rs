//! Markup to actor tree builder.
//!
//! `UiBuilder` walks an element tree through the `ElementTreeTraversor`,
//! creates one actor per resolved element with the factory registered for
//! its name, then applies the generic attributes (geometry, visibility,
//! colour, debug, anchor rules) itself. Anchor rules are only recorded here;
//! `UiTree::layout` resolves them later.

use super::actor::{Actor, ActorId, ActorKind, DebugMode, Drawable, UiTree};
use super::anchor::{Align, Anchor, AnchorGroup, PositionRule};
use super::animscript;
use super::atlas::{Skin, StyleKind, TextureAtlas};
use super::color::parse_color;
use super::dimension::{DimensionParser, Unit};
use super::element::Element;
use super::error::SyntaxError;
use super::markup;
use super::menu::{self, Menu};
use super::traversor::ElementTreeTraversor;
use crate::config;
use log::error;
use std::collections::HashMap;
use std::rc::Rc;

/// Pseudo id naming the most recently built actor
pub const PREVIOUS_ACTOR_ID: &str = "$prev";

pub type ActorFactory = Rc<dyn Fn(&mut UiBuilder, &Element) -> Result<Actor, SyntaxError>>;
pub type MenuItemFactory =
    Rc<dyn Fn(&mut UiBuilder, &mut Menu, &Element) -> Result<Option<ActorId>, SyntaxError>>;

type BuiltinFactory = fn(&mut UiBuilder, &Element) -> Result<Actor, SyntaxError>;

pub struct UiBuilder {
    atlas: TextureAtlas,
    atlases: HashMap<String, TextureAtlas>,
    skin: Skin,
    actor_factories: HashMap<String, ActorFactory>,
    menu_item_factories: HashMap<String, MenuItemFactory>,
    actor_for_id: HashMap<String, ActorId>,
    last_added: Option<ActorId>,
    dimension_parser: DimensionParser,
    traversor: Rc<ElementTreeTraversor>,
    tree: UiTree,
}

impl UiBuilder {
    pub fn new(atlas: TextureAtlas, skin: Skin) -> Self {
        let mut builder = UiBuilder {
            atlas,
            atlases: HashMap::new(),
            skin,
            actor_factories: HashMap::new(),
            menu_item_factories: HashMap::new(),
            actor_for_id: HashMap::new(),
            last_added: None,
            dimension_parser: DimensionParser::new(),
            traversor: Rc::new(ElementTreeTraversor::new()),
            tree: UiTree::new(),
        };
        builder.init_actor_factories();
        builder.init_menu_item_factories();
        builder
    }

    fn init_actor_factories(&mut self) {
        let builtins: [(&str, BuiltinFactory); 13] = [
            ("Image", create_image),
            ("ImageButton", create_image_button),
            ("TextButton", create_text_button),
            ("Group", create_group),
            ("AnchorGroup", create_anchor_group),
            ("Label", create_label),
            ("ScrollPane", create_scroll_pane),
            ("VerticalGroup", create_vertical_group),
            ("HorizontalGroup", create_horizontal_group),
            ("CheckBox", create_check_box),
            ("Menu", create_menu_actor),
            ("MenuScrollPane", create_menu_scroll_pane),
            ("Table", create_table),
        ];
        for (name, factory) in builtins {
            self.register_actor_factory(name, factory);
        }
    }

    fn init_menu_item_factories(&mut self) {
        self.register_menu_item_factory("ButtonMenuItem", menu::create_button_item);
        self.register_menu_item_factory("LabelMenuItem", menu::create_label_item);
    }

    /// Registers or replaces the factory used for elements named `name`
    pub fn register_actor_factory<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&mut UiBuilder, &Element) -> Result<Actor, SyntaxError> + 'static,
    {
        self.actor_factories.insert(name.to_string(), Rc::new(factory));
    }

    pub fn register_menu_item_factory<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&mut UiBuilder, &mut Menu, &Element) -> Result<Option<ActorId>, SyntaxError> + 'static,
    {
        self.menu_item_factories.insert(name.to_string(), Rc::new(factory));
    }

    /// Defines a variable usable as `${name}` and by `<Ifdef>`
    pub fn define_variable(&mut self, name: &str, value: &str) {
        Rc::make_mut(&mut self.traversor).define_variable(name, value);
    }

    /// Makes an atlas available to `<Image atlas="name">`
    pub fn add_atlas(&mut self, name: &str, atlas: TextureAtlas) {
        self.atlases.insert(name.to_string(), atlas);
    }

    pub fn atlas(&self) -> &TextureAtlas {
        &self.atlas
    }

    pub fn skin(&self) -> &Skin {
        &self.skin
    }

    pub fn dimension_parser(&self) -> &DimensionParser {
        &self.dimension_parser
    }

    pub fn tree(&self) -> &UiTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut UiTree {
        &mut self.tree
    }

    /// Builds the children of `root`, attaching them to `parent` if given.
    ///
    /// Returns the actor built for the first child. Errors are logged and
    /// yield `None`.
    pub fn build(&mut self, root: &Element, parent: Option<ActorId>) -> Option<ActorId> {
        match self.try_build(root, parent) {
            Ok(actor) => actor,
            Err(e) => {
                error!(target: "ui", "Parse error: {}", e);
                None
            }
        }
    }

    /// Same as `build` but returns the failure. Actors created by a failed
    /// pass are removed from the tree.
    pub fn try_build(
        &mut self,
        root: &Element,
        parent: Option<ActorId>,
    ) -> Result<Option<ActorId>, SyntaxError> {
        self.actor_for_id.clear();
        self.last_added = None;
        let len = self.tree.len();
        let result = self.do_build(root, parent);
        if result.is_err() {
            self.tree.truncate(len);
            self.actor_for_id.clear();
            self.last_added = None;
        }
        result
    }

    /// Parses `source` and builds its root's children
    pub fn build_markup(&mut self, source: &str, parent: Option<ActorId>) -> Option<ActorId> {
        match markup::parse(source) {
            Ok(root) => self.build(&root, parent),
            Err(e) => {
                error!(target: "ui", "Parse error: {}", e);
                None
            }
        }
    }

    /// Looks up an actor of the current pass.
    ///
    /// # Panics
    ///
    /// Panics if no actor was built with this id.
    pub fn actor(&self, id: &str) -> ActorId {
        match self.find_actor(id) {
            Some(actor) => actor,
            None => panic!("No actor with id '{}'", id),
        }
    }

    pub fn find_actor(&self, id: &str) -> Option<ActorId> {
        if id == PREVIOUS_ACTOR_ID {
            self.last_added
        } else {
            self.actor_for_id.get(id).copied()
        }
    }

    fn do_build(
        &mut self,
        parent_element: &Element,
        parent: Option<ActorId>,
    ) -> Result<Option<ActorId>, SyntaxError> {
        let traversor = Rc::clone(&self.traversor);
        let mut root = None;
        traversor.traverse(parent_element, &mut |element| {
            // Consumed by their actor in create_actor_actions
            if element.name() == "Action" {
                return Ok(());
            }
            let actor = self.build_element(element, parent)?;
            root.get_or_insert(actor);
            Ok(())
        })?;
        Ok(root)
    }

    fn build_element(
        &mut self,
        element: &Element,
        parent: Option<ActorId>,
    ) -> Result<ActorId, SyntaxError> {
        let factory = self
            .actor_factories
            .get(element.name())
            .cloned()
            .ok_or_else(|| SyntaxError::UnknownElementType(element.name().to_string()))?;
        let mut actor = factory(self, element)?;
        if actor.kind.is_layout_widget() {
            actor.fill_parent = element.bool_attribute("fillParent", false);
        }
        let id = self.tree.add(actor);
        self.apply_actor_properties(id, element, parent)?;
        self.create_actor_actions(id, element);
        self.register_id(id, element)?;

        let kind = &self.tree.get(id).kind;
        if kind.is_group() && !kind.manages_own_children() {
            self.do_build(element, Some(id))?;
        }
        crate::debug_ui!("Built {} as actor {}", element, id.index());
        self.last_added = Some(id);
        Ok(id)
    }

    fn register_id(&mut self, actor: ActorId, element: &Element) -> Result<(), SyntaxError> {
        if let Some(id) = element.attribute("id") {
            if self.actor_for_id.contains_key(id) {
                return Err(SyntaxError::DuplicateId(id.to_string()));
            }
            self.actor_for_id.insert(id.to_string(), actor);
        }
        Ok(())
    }

    fn apply_actor_properties(
        &mut self,
        id: ActorId,
        element: &Element,
        parent: Option<ActorId>,
    ) -> Result<(), SyntaxError> {
        let mut anchor_parent = None;
        if let Some(parent) = parent {
            self.tree.add_child(parent, id);
            if matches!(self.tree.get(parent).kind, ActorKind::AnchorGroup(_)) {
                anchor_parent = Some(parent);
            }
        }

        let parser = self.dimension_parser;
        let actor = self.tree.get_mut(id);
        for (name, field) in [
            ("x", &mut actor.x),
            ("y", &mut actor.y),
            ("width", &mut actor.width),
            ("height", &mut actor.height),
            ("originX", &mut actor.origin_x),
            ("originY", &mut actor.origin_y),
        ] {
            if let Some(value) = element.non_empty_attribute(name) {
                *field = parser.parse(value)?;
            }
        }
        if let Some(value) = element.non_empty_attribute("visible") {
            actor.visible = value == "true";
        }
        if let Some(value) = element.non_empty_attribute("color") {
            actor.color = parse_color(value)?;
        }
        if let Some(value) = element.non_empty_attribute("debug") {
            if actor.kind.is_group() {
                match value.to_lowercase().as_str() {
                    "true" => actor.debug = DebugMode::On,
                    "all" => actor.debug = DebugMode::All,
                    _ => {}
                }
            } else {
                actor.debug = if value == "true" { DebugMode::On } else { DebugMode::Off };
            }
        }

        for anchor in Anchor::ALL {
            let Some(text) = element.non_empty_attribute(anchor.name()) else {
                continue;
            };
            let group = anchor_parent.ok_or_else(|| SyntaxError::MissingAnchorParent(element.to_string()))?;
            let rule = self.parse_rule(text, id, anchor)?;
            if let Some(anchors) = self.tree.anchor_group_mut(group) {
                anchors.add_rule(rule);
            }
        }
        Ok(())
    }

    /// Parses `"<id>.<anchor> [<h> <v>]"`; offsets are in grid units
    fn parse_rule(
        &self,
        text: &str,
        target: ActorId,
        target_anchor: Anchor,
    ) -> Result<PositionRule, SyntaxError> {
        let malformed = |reason: &str| SyntaxError::MalformedAnchorRule {
            rule: text.to_string(),
            reason: reason.to_string(),
        };
        let tokens: Vec<&str> = text.split_whitespace().collect();
        if tokens.len() != 1 && tokens.len() != 3 {
            return Err(malformed("expected 1 or 3 tokens"));
        }
        let parts: Vec<&str> = tokens[0].split('.').collect();
        if parts.len() != 2 {
            return Err(malformed("reference should be of the form <id>.<anchor>"));
        }
        let reference = self
            .find_actor(parts[0])
            .ok_or_else(|| SyntaxError::UnknownActorId(parts[0].to_string()))?;
        let reference_anchor =
            Anchor::from_name(parts[1]).ok_or_else(|| SyntaxError::InvalidAnchorName(parts[1].to_string()))?;
        let (h_space, v_space) = if tokens.len() == 3 {
            (
                self.dimension_parser.parse_with_unit(tokens[1], Unit::Grid)?,
                self.dimension_parser.parse_with_unit(tokens[2], Unit::Grid)?,
            )
        } else {
            (0.0, 0.0)
        };
        Ok(PositionRule {
            target,
            target_anchor,
            reference,
            reference_anchor,
            h_space,
            v_space,
        })
    }

    fn create_actor_actions(&mut self, id: ActorId, element: &Element) {
        for child in element.children_by_name("Action") {
            let definition = child.text().unwrap_or("");
            let script = self
                .traversor
                .expand(definition)
                .map_err(|e| e.to_string())
                .and_then(|text| animscript::load(&text, &self.dimension_parser).map_err(|e| e.to_string()));
            match script {
                Ok(script) => self.tree.get_mut(id).add_action(script.create_action()),
                Err(e) => error!(target: "ui", "Failed to parse:\n{}\n\n{}", definition, e),
            }
        }
    }

    fn atlas_for_element(&self, element: &Element) -> Result<&TextureAtlas, SyntaxError> {
        match element.non_empty_attribute("atlas") {
            None => Ok(&self.atlas),
            Some(name) => self
                .atlases
                .get(name)
                .ok_or_else(|| SyntaxError::UnknownAtlas(name.to_string())),
        }
    }
}

fn process_text(text: Option<&str>) -> String {
    text.unwrap_or("").replace("\\n", "\n")
}

fn parse_align(element: &Element) -> Result<Option<Align>, SyntaxError> {
    element.non_empty_attribute("align").map(Align::parse).transpose()
}

fn parse_spacing(element: &Element) -> Result<f32, SyntaxError> {
    match element.non_empty_attribute("spacing") {
        None => Ok(0.0),
        Some(value) => value.parse().map_err(|_| SyntaxError::InvalidAttribute {
            name: "spacing".to_string(),
            value: value.to_string(),
        }),
    }
}

fn create_image(builder: &mut UiBuilder, element: &Element) -> Result<Actor, SyntaxError> {
    let atlas = builder.atlas_for_element(element)?;
    let (drawable, size) = match element.non_empty_attribute("name") {
        None => (None, None),
        Some(name) => match name.strip_suffix(".9") {
            Some(base) => {
                let patch = atlas
                    .create_patch(base)
                    .ok_or_else(|| SyntaxError::MissingRegion(base.to_string()))?;
                let size = (patch.region.width, patch.region.height);
                (Some(Drawable::NinePatch(patch)), Some(size))
            }
            None => {
                let region = atlas
                    .find_region(name)
                    .cloned()
                    .ok_or_else(|| SyntaxError::MissingRegion(name.to_string()))?;
                let size = (region.width, region.height);
                let drawable = if element.bool_attribute("tiled", false) {
                    Drawable::Tiled(region)
                } else {
                    Drawable::Region(region)
                };
                (Some(drawable), Some(size))
            }
        },
    };
    let mut actor = Actor::new(ActorKind::Image { drawable });
    if let Some((width, height)) = size {
        actor.width = width as f32 * config::UI_UNIT_FOR_PIXEL;
        actor.height = height as f32 * config::UI_UNIT_FOR_PIXEL;
    }
    Ok(actor)
}

fn create_image_button(builder: &mut UiBuilder, element: &Element) -> Result<Actor, SyntaxError> {
    let style = builder
        .skin
        .style(StyleKind::ImageButton, element.attribute_or("style", "default"))?;
    let image = element
        .non_empty_attribute("imageName")
        .map(|name| builder.skin.drawable(name))
        .transpose()?;
    let image_color = element.non_empty_attribute("imageColor").map(parse_color).transpose()?;
    Ok(Actor::new(ActorKind::ImageButton {
        style,
        image,
        image_color,
    }))
}

fn create_text_button(builder: &mut UiBuilder, element: &Element) -> Result<Actor, SyntaxError> {
    let style = builder
        .skin
        .style(StyleKind::TextButton, element.attribute_or("style", "default"))?;
    Ok(Actor::new(ActorKind::TextButton {
        text: process_text(element.text()),
        style,
    }))
}

fn create_group(_builder: &mut UiBuilder, _element: &Element) -> Result<Actor, SyntaxError> {
    Ok(Actor::new(ActorKind::Group))
}

fn create_table(_builder: &mut UiBuilder, element: &Element) -> Result<Actor, SyntaxError> {
    Ok(Actor::new(ActorKind::Table {
        style: element.attribute_or("style", "default").to_string(),
    }))
}

fn create_anchor_group(builder: &mut UiBuilder, element: &Element) -> Result<Actor, SyntaxError> {
    // Later grid offsets of this pass use the new size
    let grid_size = builder.dimension_parser.parse(element.attribute_or("gridSize", "1"))?;
    builder.dimension_parser.grid_size = grid_size;
    Ok(Actor::new(ActorKind::AnchorGroup(AnchorGroup::new(grid_size))))
}

fn create_label(builder: &mut UiBuilder, element: &Element) -> Result<Actor, SyntaxError> {
    let style = builder
        .skin
        .style(StyleKind::Label, element.attribute_or("style", "default"))?;
    Ok(Actor::new(ActorKind::Label {
        text: process_text(element.text()),
        style,
        align: parse_align(element)?,
    }))
}

fn create_scroll_pane(builder: &mut UiBuilder, element: &Element) -> Result<Actor, SyntaxError> {
    let style = element
        .non_empty_attribute("style")
        .map(|name| builder.skin.style(StyleKind::ScrollPane, name))
        .transpose()?;
    let child = builder.do_build(element, None)?;
    Ok(Actor::new(ActorKind::ScrollPane { style }).with_children(child.into_iter().collect()))
}

fn create_vertical_group(_builder: &mut UiBuilder, element: &Element) -> Result<Actor, SyntaxError> {
    Ok(Actor::new(ActorKind::VerticalGroup {
        spacing: parse_spacing(element)?,
        align: parse_align(element)?,
    }))
}

fn create_horizontal_group(_builder: &mut UiBuilder, element: &Element) -> Result<Actor, SyntaxError> {
    Ok(Actor::new(ActorKind::HorizontalGroup {
        spacing: parse_spacing(element)?,
    }))
}

fn create_check_box(builder: &mut UiBuilder, element: &Element) -> Result<Actor, SyntaxError> {
    let style = builder
        .skin
        .style(StyleKind::CheckBox, element.attribute_or("style", "default"))?;
    Ok(Actor::new(ActorKind::CheckBox {
        text: element.text().unwrap_or("").to_string(),
        style,
        checked: element.bool_attribute("checked", false),
    }))
}

fn create_menu_actor(builder: &mut UiBuilder, element: &Element) -> Result<Actor, SyntaxError> {
    let (menu, items) = create_menu(builder, element)?;
    Ok(Actor::new(ActorKind::Menu(menu)).with_children(items))
}

fn create_menu_scroll_pane(builder: &mut UiBuilder, element: &Element) -> Result<Actor, SyntaxError> {
    let (menu, items) = create_menu(builder, element)?;
    Ok(Actor::new(ActorKind::MenuScrollPane(menu)).with_children(items))
}

fn create_menu(builder: &mut UiBuilder, element: &Element) -> Result<(Menu, Vec<ActorId>), SyntaxError> {
    let style = builder
        .skin
        .style(StyleKind::Menu, element.attribute_or("style", "default"))?;
    let mut menu = Menu::new(style);
    if let Some(value) = element.non_empty_attribute("labelColumnWidth") {
        let width: i32 = value.parse().map_err(|_| SyntaxError::InvalidAttribute {
            name: "labelColumnWidth".to_string(),
            value: value.to_string(),
        })?;
        if width > 0 {
            menu.set_label_column_width(width as f32);
        }
    }

    let mut actors = Vec::new();
    if let Some(items) = element.child_by_name("Items") {
        let traversor = Rc::clone(&builder.traversor);
        traversor.traverse(items, &mut |item| {
            let factory = builder
                .menu_item_factories
                .get(item.name())
                .cloned()
                .ok_or_else(|| SyntaxError::UnknownMenuItemType(item.name().to_string()))?;
            if let Some(actor) = factory(builder, &mut menu, item)? {
                builder.register_id(actor, item)?;
                actors.push(actor);
            }
            Ok(())
        })?;
    }
    Ok((menu, actors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn builder() -> UiBuilder {
        let atlas = TextureAtlas::new()
            .with_region("logo", 40, 20)
            .with_patch("frame", 30, 12, [4, 4, 3, 3]);
        UiBuilder::new(atlas, Skin::with_defaults())
    }

    fn build(builder: &mut UiBuilder, source: &str) -> Result<Option<ActorId>, SyntaxError> {
        let root = markup::parse(source).unwrap();
        builder.try_build(&root, None)
    }

    #[test]
    fn test_actor_lookup_by_id() {
        let mut builder = builder();
        let root = build(
            &mut builder,
            r#"<Ui><Group id="main"><Label id="title">Hello</Label><Image id="logo" name="logo"/></Group></Ui>"#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(builder.actor("main"), root);
        let title = builder.actor("title");
        assert_eq!(builder.tree().get(title).parent(), Some(root));
        match &builder.tree().get(title).kind {
            ActorKind::Label { text, .. } => assert_eq!(text, "Hello"),
            other => panic!("unexpected kind {:?}", other),
        }
        assert_eq!(builder.actor(PREVIOUS_ACTOR_ID), root);
        assert!(builder.find_actor("missing").is_none());
    }

    #[test]
    #[should_panic(expected = "No actor with id 'ghost'")]
    fn test_actor_missing_id_panics() {
        builder().actor("ghost");
    }

    #[test]
    fn test_duplicate_id_fails() {
        let mut builder = builder();
        let source = r#"<Ui><Group><Label id="x"/><Label id="x"/></Group></Ui>"#;
        assert_eq!(
            build(&mut builder, source).unwrap_err(),
            SyntaxError::DuplicateId("x".to_string())
        );
        let root = markup::parse(source).unwrap();
        assert!(builder.build(&root, None).is_none());
        assert!(builder.tree().is_empty());
    }

    #[test]
    fn test_ids_are_cleared_between_passes() {
        let mut builder = builder();
        build(&mut builder, r#"<Ui><Label id="a"/></Ui>"#).unwrap();
        build(&mut builder, r#"<Ui><Label id="a"/></Ui>"#).unwrap();
        assert_eq!(builder.tree().len(), 2);
    }

    #[test]
    fn test_fill_parent_only_on_widgets() {
        let mut builder = builder();
        build(
            &mut builder,
            r#"<Ui><Group><Label id="label" fillParent="true"/><VerticalGroup id="column" fillParent="true"/></Group></Ui>"#,
        )
        .unwrap();
        assert!(builder.tree().get(builder.actor("label")).fill_parent);
        assert!(!builder.tree().get(builder.actor("column")).fill_parent);
    }

    #[test]
    fn test_anchor_outside_anchor_group_fails() {
        let mut builder = builder();
        let err = build(
            &mut builder,
            r#"<Ui><Group id="g"><Label topLeft="g.topLeft"/></Group></Ui>"#,
        )
        .unwrap_err();
        assert!(matches!(err, SyntaxError::MissingAnchorParent(_)));
    }

    #[test]
    fn test_unknown_element_type() {
        let mut builder = builder();
        assert_eq!(
            build(&mut builder, "<Ui><Slider/></Ui>").unwrap_err(),
            SyntaxError::UnknownElementType("Slider".to_string())
        );
    }

    #[test]
    fn test_rule_grammar() {
        let mut builder = builder();
        build(&mut builder, r#"<Ui><Group id="a"/><Group id="b"/></Ui>"#).unwrap();
        let a = builder.actor("a");
        let b = builder.actor("b");

        let rule = builder.parse_rule("a.topLeft", b, Anchor::Center).unwrap();
        assert_eq!(rule.reference, a);
        assert_eq!(rule.reference_anchor, Anchor::TopLeft);
        assert_eq!(rule.target, b);
        assert_eq!((rule.h_space, rule.v_space), (0.0, 0.0));

        let rule = builder.parse_rule("a.topLeft 2 3", b, Anchor::Center).unwrap();
        assert_eq!((rule.h_space, rule.v_space), (2.0, 3.0));

        assert!(matches!(
            builder.parse_rule("a.topLeft 2", b, Anchor::Center),
            Err(SyntaxError::MalformedAnchorRule { .. })
        ));
        assert!(matches!(
            builder.parse_rule("a-topLeft", b, Anchor::Center),
            Err(SyntaxError::MalformedAnchorRule { .. })
        ));
        assert_eq!(
            builder.parse_rule("a.bogus", b, Anchor::Center).unwrap_err(),
            SyntaxError::InvalidAnchorName("bogus".to_string())
        );
        assert_eq!(
            builder.parse_rule("nobody.center", b, Anchor::Center).unwrap_err(),
            SyntaxError::UnknownActorId("nobody".to_string())
        );
    }

    #[test]
    fn test_anchor_rules_resolved_by_layout() {
        let mut builder = builder();
        let root = build(
            &mut builder,
            r#"<Ui>
                <AnchorGroup id="root" gridSize="10" width="200" height="100">
                    <Label id="a" width="40" height="10" topLeft="root.topLeft 1 -1"/>
                    <Label width="20" height="10" centerLeft="$prev.centerRight"/>
                </AnchorGroup>
            </Ui>"#,
        )
        .unwrap()
        .unwrap();
        let second = builder.tree().get(root).children()[1];
        match &builder.tree().get(root).kind {
            ActorKind::AnchorGroup(group) => {
                assert_eq!(group.rules().len(), 2);
                assert_approx_eq!(group.grid_size(), 10.0);
            }
            other => panic!("unexpected kind {:?}", other),
        }

        builder.tree_mut().layout(root);
        let a = builder.tree().get(builder.actor("a"));
        assert_approx_eq!(a.x, 10.0);
        assert_approx_eq!(a.y, 80.0);
        let b = builder.tree().get(second);
        assert_approx_eq!(b.x, 50.0);
        assert_approx_eq!(b.y, 80.0);
    }

    #[test]
    fn test_image_natural_size() {
        let mut builder = builder();
        build(
            &mut builder,
            r#"<Ui><Group>
                <Image id="plain" name="logo"/>
                <Image id="sized" name="logo" width="10"/>
                <Image id="patch" name="frame.9"/>
                <Image id="tiled" name="logo" tiled="true"/>
            </Group></Ui>"#,
        )
        .unwrap();
        let tree = builder.tree();
        let plain = tree.get(builder.actor("plain"));
        assert_approx_eq!(plain.width, 40.0 * config::UI_UNIT_FOR_PIXEL);
        assert_approx_eq!(plain.height, 20.0 * config::UI_UNIT_FOR_PIXEL);
        let sized = tree.get(builder.actor("sized"));
        assert_approx_eq!(sized.width, 10.0);
        assert_approx_eq!(sized.height, 20.0 * config::UI_UNIT_FOR_PIXEL);
        assert!(matches!(
            tree.get(builder.actor("patch")).kind,
            ActorKind::Image { drawable: Some(Drawable::NinePatch(_)) }
        ));
        assert!(matches!(
            tree.get(builder.actor("tiled")).kind,
            ActorKind::Image { drawable: Some(Drawable::Tiled(_)) }
        ));
    }

    #[test]
    fn test_image_from_named_atlas() {
        let mut builder = builder();
        builder.add_atlas("icons", TextureAtlas::new().with_region("star", 8, 8));
        build(&mut builder, r#"<Ui><Image id="s" atlas="icons" name="star"/></Ui>"#).unwrap();
        assert_approx_eq!(
            builder.tree().get(builder.actor("s")).width,
            8.0 * config::UI_UNIT_FOR_PIXEL
        );
        assert_eq!(
            build(&mut builder, r#"<Ui><Image atlas="nope" name="star"/></Ui>"#).unwrap_err(),
            SyntaxError::UnknownAtlas("nope".to_string())
        );
    }

    #[test]
    fn test_generic_properties() {
        let mut builder = builder();
        build(
            &mut builder,
            r##"<Ui><Group id="g" x="5" y="6" visible="false" debug="all" color="#ff0000">
                <Label id="l" debug="True">Two\nlines</Label>
            </Group></Ui>"##,
        )
        .unwrap();
        let tree = builder.tree();
        let group = tree.get(builder.actor("g"));
        assert_approx_eq!(group.x, 5.0);
        assert_approx_eq!(group.y, 6.0);
        assert!(!group.visible);
        assert_eq!(group.debug, DebugMode::All);
        assert_approx_eq!(group.color.g, 0.0);
        let label = tree.get(builder.actor("l"));
        assert_eq!(label.debug, DebugMode::Off);
        match &label.kind {
            ActorKind::Label { text, .. } => assert_eq!(text, "Two\nlines"),
            other => panic!("unexpected kind {:?}", other),
        }
    }

    #[test]
    fn test_unrecognized_alignment() {
        let mut builder = builder();
        assert_eq!(
            build(&mut builder, r#"<Ui><Label align="middle"/></Ui>"#).unwrap_err(),
            SyntaxError::UnrecognizedAlignment("middle".to_string())
        );
    }

    #[test]
    fn test_repeat_and_ifdef() {
        let mut builder = builder();
        builder.define_variable("touch", "1");
        build(
            &mut builder,
            r#"<Ui><VerticalGroup id="list" spacing="2">
                <Repeat count="3" var="i"><Label id="item${i}">Item ${i}</Label></Repeat>
                <Ifdef var="touch"><Label id="touch"/></Ifdef>
                <Else><Label id="keyboard"/></Else>
            </VerticalGroup></Ui>"#,
        )
        .unwrap();
        let list = builder.actor("list");
        assert_eq!(builder.tree().get(list).children().len(), 4);
        assert!(builder.find_actor("item2").is_some());
        assert!(builder.find_actor("touch").is_some());
        assert!(builder.find_actor("keyboard").is_none());
    }

    #[test]
    fn test_scroll_pane_wraps_first_child() {
        let mut builder = builder();
        build(
            &mut builder,
            r#"<Ui><ScrollPane id="pane"><VerticalGroup id="content"/></ScrollPane></Ui>"#,
        )
        .unwrap();
        let pane = builder.actor("pane");
        let content = builder.actor("content");
        assert_eq!(builder.tree().get(pane).children(), &[content]);
        assert_eq!(builder.tree().get(content).parent(), Some(pane));
    }

    #[test]
    fn test_menu_items() {
        let mut builder = builder();
        build(
            &mut builder,
            r#"<Ui><Menu id="menu" labelColumnWidth="120"><Items>
                <ButtonMenuItem id="start" text="Start"/>
                <LabelMenuItem text="Options"/>
                <ButtonMenuItem label="Sound" text="On"/>
            </Items></Menu></Ui>"#,
        )
        .unwrap();
        let menu_id = builder.actor("menu");
        let start = builder.actor("start");
        let tree = builder.tree();
        assert_eq!(tree.get(start).parent(), Some(menu_id));
        match &tree.get(menu_id).kind {
            ActorKind::Menu(menu) => {
                assert_eq!(menu.items().len(), 3);
                assert_eq!(menu.label_column_width(), Some(120.0));
                assert!(matches!(
                    &menu.items()[2],
                    menu::MenuItem::Button { label: Some(label), .. } if label == "Sound"
                ));
            }
            other => panic!("unexpected kind {:?}", other),
        }

        assert_eq!(
            build(&mut builder, r#"<Ui><Menu><Items><SliderMenuItem/></Items></Menu></Ui>"#).unwrap_err(),
            SyntaxError::UnknownMenuItemType("SliderMenuItem".to_string())
        );
    }

    #[test]
    fn test_actions_skip_invalid_scripts() {
        let mut builder = builder();
        build(
            &mut builder,
            r#"<Ui><Group id="g">
                <Action>alpha 0 1</Action>
                <Action>wobble 3</Action>
                <Label id="l"/>
            </Group></Ui>"#,
        )
        .unwrap();
        let group = builder.actor("g");
        assert_eq!(builder.tree().get(group).action_count(), 1);
        assert_eq!(builder.tree().get(group).children().len(), 1);
    }

    #[test]
    fn test_custom_factory() {
        let mut builder = builder();
        builder.register_actor_factory("Gauge", |_, element| {
            let mut actor = Actor::new(ActorKind::Custom("Gauge".to_string()));
            actor.width = element.attribute_or("size", "0").parse().unwrap_or(0.0);
            Ok(actor)
        });
        build(&mut builder, r#"<Ui><Gauge id="gauge" size="12" height="3"/></Ui>"#).unwrap();
        let gauge = builder.tree().get(builder.actor("gauge"));
        assert_approx_eq!(gauge.width, 12.0);
        assert_approx_eq!(gauge.height, 3.0);
    }
}
