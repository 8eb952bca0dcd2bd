//! Actor arena.
//!
//! Actors live in a `UiTree` and are referenced through `ActorId` handles.
//! Ids handed out by the builder are lookups only; ownership stays with the
//! tree, and structure is expressed with parent/children handles.

use super::anchor::{Align, AnchorGroup, PositionRule};
use super::animscript::Action;
use super::atlas::{AtlasRegion, NinePatch};
use super::menu::Menu;
use macroquad::prelude::{Color, Vec2, WHITE};

/// Handle of an actor inside a `UiTree`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(usize);

impl ActorId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// How an image paints its region
#[derive(Debug, Clone, PartialEq)]
pub enum Drawable {
    Region(AtlasRegion),
    Tiled(AtlasRegion),
    NinePatch(NinePatch),
}

/// Whether debug outlines are drawn for an actor (and its subtree for `All`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DebugMode {
    #[default]
    Off,
    On,
    All,
}

/// Type-specific data of an actor
#[derive(Debug, Clone, PartialEq)]
pub enum ActorKind {
    Image {
        drawable: Option<Drawable>,
    },
    Label {
        text: String,
        style: String,
        align: Option<Align>,
    },
    TextButton {
        text: String,
        style: String,
    },
    ImageButton {
        style: String,
        image: Option<AtlasRegion>,
        image_color: Option<Color>,
    },
    CheckBox {
        text: String,
        style: String,
        checked: bool,
    },
    Group,
    AnchorGroup(AnchorGroup),
    VerticalGroup {
        spacing: f32,
        align: Option<Align>,
    },
    HorizontalGroup {
        spacing: f32,
    },
    ScrollPane {
        style: Option<String>,
    },
    Menu(Menu),
    MenuScrollPane(Menu),
    Table {
        style: String,
    },
    /// Produced by factories registered by callers
    Custom(String),
}

impl ActorKind {
    /// Containers hold child actors
    pub fn is_group(&self) -> bool {
        !matches!(
            self,
            ActorKind::Image { .. } | ActorKind::Label { .. } | ActorKind::Custom(_)
        )
    }

    /// Containers whose children the builder must not fill from markup
    pub fn manages_own_children(&self) -> bool {
        matches!(
            self,
            ActorKind::ScrollPane { .. } | ActorKind::Menu(_) | ActorKind::MenuScrollPane(_)
        )
    }

    /// Layout widgets honour the `fillParent` attribute
    pub fn is_layout_widget(&self) -> bool {
        matches!(
            self,
            ActorKind::Image { .. } | ActorKind::Label { .. } | ActorKind::CheckBox { .. }
        )
    }

    pub fn type_name(&self) -> &str {
        match self {
            ActorKind::Image { .. } => "Image",
            ActorKind::Label { .. } => "Label",
            ActorKind::TextButton { .. } => "TextButton",
            ActorKind::ImageButton { .. } => "ImageButton",
            ActorKind::CheckBox { .. } => "CheckBox",
            ActorKind::Group => "Group",
            ActorKind::AnchorGroup(_) => "AnchorGroup",
            ActorKind::VerticalGroup { .. } => "VerticalGroup",
            ActorKind::HorizontalGroup { .. } => "HorizontalGroup",
            ActorKind::ScrollPane { .. } => "ScrollPane",
            ActorKind::Menu(_) => "Menu",
            ActorKind::MenuScrollPane(_) => "MenuScrollPane",
            ActorKind::Table { .. } => "Table",
            ActorKind::Custom(name) => name,
        }
    }
}

/// A positioned, sized node of the render tree
#[derive(Debug)]
pub struct Actor {
    pub kind: ActorKind,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub origin_x: f32,
    pub origin_y: f32,
    pub color: Color,
    pub visible: bool,
    pub debug: DebugMode,
    pub fill_parent: bool,
    parent: Option<ActorId>,
    children: Vec<ActorId>,
    actions: Vec<Action>,
}

impl Actor {
    pub fn new(kind: ActorKind) -> Self {
        Actor {
            kind,
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            origin_x: 0.0,
            origin_y: 0.0,
            color: WHITE,
            visible: true,
            debug: DebugMode::Off,
            fill_parent: false,
            parent: None,
            children: Vec::new(),
            actions: Vec::new(),
        }
    }

    /// Adds children before the actor enters the tree (scroll panes, menus)
    pub fn with_children(mut self, children: Vec<ActorId>) -> Self {
        self.children = children;
        self
    }

    pub fn parent(&self) -> Option<ActorId> {
        self.parent
    }

    pub fn children(&self) -> &[ActorId] {
        &self.children
    }

    pub fn add_action(&mut self, action: Action) {
        self.actions.push(action);
    }

    pub fn action_count(&self) -> usize {
        self.actions.len()
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }
}

/// Arena owning every actor built for a screen
#[derive(Debug, Default)]
pub struct UiTree {
    actors: Vec<Actor>,
}

impl UiTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an actor. Children listed on the actor are re-parented to it.
    pub fn add(&mut self, actor: Actor) -> ActorId {
        let id = ActorId(self.actors.len());
        let children = actor.children.clone();
        self.actors.push(actor);
        for child in children {
            self.detach(child);
            self.actors[child.0].parent = Some(id);
        }
        id
    }

    /// Drops every actor added after the tree had `len` actors
    pub fn truncate(&mut self, len: usize) {
        self.actors.truncate(len);
        for actor in &mut self.actors {
            actor.children.retain(|child| child.0 < len);
            if actor.parent.is_some_and(|parent| parent.0 >= len) {
                actor.parent = None;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    pub fn get(&self, id: ActorId) -> &Actor {
        &self.actors[id.0]
    }

    pub fn get_mut(&mut self, id: ActorId) -> &mut Actor {
        &mut self.actors[id.0]
    }

    /// Makes `child` the last child of `parent`
    pub fn add_child(&mut self, parent: ActorId, child: ActorId) {
        self.detach(child);
        self.actors[child.0].parent = Some(parent);
        self.actors[parent.0].children.push(child);
    }

    fn detach(&mut self, child: ActorId) {
        if let Some(old_parent) = self.actors[child.0].parent.take() {
            self.actors[old_parent.0].children.retain(|c| *c != child);
        }
    }

    pub fn anchor_group_mut(&mut self, id: ActorId) -> Option<&mut AnchorGroup> {
        match &mut self.actors[id.0].kind {
            ActorKind::AnchorGroup(group) => Some(group),
            _ => None,
        }
    }

    /// Converts a point local to `id` to root coordinates
    pub fn local_to_stage(&self, id: ActorId, point: Vec2) -> Vec2 {
        let mut result = point;
        let mut current = Some(id);
        while let Some(actor_id) = current {
            let actor = &self.actors[actor_id.0];
            result += Vec2::new(actor.x, actor.y);
            current = actor.parent;
        }
        result
    }

    /// Converts a root-coordinates point to coordinates local to `id`
    pub fn stage_to_local(&self, id: ActorId, point: Vec2) -> Vec2 {
        point - self.local_to_stage(id, Vec2::ZERO)
    }

    /// Second layout phase: resolves fill-parent flags, box groups and
    /// anchor rules, top-down from `root`.
    pub fn layout(&mut self, root: ActorId) {
        let mut pending = vec![root];
        while let Some(id) = pending.pop() {
            self.layout_actor(id);
            pending.extend(self.actors[id.0].children.iter().rev().copied());
        }
    }

    fn layout_actor(&mut self, id: ActorId) {
        if self.actors[id.0].fill_parent {
            if let Some(parent) = self.actors[id.0].parent {
                let size = self.actors[parent.0].size();
                let actor = &mut self.actors[id.0];
                actor.x = 0.0;
                actor.y = 0.0;
                actor.width = size.x;
                actor.height = size.y;
            }
        }
        let children = self.actors[id.0].children.clone();
        match &self.actors[id.0].kind {
            ActorKind::AnchorGroup(group) => {
                let rules = group.rules().to_vec();
                for rule in rules {
                    self.apply_rule(&rule);
                }
            }
            ActorKind::VerticalGroup { spacing, .. } => {
                let spacing = *spacing;
                let mut y = self.actors[id.0].height;
                for child in children {
                    let actor = &mut self.actors[child.0];
                    y -= actor.height;
                    actor.x = 0.0;
                    actor.y = y;
                    y -= spacing;
                }
            }
            ActorKind::HorizontalGroup { spacing } => {
                let spacing = *spacing;
                let mut x = 0.0;
                for child in children {
                    let actor = &mut self.actors[child.0];
                    actor.x = x;
                    actor.y = 0.0;
                    x += actor.width + spacing;
                }
            }
            _ => {}
        }
    }

    fn apply_rule(&mut self, rule: &PositionRule) {
        let reference = &self.actors[rule.reference.0];
        let reference_point = Vec2::new(
            reference.width * rule.reference_anchor.h_percent(),
            reference.height * rule.reference_anchor.v_percent(),
        );
        let stage = self.local_to_stage(rule.reference, reference_point)
            + Vec2::new(rule.h_space, rule.v_space);
        let origin = match self.actors[rule.target.0].parent {
            Some(parent) => self.stage_to_local(parent, stage),
            None => stage,
        };
        let target = &mut self.actors[rule.target.0];
        target.x = origin.x - target.width * rule.target_anchor.h_percent();
        target.y = origin.y - target.height * rule.target_anchor.v_percent();
    }

    /// Advances every running action; finished actions are dropped
    pub fn act(&mut self, delta: f32) {
        for index in 0..self.actors.len() {
            let mut actions = std::mem::take(&mut self.actors[index].actions);
            let actor = &mut self.actors[index];
            actions.retain_mut(|action| !action.act(actor, delta));
            actor.actions = actions;
        }
    }

    /// Whether the actor and all its ancestors are visible
    pub fn is_visible(&self, id: ActorId) -> bool {
        let mut current = Some(id);
        while let Some(actor_id) = current {
            let actor = &self.actors[actor_id.0];
            if !actor.visible {
                return false;
            }
            current = actor.parent;
        }
        true
    }

    /// Whether debug outlines apply, either directly or from an `All` ancestor
    pub fn is_debug(&self, id: ActorId) -> bool {
        if self.actors[id.0].debug != DebugMode::Off {
            return true;
        }
        let mut current = self.actors[id.0].parent;
        while let Some(actor_id) = current {
            let actor = &self.actors[actor_id.0];
            if actor.debug == DebugMode::All {
                return true;
            }
            current = actor.parent;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::anchor::Anchor;
    use assert_approx_eq::assert_approx_eq;

    fn sized(kind: ActorKind, width: f32, height: f32) -> Actor {
        let mut actor = Actor::new(kind);
        actor.width = width;
        actor.height = height;
        actor
    }

    #[test]
    fn test_add_child_reparents() {
        let mut tree = UiTree::new();
        let a = tree.add(Actor::new(ActorKind::Group));
        let b = tree.add(Actor::new(ActorKind::Group));
        let c = tree.add(Actor::new(ActorKind::Group));
        tree.add_child(a, c);
        tree.add_child(b, c);
        assert!(tree.get(a).children().is_empty());
        assert_eq!(tree.get(b).children(), &[c]);
        assert_eq!(tree.get(c).parent(), Some(b));
    }

    #[test]
    fn test_add_with_children_sets_parent() {
        let mut tree = UiTree::new();
        let child = tree.add(Actor::new(ActorKind::Group));
        let pane = tree.add(Actor::new(ActorKind::ScrollPane { style: None }).with_children(vec![child]));
        assert_eq!(tree.get(child).parent(), Some(pane));
    }

    #[test]
    fn test_anchor_rule_places_target() {
        let mut tree = UiTree::new();
        let group = tree.add(sized(ActorKind::AnchorGroup(AnchorGroup::new(1.0)), 200.0, 100.0));
        let label = tree.add(sized(ActorKind::Group, 40.0, 10.0));
        tree.add_child(group, label);
        tree.anchor_group_mut(group).unwrap().add_rule(PositionRule {
            target: label,
            target_anchor: Anchor::TopRight,
            reference: group,
            reference_anchor: Anchor::TopRight,
            h_space: -5.0,
            v_space: -5.0,
        });
        tree.layout(group);
        let actor = tree.get(label);
        assert_approx_eq!(actor.x, 200.0 - 5.0 - 40.0);
        assert_approx_eq!(actor.y, 100.0 - 5.0 - 10.0);
    }

    #[test]
    fn test_anchor_rule_relative_to_sibling() {
        let mut tree = UiTree::new();
        let group = tree.add(sized(ActorKind::AnchorGroup(AnchorGroup::new(1.0)), 200.0, 100.0));
        let first = tree.add(sized(ActorKind::Group, 50.0, 20.0));
        let second = tree.add(sized(ActorKind::Group, 30.0, 20.0));
        tree.add_child(group, first);
        tree.add_child(group, second);
        let anchors = tree.anchor_group_mut(group).unwrap();
        anchors.add_rule(PositionRule {
            target: first,
            target_anchor: Anchor::BottomLeft,
            reference: group,
            reference_anchor: Anchor::BottomLeft,
            h_space: 10.0,
            v_space: 10.0,
        });
        anchors.add_rule(PositionRule {
            target: second,
            target_anchor: Anchor::CenterLeft,
            reference: first,
            reference_anchor: Anchor::CenterRight,
            h_space: 4.0,
            v_space: 0.0,
        });
        tree.layout(group);
        assert_approx_eq!(tree.get(second).x, 10.0 + 50.0 + 4.0);
        assert_approx_eq!(tree.get(second).y, 10.0);
    }

    #[test]
    fn test_fill_parent_and_vertical_group() {
        let mut tree = UiTree::new();
        let root = tree.add(sized(ActorKind::Group, 100.0, 80.0));
        let column = tree.add(Actor::new(ActorKind::VerticalGroup { spacing: 5.0, align: None }));
        tree.get_mut(column).fill_parent = true;
        tree.add_child(root, column);
        let top = tree.add(sized(ActorKind::Group, 10.0, 20.0));
        let bottom = tree.add(sized(ActorKind::Group, 10.0, 20.0));
        tree.add_child(column, top);
        tree.add_child(column, bottom);
        tree.layout(root);
        assert_approx_eq!(tree.get(column).width, 100.0);
        assert_approx_eq!(tree.get(top).y, 60.0);
        assert_approx_eq!(tree.get(bottom).y, 35.0);
    }

    #[test]
    fn test_visibility_and_debug_inherit() {
        let mut tree = UiTree::new();
        let root = tree.add(Actor::new(ActorKind::Group));
        let child = tree.add(Actor::new(ActorKind::Group));
        tree.add_child(root, child);
        tree.get_mut(root).debug = DebugMode::All;
        assert!(tree.is_debug(child));
        tree.get_mut(root).visible = false;
        assert!(!tree.is_visible(child));
    }
}
