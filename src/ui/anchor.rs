//! Anchor constraint model.
//!
//! A `PositionRule` places an anchor point of a target actor onto an anchor
//! point of a reference actor, plus an offset. Rules are recorded by the
//! builder and evaluated later by `UiTree::layout`.

use super::actor::ActorId;
use super::error::SyntaxError;

/// One of the 9 attachment points of an actor's bounding box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Anchor {
    TopLeft,
    TopCenter,
    TopRight,
    CenterLeft,
    Center,
    CenterRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl Anchor {
    pub const ALL: [Anchor; 9] = [
        Anchor::TopLeft,
        Anchor::TopCenter,
        Anchor::TopRight,
        Anchor::CenterLeft,
        Anchor::Center,
        Anchor::CenterRight,
        Anchor::BottomLeft,
        Anchor::BottomCenter,
        Anchor::BottomRight,
    ];

    /// Markup name, also used as the attribute name of anchor rules
    pub fn name(self) -> &'static str {
        match self {
            Anchor::TopLeft => "topLeft",
            Anchor::TopCenter => "topCenter",
            Anchor::TopRight => "topRight",
            Anchor::CenterLeft => "centerLeft",
            Anchor::Center => "center",
            Anchor::CenterRight => "centerRight",
            Anchor::BottomLeft => "bottomLeft",
            Anchor::BottomCenter => "bottomCenter",
            Anchor::BottomRight => "bottomRight",
        }
    }

    pub fn from_name(name: &str) -> Option<Anchor> {
        Anchor::ALL.into_iter().find(|anchor| anchor.name() == name)
    }

    /// Horizontal position as a fraction of the width (0 = left)
    pub fn h_percent(self) -> f32 {
        match self {
            Anchor::TopLeft | Anchor::CenterLeft | Anchor::BottomLeft => 0.0,
            Anchor::TopCenter | Anchor::Center | Anchor::BottomCenter => 0.5,
            Anchor::TopRight | Anchor::CenterRight | Anchor::BottomRight => 1.0,
        }
    }

    /// Vertical position as a fraction of the height (0 = bottom, y grows up)
    pub fn v_percent(self) -> f32 {
        match self {
            Anchor::BottomLeft | Anchor::BottomCenter | Anchor::BottomRight => 0.0,
            Anchor::CenterLeft | Anchor::Center | Anchor::CenterRight => 0.5,
            Anchor::TopLeft | Anchor::TopCenter | Anchor::TopRight => 1.0,
        }
    }
}

/// Text alignment inside labels and groups, spelled like anchor names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Align(pub Anchor);

impl Align {
    /// Reads the optional `align` attribute value
    pub fn parse(text: &str) -> Result<Align, SyntaxError> {
        Anchor::from_name(text)
            .map(Align)
            .ok_or_else(|| SyntaxError::UnrecognizedAlignment(text.to_string()))
    }
}

/// Places `target_anchor` of `target` on `reference_anchor` of `reference`,
/// shifted by (`h_space`, `v_space`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionRule {
    pub target: ActorId,
    pub target_anchor: Anchor,
    pub reference: ActorId,
    pub reference_anchor: Anchor,
    pub h_space: f32,
    pub v_space: f32,
}

/// Container data of an anchor group: its rules, in insertion order
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorGroup {
    rules: Vec<PositionRule>,
    grid_size: f32,
}

impl AnchorGroup {
    pub fn new(grid_size: f32) -> Self {
        AnchorGroup {
            rules: Vec::new(),
            grid_size,
        }
    }

    pub fn add_rule(&mut self, rule: PositionRule) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &[PositionRule] {
        &self.rules
    }

    pub fn grid_size(&self) -> f32 {
        self.grid_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for anchor in Anchor::ALL {
            assert_eq!(Anchor::from_name(anchor.name()), Some(anchor));
        }
        assert_eq!(Anchor::from_name("bogus"), None);
        assert_eq!(Anchor::from_name("TopLeft"), None);
    }

    #[test]
    fn test_percentages() {
        assert_eq!((Anchor::TopLeft.h_percent(), Anchor::TopLeft.v_percent()), (0.0, 1.0));
        assert_eq!((Anchor::Center.h_percent(), Anchor::Center.v_percent()), (0.5, 0.5));
        assert_eq!(
            (Anchor::BottomRight.h_percent(), Anchor::BottomRight.v_percent()),
            (1.0, 0.0)
        );
    }

    #[test]
    fn test_align_parse() {
        assert_eq!(Align::parse("centerLeft").unwrap(), Align(Anchor::CenterLeft));
        assert_eq!(
            Align::parse("middle").unwrap_err(),
            SyntaxError::UnrecognizedAlignment("middle".to_string())
        );
    }
}
