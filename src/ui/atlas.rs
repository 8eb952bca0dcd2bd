// Texture atlas and skin lookup: in-memory region table and named styles

use super::error::SyntaxError;
use std::collections::{HashMap, HashSet};

/// A named rectangle of an atlas page, in pixels
#[derive(Debug, Clone, PartialEq)]
pub struct AtlasRegion {
    pub name: String,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Nine-patch borders (left, right, top, bottom), if the region has any
    pub splits: Option<[u32; 4]>,
}

/// A stretchable region: borders keep their size, the middle stretches
#[derive(Debug, Clone, PartialEq)]
pub struct NinePatch {
    pub region: AtlasRegion,
    pub left: u32,
    pub right: u32,
    pub top: u32,
    pub bottom: u32,
}

#[derive(Debug, Clone, Default)]
pub struct TextureAtlas {
    regions: HashMap<String, AtlasRegion>,
}

impl TextureAtlas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_region(&mut self, region: AtlasRegion) {
        self.regions.insert(region.name.clone(), region);
    }

    /// Convenience for regions without a page position or splits
    pub fn with_region(mut self, name: &str, width: u32, height: u32) -> Self {
        self.add_region(AtlasRegion {
            name: name.to_string(),
            x: 0,
            y: 0,
            width,
            height,
            splits: None,
        });
        self
    }

    pub fn with_patch(mut self, name: &str, width: u32, height: u32, splits: [u32; 4]) -> Self {
        self.add_region(AtlasRegion {
            name: name.to_string(),
            x: 0,
            y: 0,
            width,
            height,
            splits: Some(splits),
        });
        self
    }

    pub fn find_region(&self, name: &str) -> Option<&AtlasRegion> {
        self.regions.get(name)
    }

    /// Creates a nine-patch from a region that has splits
    pub fn create_patch(&self, name: &str) -> Option<NinePatch> {
        let region = self.regions.get(name)?;
        let [left, right, top, bottom] = region.splits?;
        Some(NinePatch {
            region: region.clone(),
            left,
            right,
            top,
            bottom,
        })
    }
}

/// Widget families that take a named style from the skin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleKind {
    Label,
    TextButton,
    ImageButton,
    CheckBox,
    ScrollPane,
    Menu,
}

impl StyleKind {
    const ALL: [StyleKind; 6] = [
        StyleKind::Label,
        StyleKind::TextButton,
        StyleKind::ImageButton,
        StyleKind::CheckBox,
        StyleKind::ScrollPane,
        StyleKind::Menu,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StyleKind::Label => "label",
            StyleKind::TextButton => "text button",
            StyleKind::ImageButton => "image button",
            StyleKind::CheckBox => "check box",
            StyleKind::ScrollPane => "scroll pane",
            StyleKind::Menu => "menu",
        }
    }
}

/// Named styles and drawables shared by widgets
#[derive(Debug, Clone, Default)]
pub struct Skin {
    styles: HashSet<(StyleKind, String)>,
    drawables: TextureAtlas,
}

impl Skin {
    pub fn new() -> Self {
        Self::default()
    }

    /// A skin providing a "default" style for every widget family
    pub fn with_defaults() -> Self {
        let mut skin = Skin::new();
        for kind in StyleKind::ALL {
            skin.add_style(kind, "default");
        }
        skin
    }

    pub fn add_style(&mut self, kind: StyleKind, name: &str) {
        self.styles.insert((kind, name.to_string()));
    }

    pub fn add_drawable(&mut self, region: AtlasRegion) {
        self.drawables.add_region(region);
    }

    pub fn style(&self, kind: StyleKind, name: &str) -> Result<String, SyntaxError> {
        if self.styles.contains(&(kind, name.to_string())) {
            Ok(name.to_string())
        } else {
            Err(SyntaxError::UnknownStyle {
                kind: kind.name(),
                name: name.to_string(),
            })
        }
    }

    pub fn drawable(&self, name: &str) -> Result<AtlasRegion, SyntaxError> {
        self.drawables
            .find_region(name)
            .cloned()
            .ok_or_else(|| SyntaxError::MissingRegion(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_patch_requires_splits() {
        let atlas = TextureAtlas::new()
            .with_region("plain", 10, 10)
            .with_patch("frame", 30, 20, [4, 4, 3, 3]);
        assert!(atlas.create_patch("plain").is_none());
        let patch = atlas.create_patch("frame").unwrap();
        assert_eq!((patch.left, patch.bottom), (4, 3));
        assert_eq!(patch.region.width, 30);
    }

    #[test]
    fn test_skin_styles() {
        let mut skin = Skin::with_defaults();
        skin.add_style(StyleKind::Label, "title");
        assert_eq!(skin.style(StyleKind::Label, "title").unwrap(), "title");
        assert!(skin.style(StyleKind::Menu, "title").is_err());
        assert!(skin.drawable("icon").is_err());
    }
}
