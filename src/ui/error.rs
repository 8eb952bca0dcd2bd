// UI build errors: every markup/build-time failure is a SyntaxError

use thiserror::Error;

/// Build-time failure while turning markup into actors.
///
/// All variants are recoverable: the top-level `UiBuilder::build` logs them
/// and returns no actor.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyntaxError {
    #[error("Unknown UI element type: {0}")]
    UnknownElementType(String),
    #[error("Invalid menu item type: {0}")]
    UnknownMenuItemType(String),
    #[error("Duplicate ids: {0}")]
    DuplicateId(String),
    #[error("Invalid rule syntax '{rule}': {reason}")]
    MalformedAnchorRule { rule: String, reason: String },
    #[error("Invalid anchor name: '{0}'")]
    InvalidAnchorName(String),
    #[error("No actor with id '{0}'")]
    UnknownActorId(String),
    #[error("Parent of {0} is not an anchor group")]
    MissingAnchorParent(String),
    #[error("Unknown value of 'align': {0}")]
    UnrecognizedAlignment(String),
    #[error("Invalid dimension: '{0}'")]
    InvalidDimension(String),
    #[error("Invalid color: '{0}'")]
    InvalidColor(String),
    #[error("Invalid value '{value}' for attribute '{name}'")]
    InvalidAttribute { name: String, value: String },
    #[error("Missing attribute '{name}' on <{element}>")]
    MissingAttribute { element: String, name: String },
    #[error("Undefined variable: '{0}'")]
    UnresolvedVariable(String),
    #[error("<Else> without a preceding <Ifdef>")]
    DanglingElse,
    #[error("No {kind} style named '{name}'")]
    UnknownStyle { kind: &'static str, name: String },
    #[error("No region named {0}")]
    MissingRegion(String),
    #[error("No atlas named {0}")]
    UnknownAtlas(String),
    #[error("Markup error: {0}")]
    Markup(String),
}
