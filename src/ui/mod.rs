//! Declarative UI: markup reading, element traversal and the actor builder.

pub mod actor;
pub mod anchor;
pub mod animscript;
pub mod atlas;
pub mod builder;
pub mod color;
pub mod dimension;
pub mod element;
pub mod error;
pub mod markup;
pub mod menu;
pub mod traversor;

pub use actor::{Actor, ActorId, ActorKind, UiTree};
pub use builder::UiBuilder;
pub use element::Element;
pub use error::SyntaxError;
