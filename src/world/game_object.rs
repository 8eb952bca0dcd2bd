// Simulated entities and the world state they may touch while acting

use super::physics::{Contact, Fixture, PhysicsEngine};
use super::skidmarks::RingBuffer;
use log::info;
use macroquad::prelude::Vec2;
use std::any::Any;
use std::fmt;

/// Identifies a game object; stored as user data on its physics bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub(crate) u32);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GameState {
    #[default]
    Running,
    Broken,
    Finished,
}

/// Mutable view of the world handed to objects while they act or collide
pub struct WorldContext<'a> {
    pub physics: &'a mut dyn PhysicsEngine,
    pub skidmarks: &'a mut RingBuffer<Vec2>,
    pub state: &'a mut GameState,
    pub score: &'a mut f32,
}

impl WorldContext<'_> {
    pub fn increase_score(&mut self, delta: i32) {
        info!(target: "world", "+{}", delta);
        *self.score += delta as f32;
    }

    /// Moves the game out of `Running`; later transitions are ignored
    pub fn end_game(&mut self, state: GameState) {
        if *self.state == GameState::Running && state != GameState::Running {
            info!(target: "world", "Game state: {:?}", state);
            *self.state = state;
        }
    }
}

pub trait GameObject {
    /// Advances the object by one frame. Returning false removes it from the world.
    fn act(&mut self, ctx: &mut WorldContext<'_>, delta: f32) -> bool;

    fn as_collidable_mut(&mut self) -> Option<&mut dyn Collidable> {
        None
    }

    /// Called once after the object left the world, to release its bodies
    fn on_removed(&mut self, _physics: &mut dyn PhysicsEngine) {}

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Objects reacting to contacts of their bodies. `other` is the fixture
/// touching this object.
pub trait Collidable {
    fn begin_contact(&mut self, ctx: &mut WorldContext<'_>, contact: &Contact, other: &Fixture);

    fn end_contact(&mut self, _ctx: &mut WorldContext<'_>, _contact: &Contact, _other: &Fixture) {}
}
