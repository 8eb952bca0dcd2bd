// Map obstacles: static walls and rocks, plus the mine and bonus objects

use super::game_object::{Collidable, GameObject, ObjectId, WorldContext};
use super::map::MapObject;
use super::physics::{BodyDef, BodyHandle, BodyType, Contact, Fixture, FixtureCategory, PhysicsEngine, Shape};
use super::{GameWorld, WorldError};
use crate::config;
use macroquad::prelude::Vec2;
use std::any::Any;

fn touched_by_vehicle(other: &Fixture) -> bool {
    matches!(other.category, FixtureCategory::Vehicle | FixtureCategory::Wheel)
}

/// Explodes when a vehicle or one of its wheels touches it
#[derive(Debug)]
pub struct Mine {
    body: BodyHandle,
    exploded: bool,
}

impl Mine {
    pub fn new(id: ObjectId, physics: &mut dyn PhysicsEngine, position: Vec2) -> Self {
        let body = physics.create_body(
            BodyDef::new(
                BodyType::Static,
                position,
                Shape::Circle {
                    radius: config::MINE_RADIUS,
                },
                FixtureCategory::Mine,
            )
            .sensor()
            .user_data(id),
        );
        Mine { body, exploded: false }
    }

    pub fn body(&self) -> BodyHandle {
        self.body
    }

    pub fn is_exploded(&self) -> bool {
        self.exploded
    }
}

impl GameObject for Mine {
    fn act(&mut self, _ctx: &mut WorldContext<'_>, _delta: f32) -> bool {
        !self.exploded
    }

    fn as_collidable_mut(&mut self) -> Option<&mut dyn Collidable> {
        Some(self)
    }

    fn on_removed(&mut self, physics: &mut dyn PhysicsEngine) {
        physics.destroy_body(self.body);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Collidable for Mine {
    fn begin_contact(&mut self, _ctx: &mut WorldContext<'_>, _contact: &Contact, other: &Fixture) {
        if touched_by_vehicle(other) {
            crate::debug_world!("Mine {:?} exploded", self.body);
            self.exploded = true;
        }
    }
}

/// Adds to the score once, then disappears
#[derive(Debug)]
pub struct Bonus {
    body: BodyHandle,
    score: i32,
    picked: bool,
}

impl Bonus {
    pub fn new(id: ObjectId, physics: &mut dyn PhysicsEngine, position: Vec2) -> Self {
        let body = physics.create_body(
            BodyDef::new(
                BodyType::Static,
                position,
                Shape::Circle {
                    radius: config::BONUS_RADIUS,
                },
                FixtureCategory::Bonus,
            )
            .sensor()
            .user_data(id),
        );
        Bonus {
            body,
            score: config::BONUS_SCORE,
            picked: false,
        }
    }

    pub fn body(&self) -> BodyHandle {
        self.body
    }
}

impl GameObject for Bonus {
    fn act(&mut self, _ctx: &mut WorldContext<'_>, _delta: f32) -> bool {
        !self.picked
    }

    fn as_collidable_mut(&mut self) -> Option<&mut dyn Collidable> {
        Some(self)
    }

    fn on_removed(&mut self, physics: &mut dyn PhysicsEngine) {
        physics.destroy_body(self.body);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Collidable for Bonus {
    fn begin_contact(&mut self, ctx: &mut WorldContext<'_>, _contact: &Contact, other: &Fixture) {
        // Front and rear wheels can touch in the same step
        if touched_by_vehicle(other) && !self.picked {
            self.picked = true;
            ctx.increase_score(self.score);
        }
    }
}

/// Creates the bodies or objects for one obstacle-layer entry
pub fn create_obstacle<P: PhysicsEngine + 'static>(
    world: &mut GameWorld<P>,
    object: &MapObject,
) -> Result<(), WorldError> {
    let center = object.center();
    let size = object.size();
    match object.kind.as_str() {
        "wall" | "finish" => {
            let (category, sensor) = if object.kind == "wall" {
                (FixtureCategory::Wall, false)
            } else {
                (FixtureCategory::FinishLine, true)
            };
            let mut body_def = BodyDef::new(
                BodyType::Static,
                center,
                Shape::Box {
                    half_width: size.x / 2.0,
                    half_height: size.y / 2.0,
                },
                category,
            );
            if sensor {
                body_def = body_def.sensor();
            }
            world.physics_mut().create_body(body_def);
        }
        "rock" => {
            world.physics_mut().create_body(BodyDef::new(
                BodyType::Static,
                center,
                Shape::Circle {
                    radius: config::ROCK_RADIUS,
                },
                FixtureCategory::Rock,
            ));
        }
        "mine" => {
            world.spawn(|id, physics| Box::new(Mine::new(id, physics, center)));
        }
        "bonus" => {
            world.spawn(|id, physics| Box::new(Bonus::new(id, physics, center)));
        }
        other => return Err(WorldError::UnknownObstacleType(other.to_string())),
    }
    crate::debug_world!("Created {} at ({:.1}, {:.1})", object.kind, center.x, center.y);
    Ok(())
}
