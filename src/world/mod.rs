//! Game world simulation.
//!
//! `GameWorld` owns the physics engine and the active game objects. Each
//! frame the physics is stepped at a fixed rate, contact events are routed
//! to the objects owning the touching fixtures, then every object acts and
//! the ones reporting themselves dead are removed.

pub mod error;
pub mod game_object;
pub mod map;
pub mod obstacles;
pub mod physics;
pub mod skidmarks;
pub mod vehicle;

pub use error::WorldError;
pub use game_object::{Collidable, GameObject, GameState, ObjectId, WorldContext};
pub use map::{MapInfo, MapObject};
pub use physics::{PhysicsEngine, SimplePhysics};
pub use vehicle::Vehicle;

use crate::config;
use log::info;
use macroquad::prelude::Vec2;
use physics::{BodyDef, BodyType, Contact, ContactEvent, Fixture, FixtureCategory, Shape};
use skidmarks::RingBuffer;
use std::time::{Duration, Instant};

type ObjectEntry = (ObjectId, Box<dyn GameObject>);

/// Time spent in the last `act` call
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameTimings {
    pub physics: Duration,
    pub game_objects: Duration,
}

pub struct GameWorld<P: PhysicsEngine + 'static = SimplePhysics> {
    physics: P,
    objects: Vec<ObjectEntry>,
    next_id: u32,
    vehicle_id: Option<ObjectId>,
    skidmarks: RingBuffer<Vec2>,
    state: GameState,
    score: f32,
    time_accumulator: f32,
    timings: FrameTimings,
}

impl<P: PhysicsEngine + 'static> GameWorld<P> {
    /// Empty world without a vehicle
    pub fn new(physics: P) -> Self {
        GameWorld {
            physics,
            objects: Vec::new(),
            next_id: 1,
            vehicle_id: None,
            skidmarks: RingBuffer::new(config::SKIDMARK_CAPACITY),
            state: GameState::Running,
            score: 0.0,
            time_accumulator: 0.0,
            timings: FrameTimings::default(),
        }
    }

    /// Sets up a track: outside walls, map obstacles and the player vehicle
    /// on the start tile
    pub fn with_map(physics: P, map: &MapInfo) -> Result<Self, WorldError> {
        let start = map.find_start_tile_position().ok_or(WorldError::NoStartTile)?;
        let mut world = GameWorld::new(physics);
        world.create_outside_walls(map);
        for object in map.obstacles() {
            obstacles::create_obstacle(&mut world, object)?;
        }
        let id = world.spawn(|id, physics| {
            let mut vehicle = Vehicle::new(id, physics, start).with_default_wheels(physics);
            vehicle.set_limit_angle(true);
            Box::new(vehicle)
        });
        world.vehicle_id = Some(id);
        info!(
            target: "world",
            "World ready: {:.1}x{:.1} m, {} objects, vehicle at ({:.1}, {:.1})",
            map.width_in_meters(),
            map.height_in_meters(),
            world.objects.len(),
            start.x,
            start.y
        );
        Ok(world)
    }

    fn create_outside_walls(&mut self, map: &MapInfo) {
        let width = map.width_in_meters();
        let height = map.height_in_meters();
        let wall = config::WALL_SIZE;
        let walls = [
            (Vec2::new(-wall / 2.0, height / 2.0), Vec2::new(wall / 2.0, height / 2.0 + wall)),
            (Vec2::new(width + wall / 2.0, height / 2.0), Vec2::new(wall / 2.0, height / 2.0 + wall)),
            (Vec2::new(width / 2.0, -wall / 2.0), Vec2::new(width / 2.0 + wall, wall / 2.0)),
            (Vec2::new(width / 2.0, height + wall / 2.0), Vec2::new(width / 2.0 + wall, wall / 2.0)),
        ];
        for (center, half) in walls {
            self.physics.create_body(BodyDef::new(
                BodyType::Static,
                center,
                Shape::Box {
                    half_width: half.x,
                    half_height: half.y,
                },
                FixtureCategory::Wall,
            ));
        }
    }

    /// Advances the world by `delta` seconds of wall-clock time
    pub fn act(&mut self, delta: f32) {
        let start = Instant::now();
        let old_y = self.vehicle_position().map(|position| position.y);

        self.time_accumulator += delta.min(config::MAX_FRAME_TIME);
        let mut steps = 0;
        while self.time_accumulator >= config::TIME_STEP {
            self.physics.step(
                config::TIME_STEP,
                config::VELOCITY_ITERATIONS,
                config::POSITION_ITERATIONS,
            );
            self.time_accumulator -= config::TIME_STEP;
            self.dispatch_contacts();
            steps += 1;
        }
        crate::debug_physics!("{} steps, {:.4}s left over", steps, self.time_accumulator);

        if let (Some(old_y), Some(position)) = (old_y, self.vehicle_position()) {
            // Net displacement, negative when reversing
            if delta > 0.0 {
                self.score += (position.y - old_y) * config::SCORE_PER_METER;
            }
        }
        self.timings.physics = start.elapsed();

        let start = Instant::now();
        self.act_game_objects(delta);
        self.timings.game_objects = start.elapsed();
    }

    fn act_game_objects(&mut self, delta: f32) {
        let GameWorld {
            physics,
            objects,
            skidmarks,
            state,
            score,
            vehicle_id,
            ..
        } = self;
        // Backwards so that removal does not shift objects not yet visited
        for index in (0..objects.len()).rev() {
            let alive = {
                let mut ctx = WorldContext {
                    physics: &mut *physics,
                    skidmarks: &mut *skidmarks,
                    state: &mut *state,
                    score: &mut *score,
                };
                objects[index].1.act(&mut ctx, delta)
            };
            if !alive {
                let (id, mut object) = objects.remove(index);
                object.on_removed(&mut *physics);
                if *vehicle_id == Some(id) {
                    *vehicle_id = None;
                }
                crate::debug_world!("Removed object {}", id);
            }
        }
    }

    fn dispatch_contacts(&mut self) {
        let events = self.physics.drain_contact_events();
        if events.is_empty() {
            return;
        }
        let GameWorld {
            physics,
            objects,
            skidmarks,
            state,
            score,
            ..
        } = self;
        let mut ctx = WorldContext {
            physics,
            skidmarks,
            state,
            score,
        };
        for event in events {
            let (contact, begin) = match event {
                ContactEvent::Begin(contact) => (contact, true),
                ContactEvent::End(contact) => (contact, false),
            };
            notify(objects, &mut ctx, &contact, &contact.fixture_a, &contact.fixture_b, begin);
            notify(objects, &mut ctx, &contact, &contact.fixture_b, &contact.fixture_a, begin);
        }
    }

    fn allocate_id(&mut self) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Adds an object that does not need to know its own id
    pub fn add_game_object(&mut self, object: Box<dyn GameObject>) -> ObjectId {
        let id = self.allocate_id();
        self.objects.push((id, object));
        id
    }

    /// Adds an object built with its id, so its bodies can carry it as user data
    pub fn spawn<F>(&mut self, create: F) -> ObjectId
    where
        F: FnOnce(ObjectId, &mut dyn PhysicsEngine) -> Box<dyn GameObject>,
    {
        let id = self.allocate_id();
        let object = create(id, &mut self.physics);
        self.objects.push((id, object));
        id
    }

    pub fn remove_game_object(&mut self, id: ObjectId) -> bool {
        let Some(index) = self.objects.iter().position(|(object_id, _)| *object_id == id) else {
            return false;
        };
        let (_, mut object) = self.objects.remove(index);
        object.on_removed(&mut self.physics);
        if self.vehicle_id == Some(id) {
            self.vehicle_id = None;
        }
        true
    }

    pub fn game_object(&self, id: ObjectId) -> Option<&dyn GameObject> {
        self.objects
            .iter()
            .find(|(object_id, _)| *object_id == id)
            .map(|(_, object)| object.as_ref())
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn increase_score(&mut self, delta: i32) {
        info!(target: "world", "+{}", delta);
        self.score += delta as f32;
    }

    pub fn score(&self) -> i32 {
        self.score as i32
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn set_state(&mut self, state: GameState) {
        if self.state != state {
            info!(target: "world", "Game state: {:?}", state);
            self.state = state;
        }
    }

    pub fn skidmarks(&self) -> &RingBuffer<Vec2> {
        &self.skidmarks
    }

    pub fn vehicle(&self) -> Option<&Vehicle> {
        self.vehicle_id
            .and_then(|id| self.game_object(id))
            .and_then(|object| object.as_any().downcast_ref::<Vehicle>())
    }

    pub fn vehicle_mut(&mut self) -> Option<&mut Vehicle> {
        let id = self.vehicle_id?;
        self.objects
            .iter_mut()
            .find(|(object_id, _)| *object_id == id)
            .and_then(|(_, object)| object.as_any_mut().downcast_mut::<Vehicle>())
    }

    pub fn vehicle_position(&self) -> Option<Vec2> {
        let vehicle = self.vehicle()?;
        self.physics.body(vehicle.body()).map(|body| body.position())
    }

    /// Whether something at height `y` is close enough to the vehicle to be drawn
    pub fn is_visible(&self, y: f32) -> bool {
        match self.vehicle_position() {
            Some(position) => (y - position.y).abs() < config::VIEWPORT_WIDTH * 1.2,
            None => true,
        }
    }

    pub fn physics(&self) -> &P {
        &self.physics
    }

    pub fn physics_mut(&mut self) -> &mut P {
        &mut self.physics
    }

    pub fn time_accumulator(&self) -> f32 {
        self.time_accumulator
    }

    pub fn timings(&self) -> FrameTimings {
        self.timings
    }
}

fn notify(
    objects: &mut [ObjectEntry],
    ctx: &mut WorldContext<'_>,
    contact: &Contact,
    fixture: &Fixture,
    other: &Fixture,
    begin: bool,
) {
    let Some(id) = fixture.user_data else {
        return;
    };
    let Some((_, object)) = objects.iter_mut().find(|(object_id, _)| *object_id == id) else {
        return;
    };
    if let Some(collidable) = object.as_collidable_mut() {
        if begin {
            collidable.begin_contact(ctx, contact, other);
        } else {
            collidable.end_contact(ctx, contact, other);
        }
    }
}
