//! Player vehicle.
//!
//! The body is a dynamic box facing +y at angle 0. Each wheel is a
//! kinematic sensor body kept at its mount point; driving and grip forces
//! are applied to the vehicle body at the wheel positions.

use super::game_object::{Collidable, GameObject, GameState, ObjectId, WorldContext};
use super::physics::{
    BodyDef, BodyHandle, BodyType, Contact, Fixture, FixtureCategory, PhysicsEngine, Shape,
};
use super::skidmarks::RingBuffer;
use crate::config;
use crate::utils::{normalize_angle, rotate};
use macroquad::prelude::Vec2;
use std::any::Any;

#[derive(Debug, Clone)]
pub struct Wheel {
    body: BodyHandle,
    mount: Vec2,
    /// 1 for steering wheels, 0 for fixed ones
    pub steering_factor: f32,
    /// Share of the drive force going through this wheel
    pub drive_factor: f32,
    skidding: bool,
    skidmarks: RingBuffer<Vec2>,
}

impl Wheel {
    pub fn body(&self) -> BodyHandle {
        self.body
    }

    pub fn mount(&self) -> Vec2 {
        self.mount
    }

    pub fn is_skidding(&self) -> bool {
        self.skidding
    }

    pub fn skidmarks(&self) -> &RingBuffer<Vec2> {
        &self.skidmarks
    }
}

#[derive(Debug)]
pub struct Vehicle {
    id: ObjectId,
    body: BodyHandle,
    width: f32,
    height: f32,
    wheels: Vec<Wheel>,
    accelerating: bool,
    braking: bool,
    direction: f32,
    turbo_time: f32,
    limit_angle: bool,
    broken: bool,
}

impl Vehicle {
    pub fn new(id: ObjectId, physics: &mut dyn PhysicsEngine, position: Vec2) -> Self {
        let body = physics.create_body(
            BodyDef::new(
                BodyType::Dynamic,
                position,
                Shape::Box {
                    half_width: config::VEHICLE_WIDTH / 2.0,
                    half_height: config::VEHICLE_HEIGHT / 2.0,
                },
                FixtureCategory::Vehicle,
            )
            .density(config::VEHICLE_DENSITY)
            .damping(config::LINEAR_DAMPING, config::ANGULAR_DAMPING)
            .user_data(id),
        );
        Vehicle {
            id,
            body,
            width: config::VEHICLE_WIDTH,
            height: config::VEHICLE_HEIGHT,
            wheels: Vec::new(),
            accelerating: false,
            braking: false,
            direction: 0.0,
            turbo_time: -1.0,
            limit_angle: false,
            broken: false,
        }
    }

    /// Mounts a wheel at `mount`, relative to the vehicle center
    pub fn add_wheel(&mut self, physics: &mut dyn PhysicsEngine, mount: Vec2) -> &mut Wheel {
        let position = physics
            .body(self.body)
            .map(|body| body.world_point(mount))
            .unwrap_or(mount);
        let body = physics.create_body(
            BodyDef::new(
                BodyType::Kinematic,
                position,
                Shape::Circle {
                    radius: config::WHEEL_RADIUS,
                },
                FixtureCategory::Wheel,
            )
            .sensor()
            .user_data(self.id),
        );
        self.wheels.push(Wheel {
            body,
            mount,
            steering_factor: 0.0,
            drive_factor: 1.0,
            skidding: false,
            skidmarks: RingBuffer::new(config::WHEEL_SKIDMARK_CAPACITY),
        });
        let index = self.wheels.len() - 1;
        &mut self.wheels[index]
    }

    /// Creates the standard three wheel sled: one steering wheel in front,
    /// two fixed rear wheels
    pub fn with_default_wheels(mut self, physics: &mut dyn PhysicsEngine) -> Self {
        let rear_y = -config::WHEEL_BASE / 2.0;
        let side_x = config::VEHICLE_WIDTH / 2.0 - config::WHEEL_RADIUS;
        let front = self.add_wheel(physics, Vec2::new(0.0, rear_y + config::WHEEL_BASE));
        front.steering_factor = 1.0;
        front.drive_factor = 0.0;
        self.add_wheel(physics, Vec2::new(-side_x, rear_y));
        self.add_wheel(physics, Vec2::new(side_x, rear_y));
        self
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn body(&self) -> BodyHandle {
        self.body
    }

    pub fn wheels(&self) -> &[Wheel] {
        &self.wheels
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn set_accelerating(&mut self, accelerating: bool) {
        self.accelerating = accelerating;
    }

    pub fn set_braking(&mut self, braking: bool) {
        self.braking = braking;
    }

    /// -1 steers fully right, 1 fully left
    pub fn set_direction(&mut self, direction: f32) {
        self.direction = direction.clamp(-1.0, 1.0);
    }

    pub fn set_limit_angle(&mut self, limit_angle: bool) {
        self.limit_angle = limit_angle;
    }

    pub fn trigger_turbo(&mut self) {
        if self.turbo_time < 0.0 {
            self.turbo_time = 0.0;
        }
    }

    /// Seconds since the turbo started, negative when inactive
    pub fn turbo_time(&self) -> f32 {
        self.turbo_time
    }

    pub fn is_broken(&self) -> bool {
        self.broken
    }

    fn drive_force(&self) -> f32 {
        let force = if self.accelerating {
            config::MAX_DRIVE_FORCE
        } else if self.braking {
            -config::BRAKE_FORCE
        } else {
            0.0
        };
        if self.turbo_time >= 0.0 {
            config::MAX_DRIVE_FORCE * config::TURBO_FORCE_FACTOR
        } else {
            force
        }
    }
}

impl GameObject for Vehicle {
    fn act(&mut self, ctx: &mut WorldContext<'_>, delta: f32) -> bool {
        if self.turbo_time >= 0.0 {
            self.turbo_time += delta;
            if self.turbo_time > config::TURBO_DURATION {
                self.turbo_time = -1.0;
            }
        }
        let driving = *ctx.state == GameState::Running;
        let drive_force = if driving { self.drive_force() } else { 0.0 };
        let steer = self.direction * config::MAX_STEER_ANGLE.to_radians();
        let wheel_count = self.wheels.len().max(1) as f32;

        let Some(body) = ctx.physics.body_mut(self.body) else {
            return true;
        };
        let mut wheel_transforms = Vec::with_capacity(self.wheels.len());
        for wheel in &mut self.wheels {
            let position = body.world_point(wheel.mount);
            let angle = body.angle() + steer * wheel.steering_factor;
            let forward = rotate(Vec2::Y, angle);
            let right = rotate(Vec2::X, angle);

            // Cancel sideways sliding, up to what the tyre can hold
            let lateral_speed = body.velocity_at(position).dot(right);
            let wanted = -lateral_speed * body.mass() / wheel_count;
            let impulse = wanted.clamp(-config::MAX_LATERAL_IMPULSE, config::MAX_LATERAL_IMPULSE);
            wheel.skidding = wanted.abs() > config::MAX_LATERAL_IMPULSE;
            body.apply_linear_impulse(right * impulse, position);
            if wheel.skidding {
                wheel.skidmarks.push(position);
                ctx.skidmarks.push(position);
            }

            body.apply_force_at(forward * drive_force * wheel.drive_factor, position);
            wheel_transforms.push((wheel.body, position, angle));
        }

        if self.limit_angle {
            let max_angle = config::MAX_ANGLE_FROM_NORTH.to_radians();
            let angle = normalize_angle(body.angle());
            if angle.abs() > max_angle {
                let position = body.position();
                body.set_transform(position, angle.clamp(-max_angle, max_angle));
                body.set_angular_velocity(0.0);
            }
        }

        for (handle, position, angle) in wheel_transforms {
            if let Some(wheel_body) = ctx.physics.body_mut(handle) {
                wheel_body.set_transform(position, angle);
            }
        }
        true
    }

    fn as_collidable_mut(&mut self) -> Option<&mut dyn Collidable> {
        Some(self)
    }

    fn on_removed(&mut self, physics: &mut dyn PhysicsEngine) {
        for wheel in &self.wheels {
            physics.destroy_body(wheel.body);
        }
        physics.destroy_body(self.body);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Collidable for Vehicle {
    fn begin_contact(&mut self, ctx: &mut WorldContext<'_>, _contact: &Contact, other: &Fixture) {
        match other.category {
            FixtureCategory::Mine => {
                self.broken = true;
                ctx.end_game(GameState::Broken);
            }
            FixtureCategory::FinishLine => ctx.end_game(GameState::Finished),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::physics::SimplePhysics;
    use assert_approx_eq::assert_approx_eq;

    fn setup() -> (SimplePhysics, Vehicle) {
        let mut physics = SimplePhysics::new();
        let vehicle = Vehicle::new(ObjectId(1), &mut physics, Vec2::new(5.0, 5.0)).with_default_wheels(&mut physics);
        (physics, vehicle)
    }

    fn run(vehicle: &mut Vehicle, physics: &mut SimplePhysics, state: &mut GameState, frames: usize) -> f32 {
        let mut skidmarks = RingBuffer::new(64);
        let mut score = 0.0;
        for _ in 0..frames {
            let mut ctx = WorldContext {
                physics: &mut *physics,
                skidmarks: &mut skidmarks,
                state: &mut *state,
                score: &mut score,
            };
            vehicle.act(&mut ctx, config::TIME_STEP);
            physics.step(config::TIME_STEP, config::VELOCITY_ITERATIONS, config::POSITION_ITERATIONS);
        }
        physics.body(vehicle.body()).unwrap().position().y
    }

    #[test]
    fn test_wheels_follow_body() {
        let (mut physics, mut vehicle) = setup();
        assert_eq!(vehicle.wheels().len(), 3);
        let mut state = GameState::Running;
        vehicle.set_accelerating(true);
        run(&mut vehicle, &mut physics, &mut state, 10);
        let body = physics.body(vehicle.body()).unwrap().clone();
        let wheel = &vehicle.wheels()[1];
        let wheel_position = physics.body(wheel.body()).unwrap().position();
        // Wheel bodies lag the vehicle by at most one step
        assert!((wheel_position - body.world_point(wheel.mount())).length() < 0.1);
    }

    #[test]
    fn test_accelerating_moves_forward() {
        let (mut physics, mut vehicle) = setup();
        let mut state = GameState::Running;
        vehicle.set_accelerating(true);
        let y = run(&mut vehicle, &mut physics, &mut state, 60);
        assert!(y > 5.5, "vehicle only reached y={}", y);
    }

    #[test]
    fn test_no_drive_once_game_ended() {
        let (mut physics, mut vehicle) = setup();
        let mut state = GameState::Finished;
        vehicle.set_accelerating(true);
        let y = run(&mut vehicle, &mut physics, &mut state, 60);
        assert_approx_eq!(y, 5.0);
    }

    #[test]
    fn test_turbo_expires() {
        let (mut physics, mut vehicle) = setup();
        let mut state = GameState::Running;
        vehicle.trigger_turbo();
        assert_approx_eq!(vehicle.turbo_time(), 0.0);
        run(&mut vehicle, &mut physics, &mut state, 6);
        assert!(vehicle.turbo_time() > 0.0);
        let frames = (config::TURBO_DURATION / config::TIME_STEP) as usize + 1;
        run(&mut vehicle, &mut physics, &mut state, frames);
        assert!(vehicle.turbo_time() < 0.0);
    }

    #[test]
    fn test_limit_angle() {
        let (mut physics, mut vehicle) = setup();
        vehicle.set_limit_angle(true);
        let body = physics.body_mut(vehicle.body()).unwrap();
        body.set_transform(Vec2::new(5.0, 5.0), 2.0);
        body.set_angular_velocity(3.0);
        let mut state = GameState::Running;
        run(&mut vehicle, &mut physics, &mut state, 1);
        let body = physics.body(vehicle.body()).unwrap();
        assert!(body.angle() <= config::MAX_ANGLE_FROM_NORTH.to_radians() + 0.1);
    }

    #[test]
    fn test_mine_contact_breaks_vehicle() {
        let (mut physics, mut vehicle) = setup();
        let mut state = GameState::Running;
        let mut skidmarks = RingBuffer::new(4);
        let mut score = 0.0;
        let mine = Fixture {
            body: vehicle.body(),
            category: FixtureCategory::Mine,
            sensor: true,
            user_data: None,
        };
        let contact = Contact {
            fixture_a: mine,
            fixture_b: mine,
            normal: Vec2::Y,
        };
        let mut ctx = WorldContext {
            physics: &mut physics,
            skidmarks: &mut skidmarks,
            state: &mut state,
            score: &mut score,
        };
        vehicle.begin_contact(&mut ctx, &contact, &mine);
        // A later finish does not override the first outcome
        let finish = Fixture {
            category: FixtureCategory::FinishLine,
            ..mine
        };
        vehicle.begin_contact(&mut ctx, &contact, &finish);
        assert!(vehicle.is_broken());
        assert_eq!(state, GameState::Broken);
    }
}
