//! Physics collaborator.
//!
//! The world only talks to a `PhysicsEngine`. `SimplePhysics` is the small
//! engine shipped with the game: Euler integration with damping,
//! circle/box overlap tests, push-out resolution and begin/end contact
//! events. It has no joints; vehicles move their wheel bodies themselves.

use super::game_object::ObjectId;
use crate::utils::rotate;
use macroquad::prelude::Vec2;
use std::collections::HashSet;

const RESTITUTION: f32 = 0.2;
const POSITION_CORRECTION: f32 = 0.8;
const MIN_MASS: f32 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyType {
    Static,
    /// Moved only through its velocity or `set_transform`
    Kinematic,
    Dynamic,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Circle { radius: f32 },
    Box { half_width: f32, half_height: f32 },
}

impl Shape {
    fn area(self) -> f32 {
        match self {
            Shape::Circle { radius } => std::f32::consts::PI * radius * radius,
            Shape::Box {
                half_width,
                half_height,
            } => 4.0 * half_width * half_height,
        }
    }
}

/// What a fixture represents, used by collidable objects to react
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FixtureCategory {
    Vehicle,
    Wheel,
    Wall,
    Rock,
    Mine,
    Bonus,
    FinishLine,
}

/// The collision part of a body, as seen by contact listeners
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fixture {
    pub body: BodyHandle,
    pub category: FixtureCategory,
    pub sensor: bool,
    /// Game object owning the body, if any
    pub user_data: Option<ObjectId>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyDef {
    pub body_type: BodyType,
    pub position: Vec2,
    pub angle: f32,
    pub shape: Shape,
    pub category: FixtureCategory,
    pub sensor: bool,
    pub density: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub user_data: Option<ObjectId>,
}

impl BodyDef {
    pub fn new(body_type: BodyType, position: Vec2, shape: Shape, category: FixtureCategory) -> Self {
        BodyDef {
            body_type,
            position,
            angle: 0.0,
            shape,
            category,
            sensor: false,
            density: 1.0,
            linear_damping: 0.0,
            angular_damping: 0.0,
            user_data: None,
        }
    }

    pub fn angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    pub fn sensor(mut self) -> Self {
        self.sensor = true;
        self
    }

    pub fn density(mut self, density: f32) -> Self {
        self.density = density;
        self
    }

    pub fn damping(mut self, linear: f32, angular: f32) -> Self {
        self.linear_damping = linear;
        self.angular_damping = angular;
        self
    }

    pub fn user_data(mut self, id: ObjectId) -> Self {
        self.user_data = Some(id);
        self
    }
}

#[derive(Debug, Clone)]
pub struct Body {
    handle: BodyHandle,
    body_type: BodyType,
    position: Vec2,
    angle: f32,
    linear_velocity: Vec2,
    angular_velocity: f32,
    force: Vec2,
    torque: f32,
    shape: Shape,
    category: FixtureCategory,
    sensor: bool,
    mass: f32,
    inertia: f32,
    linear_damping: f32,
    angular_damping: f32,
    user_data: Option<ObjectId>,
}

impl Body {
    fn new(handle: BodyHandle, def: BodyDef) -> Self {
        let mass = (def.density * def.shape.area()).max(MIN_MASS);
        let inertia = match def.shape {
            Shape::Circle { radius } => mass * radius * radius / 2.0,
            Shape::Box {
                half_width,
                half_height,
            } => mass * (half_width * half_width + half_height * half_height) / 3.0,
        };
        Body {
            handle,
            body_type: def.body_type,
            position: def.position,
            angle: def.angle,
            linear_velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            force: Vec2::ZERO,
            torque: 0.0,
            shape: def.shape,
            category: def.category,
            sensor: def.sensor,
            mass,
            inertia,
            linear_damping: def.linear_damping,
            angular_damping: def.angular_damping,
            user_data: def.user_data,
        }
    }

    pub fn handle(&self) -> BodyHandle {
        self.handle
    }

    pub fn body_type(&self) -> BodyType {
        self.body_type
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn linear_velocity(&self) -> Vec2 {
        self.linear_velocity
    }

    pub fn set_linear_velocity(&mut self, velocity: Vec2) {
        self.linear_velocity = velocity;
    }

    pub fn angular_velocity(&self) -> f32 {
        self.angular_velocity
    }

    pub fn set_angular_velocity(&mut self, velocity: f32) {
        self.angular_velocity = velocity;
    }

    pub fn set_transform(&mut self, position: Vec2, angle: f32) {
        self.position = position;
        self.angle = angle;
    }

    pub fn fixture(&self) -> Fixture {
        Fixture {
            body: self.handle,
            category: self.category,
            sensor: self.sensor,
            user_data: self.user_data,
        }
    }

    /// Converts a body-local vector to world orientation
    pub fn world_vector(&self, local: Vec2) -> Vec2 {
        rotate(local, self.angle)
    }

    pub fn world_point(&self, local: Vec2) -> Vec2 {
        self.position + rotate(local, self.angle)
    }

    /// Velocity of a world point attached to the body
    pub fn velocity_at(&self, point: Vec2) -> Vec2 {
        let r = point - self.position;
        self.linear_velocity + Vec2::new(-self.angular_velocity * r.y, self.angular_velocity * r.x)
    }

    fn is_dynamic(&self) -> bool {
        self.body_type == BodyType::Dynamic
    }

    fn inverse_mass(&self) -> f32 {
        if self.is_dynamic() { 1.0 / self.mass } else { 0.0 }
    }

    pub fn apply_force(&mut self, force: Vec2) {
        if self.is_dynamic() {
            self.force += force;
        }
    }

    pub fn apply_force_at(&mut self, force: Vec2, point: Vec2) {
        if self.is_dynamic() {
            self.force += force;
            self.torque += (point - self.position).perp_dot(force);
        }
    }

    pub fn apply_linear_impulse(&mut self, impulse: Vec2, point: Vec2) {
        if self.is_dynamic() {
            self.linear_velocity += impulse / self.mass;
            self.angular_velocity += (point - self.position).perp_dot(impulse) / self.inertia;
        }
    }

    fn integrate(&mut self, dt: f32) {
        match self.body_type {
            BodyType::Static => return,
            BodyType::Kinematic => {}
            BodyType::Dynamic => {
                self.linear_velocity += self.force / self.mass * dt;
                self.angular_velocity += self.torque / self.inertia * dt;
                self.linear_velocity *= 1.0 / (1.0 + dt * self.linear_damping);
                self.angular_velocity *= 1.0 / (1.0 + dt * self.angular_damping);
            }
        }
        self.position += self.linear_velocity * dt;
        self.angle += self.angular_velocity * dt;
        self.force = Vec2::ZERO;
        self.torque = 0.0;
    }
}

/// A touching pair of fixtures. `normal` points from `fixture_a` to `fixture_b`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub fixture_a: Fixture,
    pub fixture_b: Fixture,
    pub normal: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContactEvent {
    Begin(Contact),
    End(Contact),
}

pub trait PhysicsEngine {
    fn create_body(&mut self, def: BodyDef) -> BodyHandle;
    fn destroy_body(&mut self, handle: BodyHandle);
    fn body(&self, handle: BodyHandle) -> Option<&Body>;
    fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut Body>;
    fn bodies(&self) -> Box<dyn Iterator<Item = &Body> + '_>;
    /// Advances the simulation by `time_step` seconds
    fn step(&mut self, time_step: f32, velocity_iterations: u32, position_iterations: u32);
    /// Contact events produced since the last call, in order
    fn drain_contact_events(&mut self) -> Vec<ContactEvent>;
}

#[derive(Debug, Default)]
pub struct SimplePhysics {
    bodies: Vec<Option<Body>>,
    touching: HashSet<(BodyHandle, BodyHandle)>,
    events: Vec<ContactEvent>,
}

impl SimplePhysics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn body_count(&self) -> usize {
        self.bodies.iter().flatten().count()
    }

    fn pair_mut(&mut self, i: usize, j: usize) -> Option<(&mut Body, &mut Body)> {
        let (left, right) = self.bodies.split_at_mut(j);
        Some((left[i].as_mut()?, right[0].as_mut()?))
    }

    fn resolve_velocities(&mut self, pairs: &[(usize, usize, Vec2, f32)]) {
        for &(i, j, normal, _) in pairs {
            let Some((a, b)) = self.pair_mut(i, j) else { continue };
            let inverse_mass = a.inverse_mass() + b.inverse_mass();
            let approaching = (b.linear_velocity - a.linear_velocity).dot(normal);
            if approaching >= 0.0 || inverse_mass == 0.0 {
                continue;
            }
            let impulse = -(1.0 + RESTITUTION) * approaching / inverse_mass;
            a.linear_velocity -= normal * impulse * a.inverse_mass();
            b.linear_velocity += normal * impulse * b.inverse_mass();
        }
    }

    fn resolve_positions(&mut self, pairs: &[(usize, usize, Vec2, f32)]) {
        for &(i, j, _, _) in pairs {
            let Some((a, b)) = self.pair_mut(i, j) else { continue };
            // Depth changes as earlier pairs move bodies
            let Some((normal, depth)) = collide(a, b) else { continue };
            let inverse_mass = a.inverse_mass() + b.inverse_mass();
            if inverse_mass == 0.0 {
                continue;
            }
            let correction = normal * (depth * POSITION_CORRECTION / inverse_mass);
            a.position -= correction * a.inverse_mass();
            b.position += correction * b.inverse_mass();
        }
    }

    fn update_contacts(&mut self) {
        let mut touching = HashSet::new();
        for (i, a) in self.bodies.iter().enumerate() {
            let Some(a) = a else { continue };
            for b in self.bodies[i + 1..].iter().flatten() {
                if a.body_type == BodyType::Static && b.body_type == BodyType::Static {
                    continue;
                }
                if let Some((normal, _)) = collide(a, b) {
                    let key = (a.handle, b.handle);
                    touching.insert(key);
                    if !self.touching.contains(&key) {
                        self.events.push(ContactEvent::Begin(Contact {
                            fixture_a: a.fixture(),
                            fixture_b: b.fixture(),
                            normal,
                        }));
                    }
                }
            }
        }
        let mut ended: Vec<_> = self.touching.difference(&touching).copied().collect();
        ended.sort();
        for (a, b) in ended {
            let contact = match (self.body(a), self.body(b)) {
                (Some(body_a), Some(body_b)) => Contact {
                    fixture_a: body_a.fixture(),
                    fixture_b: body_b.fixture(),
                    normal: (body_b.position - body_a.position).normalize_or_zero(),
                },
                _ => continue,
            };
            self.events.push(ContactEvent::End(contact));
        }
        self.touching = touching;
    }
}

impl PhysicsEngine for SimplePhysics {
    fn create_body(&mut self, def: BodyDef) -> BodyHandle {
        let handle = BodyHandle(self.bodies.len());
        self.bodies.push(Some(Body::new(handle, def)));
        handle
    }

    fn destroy_body(&mut self, handle: BodyHandle) {
        if let Some(slot) = self.bodies.get_mut(handle.0) {
            *slot = None;
        }
        self.touching.retain(|(a, b)| *a != handle && *b != handle);
    }

    fn body(&self, handle: BodyHandle) -> Option<&Body> {
        self.bodies.get(handle.0)?.as_ref()
    }

    fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut Body> {
        self.bodies.get_mut(handle.0)?.as_mut()
    }

    fn bodies(&self) -> Box<dyn Iterator<Item = &Body> + '_> {
        Box::new(self.bodies.iter().flatten())
    }

    fn step(&mut self, time_step: f32, velocity_iterations: u32, position_iterations: u32) {
        for body in self.bodies.iter_mut().flatten() {
            body.integrate(time_step);
        }

        // Solid pairs with at least one dynamic body
        let mut pairs = Vec::new();
        for (i, a) in self.bodies.iter().enumerate() {
            let Some(a) = a else { continue };
            for (offset, b) in self.bodies[i + 1..].iter().enumerate() {
                let Some(b) = b else { continue };
                if a.sensor || b.sensor || !(a.is_dynamic() || b.is_dynamic()) {
                    continue;
                }
                if let Some((normal, depth)) = collide(a, b) {
                    pairs.push((i, i + 1 + offset, normal, depth));
                }
            }
        }
        for _ in 0..velocity_iterations {
            self.resolve_velocities(&pairs);
        }
        for _ in 0..position_iterations {
            self.resolve_positions(&pairs);
        }

        self.update_contacts();
    }

    fn drain_contact_events(&mut self) -> Vec<ContactEvent> {
        std::mem::take(&mut self.events)
    }
}

/// Overlap test. Returns the normal from `a` to `b` and the penetration depth.
fn collide(a: &Body, b: &Body) -> Option<(Vec2, f32)> {
    match (a.shape, b.shape) {
        (Shape::Circle { radius: ra }, Shape::Circle { radius: rb }) => {
            let delta = b.position - a.position;
            let distance = delta.length();
            let reach = ra + rb;
            if distance >= reach {
                return None;
            }
            let normal = if distance > f32::EPSILON { delta / distance } else { Vec2::Y };
            Some((normal, reach - distance))
        }
        (
            Shape::Box {
                half_width,
                half_height,
            },
            Shape::Circle { radius },
        ) => box_circle(a, Vec2::new(half_width, half_height), b.position, radius),
        (
            Shape::Circle { radius },
            Shape::Box {
                half_width,
                half_height,
            },
        ) => box_circle(b, Vec2::new(half_width, half_height), a.position, radius)
            .map(|(normal, depth)| (-normal, depth)),
        (
            Shape::Box {
                half_width: aw,
                half_height: ah,
            },
            Shape::Box {
                half_width: bw,
                half_height: bh,
            },
        ) => box_box(a, Vec2::new(aw, ah), b, Vec2::new(bw, bh)),
    }
}

fn box_circle(body: &Body, half: Vec2, center: Vec2, radius: f32) -> Option<(Vec2, f32)> {
    let local = rotate(center - body.position, -body.angle);
    let clamped = local.clamp(-half, half);
    let outside = local - clamped;
    let distance = outside.length();
    if distance > f32::EPSILON {
        if distance >= radius {
            return None;
        }
        return Some((body.world_vector(outside / distance), radius - distance));
    }
    // Center inside the box: leave through the nearest face
    let to_x = half.x - local.x.abs();
    let to_y = half.y - local.y.abs();
    let (normal, depth) = if to_x < to_y {
        (Vec2::new(local.x.signum(), 0.0), to_x + radius)
    } else {
        (Vec2::new(0.0, local.y.signum()), to_y + radius)
    };
    Some((body.world_vector(normal), depth))
}

fn box_box(a: &Body, a_half: Vec2, b: &Body, b_half: Vec2) -> Option<(Vec2, f32)> {
    let a_axes = [a.world_vector(Vec2::X), a.world_vector(Vec2::Y)];
    let b_axes = [b.world_vector(Vec2::X), b.world_vector(Vec2::Y)];
    let delta = b.position - a.position;
    let mut best: Option<(Vec2, f32)> = None;
    for axis in a_axes.iter().chain(b_axes.iter()).copied() {
        let extent = |axes: &[Vec2; 2], half: Vec2| {
            half.x * axes[0].dot(axis).abs() + half.y * axes[1].dot(axis).abs()
        };
        let distance = delta.dot(axis);
        let overlap = extent(&a_axes, a_half) + extent(&b_axes, b_half) - distance.abs();
        if overlap <= 0.0 {
            return None;
        }
        if best.is_none_or(|(_, depth)| overlap < depth) {
            let normal = if distance < 0.0 { -axis } else { axis };
            best = Some((normal, overlap));
        }
    }
    best
}
