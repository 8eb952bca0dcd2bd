use crate::config::{VIEWPORT_WIDTH, WINDOW_HEIGHT, WINDOW_WIDTH};
use crate::ui::actor::Drawable;
use crate::ui::anchor::{Anchor, Align};
use crate::ui::{ActorId, ActorKind, UiTree};
use crate::utils;
use crate::world::physics::{Body, FixtureCategory, Shape};
use crate::world::{GameWorld, PhysicsEngine, Vehicle};
use macroquad::prelude::*;

const TRACK_COLOR: Color = Color::new(0.35, 0.55, 0.3, 1.0);
const SKIDMARK_COLOR: Color = Color::new(0.1, 0.1, 0.1, 0.35);
const SKIDMARK_RADIUS: f32 = 0.08;
const FLAME_LENGTH: f32 = 0.8;
const UI_FONT_SIZE: f32 = 20.0;
/// How far ahead of the vehicle the camera looks, in meters
const CAMERA_LOOK_AHEAD: f32 = 4.0;

fn faded_color(mut color: Color, alpha: f32) -> Color {
    color.a *= alpha;
    color
}

fn brighten_color(color: Color, amount: f32) -> Color {
    Color::new(
        (color.r + amount).min(1.0),
        (color.g + amount).min(1.0),
        (color.b + amount).min(1.0),
        color.a,
    )
}

fn category_color(category: FixtureCategory) -> Color {
    match category {
        FixtureCategory::Vehicle => RED,
        FixtureCategory::Wheel => BLACK,
        FixtureCategory::Wall => DARKGRAY,
        FixtureCategory::Rock => GRAY,
        FixtureCategory::Mine => Color::new(0.6, 0.1, 0.1, 1.0),
        FixtureCategory::Bonus => GOLD,
        FixtureCategory::FinishLine => faded_color(WHITE, 0.8),
    }
}

/// Draws the world with a camera following the vehicle, and the UI in
/// window coordinates on top of it
pub struct Renderer {
    camera_target: Vec2,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            camera_target: Vec2::ZERO,
        }
    }

    fn world_camera(&self) -> Camera2D {
        let aspect = screen_width() / screen_height();
        Camera2D {
            target: self.camera_target,
            // Positive y zoom keeps world y pointing up
            zoom: vec2(2.0 / VIEWPORT_WIDTH, 2.0 * aspect / VIEWPORT_WIDTH),
            ..Default::default()
        }
    }

    pub fn draw_world<P: PhysicsEngine + 'static>(&mut self, world: &GameWorld<P>) {
        clear_background(TRACK_COLOR);
        if let Some(position) = world.vehicle_position() {
            self.camera_target = vec2(VIEWPORT_WIDTH / 2.0, position.y + CAMERA_LOOK_AHEAD);
        }
        set_camera(&self.world_camera());

        for mark in world.skidmarks().iter() {
            draw_circle(mark.x, mark.y, SKIDMARK_RADIUS, SKIDMARK_COLOR);
        }
        for body in world.physics().bodies() {
            let category = body.fixture().category;
            // The vehicle is drawn last, on top of everything
            if matches!(category, FixtureCategory::Vehicle | FixtureCategory::Wheel) {
                continue;
            }
            if world.is_visible(body.position().y) {
                draw_body(body, category_color(category));
            }
        }
        if let Some(vehicle) = world.vehicle() {
            draw_vehicle(world.physics(), vehicle);
        }

        set_default_camera();
    }

    pub fn draw_ui(&self, tree: &UiTree, roots: &[ActorId]) {
        for &root in roots {
            self.draw_actor(tree, root);
        }
    }

    fn draw_actor(&self, tree: &UiTree, id: ActorId) {
        let actor = tree.get(id);
        if !actor.visible {
            return;
        }
        let scale = vec2(
            screen_width() / WINDOW_WIDTH as f32,
            screen_height() / WINDOW_HEIGHT as f32,
        );
        let bottom_left = tree.local_to_stage(id, Vec2::ZERO);
        // UI y grows up, the screen grows down
        let rect = Rect::new(
            bottom_left.x * scale.x,
            screen_height() - (bottom_left.y + actor.height) * scale.y,
            actor.width * scale.x,
            actor.height * scale.y,
        );
        let color = actor.color;

        match &actor.kind {
            ActorKind::Image { drawable: Some(drawable) } => draw_drawable(drawable, rect, color),
            ActorKind::Label { text, align, .. } => {
                draw_aligned_text(text, rect, align.unwrap_or(Align(Anchor::TopLeft)), color);
            }
            ActorKind::TextButton { text, .. } => {
                draw_rectangle(rect.x, rect.y, rect.w, rect.h, faded_color(DARKGRAY, color.a));
                draw_rectangle_lines(rect.x, rect.y, rect.w, rect.h, 2.0, color);
                draw_aligned_text(text, rect, Align(Anchor::Center), color);
            }
            ActorKind::CheckBox { text, checked, .. } => {
                let side = rect.h.min(UI_FONT_SIZE);
                let y = rect.y + (rect.h - side) / 2.0;
                draw_rectangle_lines(rect.x, y, side, side, 2.0, color);
                if *checked {
                    draw_rectangle(rect.x + 4.0, y + 4.0, side - 8.0, side - 8.0, color);
                }
                let label = Rect::new(rect.x + side + 6.0, rect.y, rect.w - side - 6.0, rect.h);
                draw_aligned_text(text, label, Align(Anchor::CenterLeft), color);
            }
            _ => {}
        }
        if tree.is_debug(id) {
            draw_rectangle_lines(rect.x, rect.y, rect.w, rect.h, 1.0, LIME);
        }

        for &child in actor.children() {
            self.draw_actor(tree, child);
        }
    }

    pub fn window_should_close() -> bool {
        is_key_down(KeyCode::Escape) || is_quit_requested()
    }

    pub fn is_key_down(key: KeyCode) -> bool {
        is_key_down(key)
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

fn draw_body(body: &Body, color: Color) {
    let position = body.position();
    match body.shape() {
        Shape::Circle { radius } => draw_circle(position.x, position.y, radius, color),
        Shape::Box {
            half_width,
            half_height,
        } => draw_rectangle_ex(
            position.x,
            position.y,
            half_width * 2.0,
            half_height * 2.0,
            DrawRectangleParams {
                offset: vec2(0.5, 0.5),
                rotation: body.angle(),
                color,
            },
        ),
    }
}

fn draw_vehicle(physics: &dyn PhysicsEngine, vehicle: &Vehicle) {
    for wheel in vehicle.wheels() {
        for mark in wheel.skidmarks().iter() {
            draw_circle(mark.x, mark.y, SKIDMARK_RADIUS, SKIDMARK_COLOR);
        }
    }
    for wheel in vehicle.wheels() {
        if let Some(body) = physics.body(wheel.body()) {
            draw_body(body, category_color(FixtureCategory::Wheel));
        }
    }
    let Some(body) = physics.body(vehicle.body()) else {
        return;
    };
    let color = if vehicle.is_broken() {
        DARKGRAY
    } else {
        category_color(FixtureCategory::Vehicle)
    };
    draw_body(body, color);

    if vehicle.turbo_time() >= 0.0 {
        // Flame grows out of the rear of the body
        let rear = body.position() + utils::rotate(Vec2::new(0.0, -vehicle.height() / 2.0), body.angle());
        let tip = rear + utils::rotate(Vec2::new(0.0, -FLAME_LENGTH), body.angle());
        let side = utils::rotate(Vec2::new(vehicle.width() / 4.0, 0.0), body.angle());
        draw_triangle(rear - side, rear + side, tip, ORANGE);
        draw_triangle(rear - side * 0.5, rear + side * 0.5, (rear + tip) / 2.0, brighten_color(YELLOW, 0.2));
    }
}

fn draw_drawable(drawable: &Drawable, rect: Rect, color: Color) {
    match drawable {
        Drawable::Region(_) | Drawable::Tiled(_) => draw_rectangle(rect.x, rect.y, rect.w, rect.h, color),
        Drawable::NinePatch(patch) => {
            draw_rectangle(rect.x, rect.y, rect.w, rect.h, faded_color(color, 0.8));
            let border = patch.left.max(patch.top) as f32 / 2.0;
            draw_rectangle_lines(rect.x, rect.y, rect.w, rect.h, border, brighten_color(color, 0.3));
        }
    }
}

fn draw_aligned_text(text: &str, rect: Rect, align: Align, color: Color) {
    let lines: Vec<&str> = text.lines().collect();
    if lines.is_empty() {
        return;
    }
    let line_height = UI_FONT_SIZE;
    let block_height = line_height * lines.len() as f32;
    // Screen y grows down, so the top aligned block starts at rect.y
    let top = rect.y + (rect.h - block_height) * (1.0 - align.0.v_percent());
    for (index, line) in lines.iter().enumerate() {
        let size = measure_text(line, None, UI_FONT_SIZE as u16, 1.0);
        let x = rect.x + (rect.w - size.width) * align.0.h_percent();
        let baseline = top + line_height * index as f32 + size.offset_y;
        draw_text(line, x, baseline, UI_FONT_SIZE, color);
    }
}
