use macroquad::prelude::Vec2;

/// Linear interpolation between two f32 values
pub fn lerp(start: f32, end: f32, alpha: f32) -> f32 {
    start + (end - start) * alpha
}

/// Rotates `v` by `angle` radians, counter-clockwise
pub fn rotate(v: Vec2, angle: f32) -> Vec2 {
    let (sin, cos) = angle.sin_cos();
    Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

/// Wraps an angle in radians to (-PI, PI]
pub fn normalize_angle(angle: f32) -> f32 {
    use std::f32::consts::PI;
    let mut result = angle % (2.0 * PI);
    if result <= -PI {
        result += 2.0 * PI;
    } else if result > PI {
        result -= 2.0 * PI;
    }
    result
}
