//! Configuration constants for the racing game.

// Simulation
pub const TIME_STEP: f32 = 1.0 / 60.0; // Fixed physics step, in seconds
pub const VELOCITY_ITERATIONS: u32 = 6;
pub const POSITION_ITERATIONS: u32 = 2;
pub const MAX_FRAME_TIME: f32 = 0.25; // Longer frames are clamped before accumulation
pub const SCORE_PER_METER: f32 = 20.0;
pub const SKIDMARK_CAPACITY: usize = 4000; // World-level trail length
pub const WHEEL_SKIDMARK_CAPACITY: usize = 200;
pub const LINEAR_DAMPING: f32 = 0.5; // Fraction of speed lost per second when no force acts
pub const ANGULAR_DAMPING: f32 = 2.0;

// World units
pub const UNIT_FOR_PIXEL: f32 = 1.0 / 20.0; // Meters per texture pixel
pub const VIEWPORT_WIDTH: f32 = 20.0; // Meters visible across the screen
pub const TILE_SIZE_PX: u32 = 64;
pub const WALL_SIZE: f32 = 1.0;

// Vehicle tuning
pub const VEHICLE_WIDTH: f32 = 1.2;
pub const VEHICLE_HEIGHT: f32 = 2.2;
pub const VEHICLE_DENSITY: f32 = 1.0;
pub const WHEEL_RADIUS: f32 = 0.25;
pub const WHEEL_BASE: f32 = 1.4; // Front to rear axle distance
pub const MAX_DRIVE_FORCE: f32 = 30.0;
pub const BRAKE_FORCE: f32 = 20.0;
pub const MAX_STEER_ANGLE: f32 = 30.0; // Degrees
pub const MAX_LATERAL_IMPULSE: f32 = 0.6; // Above this the wheel skids
pub const MAX_ANGLE_FROM_NORTH: f32 = 75.0; // Degrees, when angle limiting is on
pub const TURBO_DURATION: f32 = 0.5; // Seconds
pub const TURBO_FORCE_FACTOR: f32 = 2.5;

// Map objects
pub const MINE_RADIUS: f32 = 0.4;
pub const BONUS_RADIUS: f32 = 0.5;
pub const BONUS_SCORE: i32 = 500;
pub const ROCK_RADIUS: f32 = 0.7;

// Generated tracks
pub const TRACK_WIDTH_TILES: u32 = 6;
pub const TRACK_LENGTH_TILES: u32 = 60;
pub const OBSTACLE_CHANCE: f64 = 0.35; // Per tile row
pub const START_ROWS_CLEAR: u32 = 3; // No obstacles near the start line

// UI
pub const UI_UNIT_FOR_PIXEL: f32 = 2.0; // UI units per atlas pixel
pub const WINDOW_WIDTH: i32 = 800;
pub const WINDOW_HEIGHT: i32 = 600;

// Stats
pub const RECORD_COUNT: usize = 3; // Best results kept per category
