pub mod assets;
pub mod config;
pub mod game;
pub mod logging;
pub mod render;
pub mod stats;
pub mod ui;
pub mod utils;
pub mod world;
