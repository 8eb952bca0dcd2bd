//! Track description: tile grid, the `Centers` layer marking the road
//! and the obstacle layer. Pixel coordinates grow to the right and up,
//! row 0 is the start of the track.

use crate::config;
use macroquad::prelude::Vec2;
use rand::prelude::*;
use rand::rngs::StdRng;

/// One entry of the obstacle layer, in pixels. `x`/`y` is the lower-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct MapObject {
    pub kind: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl MapObject {
    pub fn new(kind: impl Into<String>, x: f32, y: f32, width: f32, height: f32) -> Self {
        MapObject {
            kind: kind.into(),
            x,
            y,
            width,
            height,
        }
    }

    /// Center in world meters
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0) * config::UNIT_FOR_PIXEL
    }

    /// Size in world meters
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height) * config::UNIT_FOR_PIXEL
    }
}

#[derive(Debug, Clone)]
pub struct MapInfo {
    width: u32,
    height: u32,
    tile_size: u32,
    centers: Vec<Option<u32>>,
    obstacles: Vec<MapObject>,
}

impl MapInfo {
    pub fn new(width: u32, height: u32, tile_size: u32) -> Self {
        MapInfo {
            width,
            height,
            tile_size,
            centers: vec![None; (width * height) as usize],
            obstacles: Vec::new(),
        }
    }

    /// Width in tiles
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in tiles
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn width_in_meters(&self) -> f32 {
        (self.width * self.tile_size) as f32 * config::UNIT_FOR_PIXEL
    }

    pub fn height_in_meters(&self) -> f32 {
        (self.height * self.tile_size) as f32 * config::UNIT_FOR_PIXEL
    }

    pub fn set_center(&mut self, tx: u32, ty: u32, tile: u32) {
        if tx < self.width && ty < self.height {
            self.centers[(ty * self.width + tx) as usize] = Some(tile);
        }
    }

    pub fn center(&self, tx: u32, ty: u32) -> Option<u32> {
        if tx < self.width && ty < self.height {
            self.centers[(ty * self.width + tx) as usize]
        } else {
            None
        }
    }

    /// World position of the first road tile in row 0, one tile up from
    /// the bottom edge
    pub fn find_start_tile_position(&self) -> Option<Vec2> {
        let tx = (0..self.width).find(|&tx| self.center(tx, 0).is_some())?;
        let tile = self.tile_size as f32;
        Some(Vec2::new(tx as f32 * tile + tile / 2.0, tile) * config::UNIT_FOR_PIXEL)
    }

    pub fn add_obstacle(&mut self, object: MapObject) {
        self.obstacles.push(object);
    }

    pub fn obstacles(&self) -> &[MapObject] {
        &self.obstacles
    }

    /// Builds a random track of `length` rows. The same seed always gives
    /// the same track.
    pub fn generate(seed: u64, length: u32) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let width = config::TRACK_WIDTH_TILES;
        let length = length.max(config::START_ROWS_CLEAR + 2);
        let tile = config::TILE_SIZE_PX as f32;
        let mut map = MapInfo::new(width, length, config::TILE_SIZE_PX);

        // The road center drifts by at most one column per row
        let mut column = width / 2;
        for row in 0..length {
            map.set_center(column, row, 1);
            let step: i32 = rng.gen_range(-1..=1);
            column = (column as i32 + step).clamp(1, width as i32 - 2) as u32;
        }

        for row in config::START_ROWS_CLEAR..length - 1 {
            if !rng.gen_bool(config::OBSTACLE_CHANCE) {
                continue;
            }
            let kind = match rng.gen_range(0..10) {
                0..=3 => "mine",
                4..=6 => "bonus",
                7..=8 => "rock",
                _ => "wall",
            };
            let x = rng.gen_range(0.0..(width as f32 - 1.0) * tile);
            let y = row as f32 * tile + rng.gen_range(0.0..tile / 2.0);
            let (w, h) = if kind == "wall" { (tile, tile / 4.0) } else { (tile / 2.0, tile / 2.0) };
            map.add_obstacle(MapObject::new(kind, x, y, w, h));
        }

        let finish_y = (length - 1) as f32 * tile;
        map.add_obstacle(MapObject::new("finish", 0.0, finish_y, width as f32 * tile, tile / 4.0));
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_start_tile_is_first_center_of_row_zero() {
        let mut map = MapInfo::new(4, 3, 64);
        map.set_center(3, 0, 1);
        map.set_center(2, 0, 1);
        map.set_center(0, 1, 1);
        let start = map.find_start_tile_position().unwrap();
        assert_approx_eq!(start.x, (2.0 * 64.0 + 32.0) * config::UNIT_FOR_PIXEL);
        assert_approx_eq!(start.y, 64.0 * config::UNIT_FOR_PIXEL);
    }

    #[test]
    fn test_no_start_tile() {
        let mut map = MapInfo::new(4, 3, 64);
        map.set_center(1, 2, 1);
        assert!(map.find_start_tile_position().is_none());
    }

    #[test]
    fn test_object_center_in_meters() {
        let object = MapObject::new("mine", 20.0, 40.0, 20.0, 20.0);
        let center = object.center();
        assert_approx_eq!(center.x, 30.0 * config::UNIT_FOR_PIXEL);
        assert_approx_eq!(center.y, 50.0 * config::UNIT_FOR_PIXEL);
    }

    #[test]
    fn test_generate_is_deterministic() {
        let a = MapInfo::generate(42, 20);
        let b = MapInfo::generate(42, 20);
        assert_eq!(a.obstacles(), b.obstacles());
        assert!(a.find_start_tile_position().is_some());
        assert_eq!(a.obstacles().last().map(|o| o.kind.as_str()), Some("finish"));
        for row in 0..a.height() {
            assert_eq!((0..a.width()).filter(|&tx| a.center(tx, row).is_some()).count(), 1);
        }
        // Nothing placed on the start rows
        let clear = (config::START_ROWS_CLEAR * config::TILE_SIZE_PX) as f32;
        assert!(a.obstacles().iter().all(|o| o.y >= clear));
    }
}
