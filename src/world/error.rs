use thiserror::Error;

/// Malformed map data, reported while the world is being set up
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WorldError {
    #[error("No start tile in the first row of the Centers layer")]
    NoStartTile,
    #[error("Unknown obstacle type '{0}'")]
    UnknownObstacleType(String),
}
