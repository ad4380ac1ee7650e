use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Measured bounds of the reference container, in the container's own
/// coordinate space (origin at its top-left corner).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContainerBounds {
    pub width: f32,
    pub height: f32,
}

impl ContainerBounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Picks a uniformly random top-left position for a control of `footprint`
/// size inside `bounds`, keeping `margin` clear of the edges. A container
/// smaller than the control collapses the range to a single point at the
/// origin rather than producing a negative span.
pub fn random_position_within<R: Rng>(
    bounds: ContainerBounds,
    footprint: Size,
    margin: f32,
    rng: &mut R,
) -> Point {
    let max_x = (bounds.width - footprint.width - margin).max(0.0);
    let max_y = (bounds.height - footprint.height - margin).max(0.0);
    Point {
        x: rng.gen::<f32>() * max_x,
        y: rng.gen::<f32>() * max_y,
    }
}

#[cfg(test)]
#[path = "tests/geometry_tests.rs"]
mod tests;
