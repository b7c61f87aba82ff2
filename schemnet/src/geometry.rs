//! Drawing-space geometry: positions, quantized coordinate keys, and the
//! symbol-placement transform that maps library pin offsets to absolute
//! schematic coordinates.

use serde::Serialize;

/// A point in schematic drawing space (mm, y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Mirror axis of a placed symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mirror {
    X,
    Y,
}

/// Canonical key for "same location" comparisons.
///
/// Coordinates are quantized to 0.01 mm so that floating-point drift from
/// transform composition cannot split a junction into two nodes. Stored as
/// integer hundredths, which also gives us `Eq`/`Hash`/`Ord` for free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CoordKey {
    cx: i64,
    cy: i64,
}

impl CoordKey {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            cx: quantize(x),
            cy: quantize(y),
        }
    }
}

impl From<Position> for CoordKey {
    fn from(p: Position) -> Self {
        CoordKey::new(p.x, p.y)
    }
}

fn quantize(v: f64) -> i64 {
    (v * 100.0).round() as i64
}

/// Absolute drawing-space position of a library pin on a placed symbol.
///
/// The pin offset is rotated by the symbol rotation, then mirrored, then
/// translated. The vertical translation subtracts because the drawing y axis
/// is inverted relative to standard trigonometric orientation.
pub fn pin_position(
    anchor: Position,
    rotation_deg: f64,
    mirror: Option<Mirror>,
    pin_offset: Position,
) -> Position {
    let theta = rotation_deg.to_radians();
    let mut rx = pin_offset.x * theta.cos() - pin_offset.y * theta.sin();
    let mut ry = pin_offset.x * theta.sin() + pin_offset.y * theta.cos();

    // Mirror applies after rotation; the order matters for rotated symbols.
    match mirror {
        Some(Mirror::X) => ry = -ry,
        Some(Mirror::Y) => rx = -rx,
        None => {}
    }

    Position::new(anchor.x + rx, anchor.y - ry)
}
