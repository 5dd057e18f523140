//! Fixed vertex tables for the shapes both games draw.
//!
//! Every builder returns plain [`Geometry`]; uploading is left to the caller.

use crate::geometry::{ColorSource, Geometry, GeometryError, Topology};

/// Angular width of one fan slice, in degrees.
const SLICE_DEG: f32 = 15.0;
/// Fan slices run from `1 * SLICE_DEG` to `(FAN_SLICES + 1) * SLICE_DEG`.
const FAN_SLICES: u32 = 26;

/// Triangle-fan disc of radius 1 around the origin, as a triangle list.
///
/// The fan starts at 15° and covers 26 slices, leaving a notch between 0°
/// and 15°. Returns positions only.
fn fan() -> Vec<[f32; 3]> {
    (1..=FAN_SLICES)
        .flat_map(|k| {
            let a = (k as f32 * SLICE_DEG).to_radians();
            let b = ((k + 1) as f32 * SLICE_DEG).to_radians();
            [
                [0.0, 0.0, 0.0],
                [a.cos(), a.sin(), 0.0],
                [b.cos(), b.sin(), 0.0],
            ]
        })
        .collect()
}

/// Disc used for coins and the projectile, shaded by its own coordinates.
pub fn circle() -> Result<Geometry, GeometryError> {
    let positions = fan();
    let colors = positions.iter().map(|&[x, y, _]| [x, y, 0.0]).collect();
    Geometry::new(Topology::Triangles, positions, ColorSource::PerVertex(colors))
}

/// Cannon: the disc plus a barrel 2 long and 0.5 wide along +X, all white.
pub fn canon() -> Result<Geometry, GeometryError> {
    let mut positions = fan();
    positions.extend_from_slice(&[
        [0.0, 0.25, 0.0],
        [2.0, 0.25, 0.0],
        [2.0, -0.25, 0.0],
        [0.0, 0.25, 0.0],
        [0.0, -0.25, 0.0],
        [2.0, -0.25, 0.0],
    ]);
    Geometry::new(Topology::Triangles, positions, ColorSource::Uniform([1.0; 3]))
}

/// Unit square centered on the origin, used for the walls.
pub fn rectangle() -> Result<Geometry, GeometryError> {
    let positions = vec![
        [-0.5, -0.5, 0.0],
        [0.5, -0.5, 0.0],
        [0.5, 0.5, 0.0],
        [-0.5, -0.5, 0.0],
        [-0.5, 0.5, 0.0],
        [0.5, 0.5, 0.0],
    ];
    let colors = vec![
        [1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 1.0],
        [1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0],
        [0.0, 0.0, 1.0],
    ];
    Geometry::new(Topology::Triangles, positions, ColorSource::PerVertex(colors))
}

#[rustfmt::skip]
const CUBE_POSITIONS: [[f32; 3]; 36] = [
    [-1.0, -1.0, -1.0], [-1.0, -1.0,  1.0], [-1.0,  1.0,  1.0],
    [ 1.0,  1.0, -1.0], [-1.0, -1.0, -1.0], [-1.0,  1.0, -1.0],
    [ 1.0, -1.0,  1.0], [-1.0, -1.0, -1.0], [ 1.0, -1.0, -1.0],
    [ 1.0,  1.0, -1.0], [ 1.0, -1.0, -1.0], [-1.0, -1.0, -1.0],
    [-1.0, -1.0, -1.0], [-1.0,  1.0,  1.0], [-1.0,  1.0, -1.0],
    [ 1.0, -1.0,  1.0], [-1.0, -1.0,  1.0], [-1.0, -1.0, -1.0],
    [-1.0,  1.0,  1.0], [-1.0, -1.0,  1.0], [ 1.0, -1.0,  1.0],
    [ 1.0,  1.0,  1.0], [ 1.0, -1.0, -1.0], [ 1.0,  1.0, -1.0],
    [ 1.0, -1.0, -1.0], [ 1.0,  1.0,  1.0], [ 1.0, -1.0,  1.0],
    [ 1.0,  1.0,  1.0], [ 1.0,  1.0, -1.0], [-1.0,  1.0, -1.0],
    [ 1.0,  1.0,  1.0], [-1.0,  1.0, -1.0], [-1.0,  1.0,  1.0],
    [ 1.0,  1.0,  1.0], [-1.0,  1.0,  1.0], [ 1.0, -1.0,  1.0],
];

#[rustfmt::skip]
const CUBE_COLORS: [[f32; 3]; 36] = [
    [0.583, 0.771, 0.014], [0.609, 0.115, 0.436], [0.327, 0.483, 0.844],
    [0.822, 0.569, 0.201], [0.435, 0.602, 0.223], [0.310, 0.747, 0.185],
    [0.597, 0.770, 0.761], [0.559, 0.436, 0.730], [0.359, 0.583, 0.152],
    [0.483, 0.596, 0.789], [0.559, 0.861, 0.639], [0.195, 0.548, 0.859],
    [0.014, 0.184, 0.576], [0.771, 0.328, 0.970], [0.406, 0.615, 0.116],
    [0.676, 0.977, 0.133], [0.971, 0.572, 0.833], [0.140, 0.616, 0.489],
    [0.997, 0.513, 0.064], [0.945, 0.719, 0.592], [0.543, 0.021, 0.978],
    [0.279, 0.317, 0.505], [0.167, 0.620, 0.077], [0.347, 0.857, 0.137],
    [0.055, 0.953, 0.042], [0.714, 0.505, 0.345], [0.783, 0.290, 0.734],
    [0.722, 0.645, 0.174], [0.302, 0.455, 0.848], [0.225, 0.587, 0.040],
    [0.517, 0.713, 0.338], [0.053, 0.959, 0.120], [0.393, 0.621, 0.362],
    [0.673, 0.211, 0.457], [0.820, 0.883, 0.371], [0.982, 0.099, 0.879],
];

/// 2×2×2 cube centered on the origin with a fixed color per vertex.
pub fn cube() -> Result<Geometry, GeometryError> {
    Geometry::new(
        Topology::Triangles,
        CUBE_POSITIONS.to_vec(),
        ColorSource::PerVertex(CUBE_COLORS.to_vec()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_counts_match_the_tables() {
        assert_eq!(circle().unwrap().vertex_count(), 78);
        assert_eq!(canon().unwrap().vertex_count(), 84);
        assert_eq!(rectangle().unwrap().vertex_count(), 6);
        assert_eq!(cube().unwrap().vertex_count(), 36);
    }

    #[test]
    fn fan_rim_stays_on_the_unit_circle() {
        for [x, y, z] in fan() {
            let r = (x * x + y * y).sqrt();
            assert!(r < 1e-6 || (r - 1.0).abs() < 1e-5);
            assert_eq!(z, 0.0);
        }
    }

    #[test]
    fn cannon_is_white() {
        assert!(canon().unwrap().colors().iter().all(|c| *c == [1.0; 3]));
    }

    #[test]
    fn cube_spans_two_units_per_axis() {
        let cube = cube().unwrap();
        for axis in 0..3 {
            let min = cube.positions().iter().map(|p| p[axis]).fold(f32::MAX, f32::min);
            let max = cube.positions().iter().map(|p| p[axis]).fold(f32::MIN, f32::max);
            assert_eq!((min, max), (-1.0, 1.0));
        }
    }
}
