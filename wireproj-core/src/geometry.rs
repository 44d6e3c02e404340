/// Cuboid geometry and edge sampling
use nalgebra::Point3;
use std::collections::HashSet;
use thiserror::Error;

/// A point in model space
pub type Point3D = Point3<f64>;

/// Corner index pairs forming the 12 edges of a cuboid.
///
/// Corner `i` takes the max bound on x when bit 2 is set, on y for bit 1
/// and on z for bit 0.
pub const EDGES: [(usize, usize); 12] = [
    (0, 1),
    (0, 2),
    (0, 4),
    (1, 3),
    (1, 5),
    (2, 3),
    (2, 6),
    (3, 7),
    (4, 5),
    (4, 6),
    (5, 7),
    (6, 7),
];

/// Rejected cuboid or sampling input
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("corner coordinate {axis} = {value} is not a finite number")]
    NonFinite { axis: char, value: f64 },
    #[error("cuboid has no extent along {axis} (both corners at {value})")]
    Degenerate { axis: char, value: f64 },
    #[error("sample count must be greater than 1 (got {0})")]
    TooFewSamples(usize),
}

/// An axis-aligned box defined by two opposite corners
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cuboid {
    pub min: Point3D,
    pub max: Point3D,
}

impl Cuboid {
    /// Rejects non-finite coordinates and corners that share any coordinate,
    /// so every cuboid has 8 distinct corners.
    pub fn new(p1: Point3D, p2: Point3D) -> Result<Self, GeometryError> {
        for p in [&p1, &p2] {
            for (axis, value) in ['x', 'y', 'z'].into_iter().zip(p.iter()) {
                if !value.is_finite() {
                    return Err(GeometryError::NonFinite { axis, value: *value });
                }
            }
        }
        for (axis, (a, b)) in ['x', 'y', 'z'].into_iter().zip(p1.iter().zip(p2.iter())) {
            if a == b {
                return Err(GeometryError::Degenerate { axis, value: *a });
            }
        }

        Ok(Self {
            min: Point3::new(p1.x.min(p2.x), p1.y.min(p2.y), p1.z.min(p2.z)),
            max: Point3::new(p1.x.max(p2.x), p1.y.max(p2.y), p1.z.max(p2.z)),
        })
    }

    pub fn center(&self) -> Point3D {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn corners(&self) -> [Point3D; 8] {
        std::array::from_fn(|i| {
            Point3::new(
                if i & 0b100 == 0 { self.min.x } else { self.max.x },
                if i & 0b010 == 0 { self.min.y } else { self.max.y },
                if i & 0b001 == 0 { self.min.z } else { self.max.z },
            )
        })
    }

    /// Sample `n` evenly spaced points along every edge, endpoints included.
    ///
    /// Points shared by several edges (the corners) are kept once, in the
    /// order they were first produced.
    pub fn sample(&self, n: usize) -> Result<Vec<Point3D>, GeometryError> {
        if n <= 1 {
            return Err(GeometryError::TooFewSamples(n));
        }

        let corners = self.corners();
        let mut seen = HashSet::with_capacity(EDGES.len() * n);
        let mut points = Vec::with_capacity(EDGES.len() * n);

        for &(start, end) in &EDGES {
            let start = corners[start];
            let delta = corners[end] - start;
            for j in 0..n {
                let t = j as f64 / (n - 1) as f64;
                let point = start + delta * t;
                if seen.insert(coordinate_key(&point)) {
                    points.push(point);
                }
            }
        }

        Ok(points)
    }
}

/// Exact coordinate identity; `-0.0` and `0.0` share a key.
fn coordinate_key(point: &Point3D) -> [u64; 3] {
    point.coords.map(|v| if v == 0.0 { 0u64 } else { v.to_bits() }).into()
}

/// Everything a render needs from the cuboid, computed once per render
#[derive(Debug, Clone)]
pub struct WireGeometry {
    pub corners: [Point3D; 8],
    pub center: Point3D,
    pub points: Vec<Point3D>,
}

impl WireGeometry {
    pub fn new(p1: Point3D, p2: Point3D, samples: usize) -> Result<Self, GeometryError> {
        let cuboid = Cuboid::new(p1, p2)?;
        Ok(Self {
            corners: cuboid.corners(),
            center: cuboid.center(),
            points: cuboid.sample(samples)?,
        })
    }

    pub fn edges(&self) -> impl Iterator<Item = (Point3D, Point3D)> + '_ {
        EDGES.iter().map(|&(a, b)| (self.corners[a], self.corners[b]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_cube() -> Cuboid {
        Cuboid::new(Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 10.0, 10.0)).unwrap()
    }

    #[test]
    fn test_bounds_are_normalised() {
        let cuboid = Cuboid::new(Point3::new(4.0, -1.0, 2.0), Point3::new(-2.0, 3.0, 0.5)).unwrap();
        assert_eq!(cuboid.min, Point3::new(-2.0, -1.0, 0.5));
        assert_eq!(cuboid.max, Point3::new(4.0, 3.0, 2.0));
        assert_eq!(cuboid.center(), Point3::new(1.0, 1.0, 1.25));
    }

    #[test]
    fn test_corner_index_bits() {
        let corners = unit_cube().corners();
        assert_eq!(corners[0], Point3::new(0.0, 0.0, 0.0));
        assert_eq!(corners[1], Point3::new(0.0, 0.0, 10.0));
        assert_eq!(corners[2], Point3::new(0.0, 10.0, 0.0));
        assert_eq!(corners[4], Point3::new(10.0, 0.0, 0.0));
        assert_eq!(corners[7], Point3::new(10.0, 10.0, 10.0));
    }

    #[test]
    fn test_edges_join_corners_differing_in_one_axis() {
        for (a, b) in EDGES {
            assert_eq!((a ^ b).count_ones(), 1, "edge ({a}, {b})");
        }
    }

    #[test]
    fn test_sample_scenario_n5() {
        let cuboid = unit_cube();
        let points = cuboid.sample(5).unwrap();
        // 8 corners plus 3 interior samples on each of the 12 edges
        assert_eq!(points.len(), 8 + 12 * 3);
        assert!(points.len() <= 60);
        for corner in cuboid.corners() {
            assert!(points.contains(&corner), "missing corner {corner}");
        }
    }

    #[test]
    fn test_sample_has_no_duplicates() {
        let points = unit_cube().sample(7).unwrap();
        let keys: HashSet<_> = points.iter().map(coordinate_key).collect();
        assert_eq!(keys.len(), points.len());
    }

    #[test]
    fn test_sample_bounds_hold_for_various_n() {
        let cuboid = Cuboid::new(Point3::new(-1.5, 0.25, 3.0), Point3::new(2.0, 7.0, -4.0)).unwrap();
        for n in 2..20 {
            let points = cuboid.sample(n).unwrap();
            assert!(points.len() >= 8);
            assert!(points.len() <= 12 * n);
        }
    }

    #[test]
    fn test_two_samples_are_just_corners() {
        assert_eq!(unit_cube().sample(2).unwrap().len(), 8);
    }

    #[test]
    fn test_rejects_too_few_samples() {
        assert_eq!(unit_cube().sample(1), Err(GeometryError::TooFewSamples(1)));
        assert_eq!(unit_cube().sample(0), Err(GeometryError::TooFewSamples(0)));
    }

    #[test]
    fn test_rejects_non_finite_corner() {
        let err = Cuboid::new(Point3::new(0.0, f64::NAN, 0.0), Point3::new(1.0, 1.0, 1.0)).unwrap_err();
        assert!(matches!(err, GeometryError::NonFinite { axis: 'y', .. }));

        let err = WireGeometry::new(Point3::origin(), Point3::new(1.0, 1.0, f64::INFINITY), 4).unwrap_err();
        assert!(matches!(err, GeometryError::NonFinite { axis: 'z', .. }));
    }

    #[test]
    fn test_signed_zero_collapses() {
        let a = Point3::new(-0.0, 1.0, 2.0);
        let b = Point3::new(0.0, 1.0, 2.0);
        assert_eq!(coordinate_key(&a), coordinate_key(&b));
    }

    #[test]
    fn test_rejects_flat_cuboid() {
        let err = Cuboid::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 0.0)).unwrap_err();
        assert_eq!(err, GeometryError::Degenerate { axis: 'z', value: 0.0 });

        // -0.0 and 0.0 are the same plane
        let err = Cuboid::new(Point3::new(-0.0, 0.0, 0.0), Point3::new(0.0, 1.0, 1.0)).unwrap_err();
        assert!(matches!(err, GeometryError::Degenerate { axis: 'x', .. }));
    }

    #[test]
    fn test_rejects_point_cuboid() {
        let p = Point3::new(1.0, 1.0, 1.0);
        let err = WireGeometry::new(p, p, 2).unwrap_err();
        assert!(matches!(err, GeometryError::Degenerate { axis: 'x', .. }));
    }

    #[test]
    fn test_thin_cuboid_keeps_all_corners() {
        let cuboid = Cuboid::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1e-9)).unwrap();
        let points = cuboid.sample(2).unwrap();
        assert_eq!(points.len(), 8);
        for corner in cuboid.corners() {
            assert!(points.contains(&corner));
        }
    }

    #[test]
    fn test_wire_geometry_edges() {
        let geometry = WireGeometry::new(Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 2.0, 2.0), 3).unwrap();
        assert_eq!(geometry.edges().count(), 12);
        assert_eq!(geometry.center, Point3::new(1.0, 1.0, 1.0));
        for (a, b) in geometry.edges() {
            assert!((nalgebra::distance(&a, &b) - 2.0).abs() < 1e-12);
        }
    }
}
