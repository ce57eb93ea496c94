use arrayvec::ArrayVec;
use cgmath::InnerSpace;
use log::warn;

use crate::bounds::Bounds;
use crate::math::{segment_plane_intersection, Plane, PlaneSide, PlaneType, Vec3, EDGE_LENGTH, MAX_WORLD_COORD, MAX_WORLD_SIZE, MIN_WORLD_COORD};

/// Maximum points a ProcWinding may have.
pub const MAX_POINTS_ON_WINDING: usize = 64;

/// Results from ProcWinding::split, describing where a winding ended up
/// relative to the splitting plane. A winding lying on the plane is reported
/// on the side its own normal faces.
#[derive(Clone, Debug, PartialEq)]
pub enum WindingSplit {
    /// Winding wasn't split, it is entirely in front of the plane.
    Front,
    /// Winding wasn't split, it is entirely behind the plane.
    Back,
    /// Winding was split into a front and a back fragment.
    Split(ProcWinding, ProcWinding),
}

/// A convex polygon. Points are wound clockwise when seen from the front of
/// the polygon's plane.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct ProcWinding {
    pub points: ArrayVec<Vec3, MAX_POINTS_ON_WINDING>,
}

impl ProcWinding {
    pub fn new() -> ProcWinding {
        ProcWinding { points: ArrayVec::new() }
    }

    pub fn from_points(points: &[Vec3]) -> ProcWinding {
        let mut winding = ProcWinding::new();
        for point in points {
            winding.push_point(*point);
        }
        winding
    }

    /// Create a huge square winding lying on the plane, large enough to cover
    /// the whole world.
    pub fn from_plane(plane: &Plane) -> ProcWinding {
        // Find the major axis.
        let normal = plane.normal;
        let up = match plane.plane_type() {
            PlaneType::Z => Vec3::new(1.0, 0.0, 0.0),
            PlaneType::X | PlaneType::Y => Vec3::new(0.0, 0.0, 1.0),
            PlaneType::NonAxial => {
                let (ax, ay, az) = (normal.x.abs(), normal.y.abs(), normal.z.abs());
                if az >= ax && az >= ay {
                    Vec3::new(1.0, 0.0, 0.0)
                } else {
                    Vec3::new(0.0, 0.0, 1.0)
                }
            }
        };

        let up = (up - normal * up.dot(normal)).normalize();
        let right = up.cross(normal);
        let org = normal * plane.dist;
        let up = up * MAX_WORLD_SIZE;
        let right = right * MAX_WORLD_SIZE;

        // Project a really big axis aligned box onto the plane.
        ProcWinding::from_points(&[
            org - right + up,
            org + right + up,
            org + right - up,
            org - right - up,
        ])
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Append a point. Points past MAX_POINTS_ON_WINDING are dropped, which
    /// keeps the polygon convex but loses a corner.
    pub fn push_point(&mut self, point: Vec3) {
        if self.points.try_push(point).is_err() {
            warn!("ProcWinding: MAX_POINTS_ON_WINDING exceeded, dropping point {:?}", point);
        }
    }

    /// Reverse the winding order, flipping the facing.
    pub fn reverse(&mut self) {
        self.points.reverse()
    }

    pub fn reversed(&self) -> ProcWinding {
        let mut winding = self.clone();
        winding.reverse();
        winding
    }

    /// Compute the area.
    pub fn area(&self) -> f64 {
        if self.points.len() < 3 {
            return 0.0;
        }
        let mut area = 0.0;
        for i in 2..self.points.len() {
            let d1 = self.points[i - 1] - self.points[0];
            let d2 = self.points[i] - self.points[0];
            area += d1.cross(d2).magnitude();
        }
        area * 0.5
    }

    pub fn center(&self) -> Vec3 {
        let mut center = Vec3::new(0.0, 0.0, 0.0);
        for point in &self.points {
            center += *point;
        }
        center / (self.points.len().max(1) as f64)
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new_from_points(&self.points)
    }

    /// The plane the winding lies on, or `None` if it is degenerate.
    pub fn plane(&self) -> Option<Plane> {
        if self.points.len() < 3 {
            return None;
        }
        let origin = self.points[0];
        let mut normal = Vec3::new(0.0, 0.0, 0.0);
        for i in 2..self.points.len() {
            normal += (self.points[i] - origin).cross(self.points[i - 1] - origin);
        }
        if normal.magnitude2() < f64::EPSILON {
            return None;
        }
        let normal = normal.normalize();
        Some(Plane::from_point_and_normal(origin, normal))
    }

    /// Classify the whole winding against a plane.
    pub fn plane_side(&self, plane: &Plane, epsilon: f64) -> PlaneSide {
        let mut front = false;
        let mut back = false;
        for point in &self.points {
            let d = plane.distance(*point);
            if d < -epsilon {
                if front {
                    return PlaneSide::Cross;
                }
                back = true;
            } else if d > epsilon {
                if back {
                    return PlaneSide::Cross;
                }
                front = true;
            }
        }
        match (front, back) {
            (true, _) => PlaneSide::Front,
            (_, true) => PlaneSide::Back,
            _ => PlaneSide::On,
        }
    }

    fn classify(&self, plane: &Plane, epsilon: f64) -> (ArrayVec<f64, MAX_POINTS_ON_WINDING>, ArrayVec<PlaneSide, MAX_POINTS_ON_WINDING>, [usize; 3]) {
        let mut dists = ArrayVec::new();
        let mut sides = ArrayVec::new();
        let mut counts = [0usize; 3];
        for point in &self.points {
            let d = plane.distance(*point);
            let side = if d > epsilon {
                counts[0] += 1;
                PlaneSide::Front
            } else if d < -epsilon {
                counts[1] += 1;
                PlaneSide::Back
            } else {
                counts[2] += 1;
                PlaneSide::On
            };
            dists.push(d);
            sides.push(side);
        }
        (dists, sides, counts)
    }

    /// Split with plane. Points within `epsilon` of the plane are kept on
    /// both fragments.
    pub fn split(&self, plane: &Plane, epsilon: f64) -> WindingSplit {
        let (dists, sides, counts) = self.classify(plane, epsilon);

        if counts[0] == 0 && counts[1] == 0 {
            // Coplanar, put on the front side if the normals match.
            return match self.plane() {
                Some(winding_plane) if winding_plane.normal.dot(plane.normal) > 0.0 => WindingSplit::Front,
                _ => WindingSplit::Back,
            };
        }
        if counts[0] == 0 {
            return WindingSplit::Back;
        }
        if counts[1] == 0 {
            return WindingSplit::Front;
        }

        let mut front = ProcWinding::new();
        let mut back = ProcWinding::new();
        let n = self.points.len();

        for i in 0..n {
            let p1 = self.points[i];

            if sides[i] == PlaneSide::On {
                front.push_point(p1);
                back.push_point(p1);
                continue;
            }

            if sides[i] == PlaneSide::Front {
                front.push_point(p1);
            } else {
                back.push_point(p1);
            }

            let j = (i + 1) % n;
            if sides[j] == PlaneSide::On || sides[j] == sides[i] {
                continue;
            }

            // Generate a split point.
            let mid = segment_plane_intersection(&p1, &self.points[j], dists[i], dists[j], plane);
            front.push_point(mid);
            back.push_point(mid);
        }

        // Handle possibility of sliver windings due to precision errors.
        if front.len() < 3 {
            return WindingSplit::Back;
        }
        if back.len() < 3 {
            return WindingSplit::Front;
        }

        WindingSplit::Split(front, back)
    }

    /// Keep only the part of the winding in front of the plane. Returns `None`
    /// if nothing is left. A winding on the plane survives only if `keep_on`.
    pub fn clip(self, plane: &Plane, epsilon: f64, keep_on: bool) -> Option<ProcWinding> {
        let (dists, sides, counts) = self.classify(plane, epsilon);

        if keep_on && counts[0] == 0 && counts[1] == 0 {
            return Some(self);
        }
        if counts[0] == 0 {
            return None;
        }
        if counts[1] == 0 {
            return Some(self);
        }

        let mut front = ProcWinding::new();
        let n = self.points.len();

        for i in 0..n {
            let p1 = self.points[i];

            if sides[i] == PlaneSide::On {
                front.push_point(p1);
                continue;
            }

            if sides[i] == PlaneSide::Front {
                front.push_point(p1);
            }

            let j = (i + 1) % n;
            if sides[j] == PlaneSide::On || sides[j] == sides[i] {
                continue;
            }

            front.push_point(segment_plane_intersection(&p1, &self.points[j], dists[i], dists[j], plane));
        }

        if front.len() < 3 {
            return None;
        }
        Some(front)
    }

    /// A winding is tiny when fewer than three of its edges are longer than
    /// EDGE_LENGTH.
    pub fn is_tiny(&self) -> bool {
        let n = self.points.len();
        let mut edges = 0;
        for i in 0..n {
            let delta = self.points[(i + 1) % n] - self.points[i];
            if delta.magnitude() > EDGE_LENGTH {
                edges += 1;
                if edges == 3 {
                    return false;
                }
            }
        }
        true
    }

    /// A winding is huge when it reaches the world limits, i.e. it was never
    /// bounded by anything but its base winding.
    pub fn is_huge(&self) -> bool {
        self.points.iter().any(|point| {
            (0..3).any(|axis| point[axis] <= MIN_WORLD_COORD || point[axis] >= MAX_WORLD_COORD)
        })
    }
}
