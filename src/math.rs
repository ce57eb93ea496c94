use cgmath::{InnerSpace, Vector3};
use std::ops::Neg;

pub type Vec3 = Vector3<f64>;

// World limits.

/// Largest coordinate a brush or portal may reach.
pub const MAX_WORLD_COORD: f64 = 128.0 * 1024.0;
/// Smallest coordinate a brush or portal may reach.
pub const MIN_WORLD_COORD: f64 = -128.0 * 1024.0;
/// Extent of the world along one axis.
pub const MAX_WORLD_SIZE: f64 = MAX_WORLD_COORD - MIN_WORLD_COORD;

// Magic numbers for numerical precision.

/// Thickness of plane for front/back/on classification.
pub const ON_EPSILON: f64 = 0.1;
/// Thickness used when clipping windings against portals and brush sides.
pub const CLIP_EPSILON: f64 = 0.1;
/// Thickness used when splitting portals at a node plane.
pub const SPLIT_WINDING_EPSILON: f64 = 0.001;
/// Thickness used when bounding a node plane by its ancestors.
pub const BASE_WINDING_EPSILON: f64 = 0.001;
/// Two normals are the same plane if every component is within this distance.
pub const NORMAL_EPSILON: f64 = 0.00001;
/// Two planes with the same normal are the same if their distances are within this.
pub const DIST_EPSILON: f64 = 0.01;
/// Edges shorter than this don't count toward a winding's shape.
pub const EDGE_LENGTH: f64 = 0.2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaneType {
    X,
    Y,
    Z,
    NonAxial,
}

impl PlaneType {
    pub fn is_axial(self) -> bool {
        self != PlaneType::NonAxial
    }

    pub fn axis(self) -> Option<usize> {
        match self {
            PlaneType::X => Some(0),
            PlaneType::Y => Some(1),
            PlaneType::Z => Some(2),
            PlaneType::NonAxial => None,
        }
    }
}

/// Result of classifying a point or winding against a plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaneSide {
    Front,
    Back,
    On,
    Cross,
}

/// A plane `normal . p = dist`. Points with a positive distance are in front.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub dist: f64,
}

impl Plane {
    pub fn new(normal: Vec3, dist: f64) -> Plane {
        Plane { normal, dist }
    }

    pub fn from_point_and_normal(point: Vec3, normal: Vec3) -> Plane {
        Plane { normal, dist: normal.dot(point) }
    }

    /// Signed distance of a point from the plane.
    #[inline]
    pub fn distance(&self, point: Vec3) -> f64 {
        self.normal.dot(point) - self.dist
    }

    pub fn side(&self, point: Vec3, epsilon: f64) -> PlaneSide {
        let d = self.distance(point);
        if d > epsilon {
            PlaneSide::Front
        } else if d < -epsilon {
            PlaneSide::Back
        } else {
            PlaneSide::On
        }
    }

    pub fn plane_type(&self) -> PlaneType {
        let n = self.normal;
        if n.y == 0.0 && n.z == 0.0 {
            PlaneType::X
        } else if n.x == 0.0 && n.z == 0.0 {
            PlaneType::Y
        } else if n.x == 0.0 && n.y == 0.0 {
            PlaneType::Z
        } else {
            PlaneType::NonAxial
        }
    }

    /// Normalize the normal, scaling the distance along with it. Returns false
    /// if the normal has no length.
    pub fn normalize(&mut self) -> bool {
        let length = self.normal.magnitude();
        if length < SMALL_NUMBER {
            return false;
        }
        self.normal /= length;
        self.dist /= length;
        true
    }

    /// Snap nearly axial normals to the axis and nearly integral distances to
    /// the integer. Returns true if anything changed.
    pub fn fix_degeneracies(&mut self, dist_epsilon: f64) -> bool {
        let fixed_normal = self.fix_degenerate_normal();
        let rounded = self.dist.round();
        if (self.dist - rounded).abs() < dist_epsilon && self.dist != rounded {
            self.dist = rounded;
            return true;
        }
        fixed_normal
    }

    fn fix_degenerate_normal(&mut self) -> bool {
        for axis in 0..3 {
            if self.normal[axis] == 1.0 || self.normal[axis] == -1.0 {
                let fixed = self.normal[(axis + 1) % 3] != 0.0 || self.normal[(axis + 2) % 3] != 0.0;
                if fixed {
                    self.normal[(axis + 1) % 3] = 0.0;
                    self.normal[(axis + 2) % 3] = 0.0;
                }
                return fixed;
            }
        }
        for axis in 0..3 {
            if (self.normal[axis].abs() - 1.0).abs() < NORMAL_EPSILON {
                let sign = self.normal[axis].signum();
                self.normal = Vec3::new(0.0, 0.0, 0.0);
                self.normal[axis] = sign;
                return true;
            }
        }
        false
    }

    /// Compare with another plane using separate normal and distance tolerances.
    pub fn compare(&self, other: &Plane, normal_epsilon: f64, dist_epsilon: f64) -> bool {
        (self.dist - other.dist).abs() <= dist_epsilon
            && points_are_near(&self.normal, &other.normal, normal_epsilon)
    }
}

impl Neg for Plane {
    type Output = Plane;

    fn neg(self) -> Plane {
        Plane { normal: -self.normal, dist: -self.dist }
    }
}

pub const SMALL_NUMBER: f64 = 1.0e-8;

/// Compare two points and see if they're within `distance` on every axis.
pub fn points_are_near(point1: &Vec3, point2: &Vec3, distance: f64) -> bool {
    if (point1.x - point2.x).abs() > distance {
        return false;
    }
    if (point1.y - point2.y).abs() > distance {
        return false;
    }
    if (point1.z - point2.z).abs() > distance {
        return false;
    }
    true
}

/// Find the intersection of the segment `point1`-`point2` with a plane, given
/// the signed distances of both end points. Axial planes take the exact
/// coordinate to avoid drift.
pub fn segment_plane_intersection(point1: &Vec3, point2: &Vec3, d1: f64, d2: f64, plane: &Plane) -> Vec3 {
    let t = d1 / (d1 - d2);
    let mut mid = Vec3::new(0.0, 0.0, 0.0);
    for axis in 0..3 {
        mid[axis] = if plane.normal[axis] == 1.0 {
            plane.dist
        } else if plane.normal[axis] == -1.0 {
            -plane.dist
        } else {
            point1[axis] + t * (point2[axis] - point1[axis])
        };
    }
    mid
}
