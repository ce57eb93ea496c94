use crate::math::{Vec3, MAX_WORLD_COORD, MIN_WORLD_COORD};

/// An axis-aligned bounding box. A box that has not seen a point yet is
/// "cleared" and reports `is_valid == false`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
    pub is_valid: bool,
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new()
    }
}

impl Bounds {
    pub fn new() -> Bounds {
        Bounds {
            min: Vec3::new(0.0, 0.0, 0.0),
            max: Vec3::new(0.0, 0.0, 0.0),
            is_valid: false,
        }
    }

    pub fn new_from_min_max(min: Vec3, max: Vec3) -> Bounds {
        Bounds { min, max, is_valid: true }
    }

    pub fn new_from_points(points: &[Vec3]) -> Bounds {
        let mut bounds = Bounds::new();
        bounds.add_points(points);
        bounds
    }

    pub fn clear(&mut self) {
        *self = Bounds::new();
    }

    /// Returns the midpoint between the min and max points.
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn add_point(&mut self, point: &Vec3) {
        if self.is_valid {
            self.min.x = self.min.x.min(point.x);
            self.min.y = self.min.y.min(point.y);
            self.min.z = self.min.z.min(point.z);
            self.max.x = self.max.x.max(point.x);
            self.max.y = self.max.y.max(point.y);
            self.max.z = self.max.z.max(point.z);
        } else {
            self.min = *point;
            self.max = *point;
            self.is_valid = true;
        }
    }

    pub fn add_points(&mut self, points: &[Vec3]) {
        for point in points {
            self.add_point(point);
        }
    }

    pub fn expand_by(&self, w: f64) -> Bounds {
        Bounds::new_from_min_max(self.min - Vec3::new(w, w, w), self.max + Vec3::new(w, w, w))
    }

    pub fn contains_point(&self, point: &Vec3, epsilon: f64) -> bool {
        self.is_valid && (0..3).all(|axis| {
            point[axis] >= self.min[axis] - epsilon && point[axis] <= self.max[axis] + epsilon
        })
    }

    /// True if the box has positive extent on every axis.
    pub fn has_volume(&self) -> bool {
        self.is_valid && (0..3).all(|axis| self.min[axis] < self.max[axis])
    }

    /// True if the box lies strictly inside the world limits.
    pub fn is_inside_world(&self) -> bool {
        self.is_valid && (0..3).all(|axis| {
            self.min[axis] > MIN_WORLD_COORD && self.max[axis] < MAX_WORLD_COORD
        })
    }
}
