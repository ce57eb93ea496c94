use std::collections::HashMap;
use std::ops::Index;

use crate::math::{Plane, PlaneType, DIST_EPSILON, NORMAL_EPSILON};

/// Deduplicated store of every plane used by one compilation.
///
/// Planes are always added in opposite facing pairs, so `plane_num ^ 1` is the
/// flipped version of `plane_num`. For axial planes the even index holds the
/// plane whose normal points along the positive axis.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlaneSet {
    planes: Vec<Plane>,
    /// Plane indices bucketed by their integer distance.
    hash: HashMap<i64, Vec<usize>>,
}

impl PlaneSet {
    pub fn new() -> PlaneSet {
        PlaneSet::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.planes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.planes.is_empty()
    }

    pub fn get(&self, plane_num: usize) -> Option<&Plane> {
        self.planes.get(plane_num)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Plane> {
        self.planes.iter()
    }

    /// Find the index of a plane, adding it (and its flip) if no plane within
    /// the default tolerances exists yet.
    pub fn find_float_plane(&mut self, plane: &Plane) -> usize {
        let mut plane = *plane;
        plane.fix_degeneracies(DIST_EPSILON);
        self.find_plane(&plane, NORMAL_EPSILON, DIST_EPSILON)
    }

    /// Find the index of a plane within the given tolerances, adding it and
    /// its flip if it isn't there.
    pub fn find_plane(&mut self, plane: &Plane, normal_epsilon: f64, dist_epsilon: f64) -> usize {
        let bucket = plane.dist.floor() as i64;
        for key in [bucket - 1, bucket, bucket + 1] {
            if let Some(indices) = self.hash.get(&key) {
                for &index in indices {
                    if self.planes[index].compare(plane, normal_epsilon, dist_epsilon) {
                        return index;
                    }
                }
            }
        }

        let negative_axial = plane.plane_type() != PlaneType::NonAxial && plane.normal.x + plane.normal.y + plane.normal.z < 0.0;
        if negative_axial {
            // Keep the positive facing plane first.
            self.append(-*plane);
            self.append(*plane);
            self.planes.len() - 1
        } else {
            self.append(*plane);
            self.append(-*plane);
            self.planes.len() - 2
        }
    }

    fn append(&mut self, plane: Plane) {
        let index = self.planes.len();
        self.planes.push(plane);
        self.hash.entry(plane.dist.floor() as i64).or_default().push(index);
    }
}

impl Index<usize> for PlaneSet {
    type Output = Plane;

    fn index(&self, plane_num: usize) -> &Plane {
        &self.planes[plane_num]
    }
}
