use cgmath::InnerSpace;
use log::warn;

use crate::bounds::Bounds;
use crate::contents::ContentFlags;
use crate::error::BrushError;
use crate::math::{Plane, PlaneSide, Vec3};
use crate::plane_set::PlaneSet;
use crate::scene::MapBrush;
use crate::winding::{ProcWinding, WindingSplit};

/// Brush fragments smaller than this are discarded after a split.
pub const MIN_BRUSH_VOLUME: f64 = 1.0;

/// Distance a brush must reach past a plane to count as being on that side.
const SPLIT_BRUSH_SLACK: f64 = 0.1;

/// One bounding plane of a ProcBrush. Sides produced by a split have no
/// material of their own.
#[derive(Clone, Debug, PartialEq)]
pub struct ProcBrushSide {
    pub plane_num: usize,
    pub material: String,
    pub contents: ContentFlags,
    pub winding: Option<ProcWinding>,
}

/// A convex solid bounded by the planes of its sides, all facing outward.
#[derive(Clone, Debug, PartialEq)]
pub struct ProcBrush {
    pub entity_num: usize,
    pub brush_num: usize,
    pub contents: ContentFlags,
    /// Blocks visibility and seals the world.
    pub opaque: bool,
    /// Takes part in splitting the world.
    pub structural: bool,
    pub sides: Vec<ProcBrushSide>,
    pub bounds: Bounds,
}

impl ProcBrush {
    /// Build a brush from its map description. Planes are registered in
    /// `planes`, offset by `-origin` so brush models end up in model space.
    pub fn from_map_brush(map_brush: &MapBrush, entity_num: usize, brush_num: usize, origin: Vec3, planes: &mut PlaneSet) -> Result<ProcBrush, BrushError> {
        let mut sides: Vec<ProcBrushSide> = Vec::with_capacity(map_brush.sides.len());

        for (side_index, map_side) in map_brush.sides.iter().enumerate() {
            let mut plane = map_side.plane;
            if !plane.normalize() {
                return Err(BrushError::InvalidPlane { side: side_index });
            }
            plane.dist -= plane.normal.dot(origin);
            let plane_num = planes.find_float_plane(&plane);

            if sides.iter().any(|side| side.plane_num == plane_num) {
                warn!("Entity {}, Brush {}: duplicate plane", entity_num, brush_num);
                continue;
            }
            if sides.iter().any(|side| side.plane_num == plane_num ^ 1) {
                return Err(BrushError::MirroredPlane { side: side_index });
            }

            sides.push(ProcBrushSide {
                plane_num,
                material: map_side.material.clone(),
                contents: map_side.contents,
                winding: None,
            });
        }

        let contents = map_brush.contents();
        let opaque = contents.is_opaque();
        let mut brush = ProcBrush {
            entity_num,
            brush_num,
            contents,
            opaque,
            structural: !contents.contains(ContentFlags::Detail) && (opaque || contents.contains(ContentFlags::AreaPortal)),
            sides,
            bounds: Bounds::new(),
        };

        let count = brush.create_windings(planes);
        if count < 4 {
            return Err(BrushError::TooFewSides { count });
        }
        if !brush.bound_brush() {
            return Err(BrushError::BoundsOutOfRange);
        }

        Ok(brush)
    }

    /// Create the winding of every side by clipping the side's base winding
    /// with all the other sides. Returns the number of sides with a winding.
    pub fn create_windings(&mut self, planes: &PlaneSet) -> usize {
        let plane_nums: Vec<usize> = self.sides.iter().map(|side| side.plane_num).collect();
        let mut count = 0;

        for (i, side) in self.sides.iter_mut().enumerate() {
            let mut winding = Some(ProcWinding::from_plane(&planes[side.plane_num]));
            for (j, &other) in plane_nums.iter().enumerate() {
                if i == j || other == side.plane_num ^ 1 {
                    continue;
                }
                // Keep the part behind the other side.
                winding = match winding {
                    Some(w) => w.clip(&planes[other ^ 1], 0.0, false),
                    None => break,
                };
            }
            if winding.is_some() {
                count += 1;
            }
            side.winding = winding;
        }

        count
    }

    /// Set the bounds from the side windings. Returns false if the brush has
    /// no volume or reaches past the world limits.
    pub fn bound_brush(&mut self) -> bool {
        self.bounds.clear();
        for winding in self.sides.iter().filter_map(|side| side.winding.as_ref()) {
            self.bounds.add_points(&winding.points);
        }
        self.bounds.has_volume() && self.bounds.is_inside_world()
    }

    /// The side that acts as the area portal of an areaportal brush: the
    /// largest side carrying AreaPortal, first one on ties.
    pub fn portal_side(&self) -> Option<usize> {
        if !self.contents.contains(ContentFlags::AreaPortal) {
            return None;
        }
        let mut best: Option<(usize, f64)> = None;
        for (index, side) in self.sides.iter().enumerate() {
            if !side.contents.contains(ContentFlags::AreaPortal) {
                continue;
            }
            let area = side.winding.as_ref().map_or(0.0, |w| w.area());
            if best.map_or(true, |(_, best_area)| area > best_area) {
                best = Some((index, area));
            }
        }
        best.map(|(index, _)| index)
    }

    pub fn num_windings(&self) -> usize {
        self.sides.iter().filter(|side| side.winding.is_some()).count()
    }

    /// Volume from the pyramids between one corner and every side.
    pub fn volume(&self, planes: &PlaneSet) -> f64 {
        let corner = match self.sides.iter().find_map(|side| side.winding.as_ref()) {
            Some(winding) if !winding.is_empty() => winding.points[0],
            _ => return 0.0,
        };

        let mut volume = 0.0;
        for side in &self.sides {
            if let Some(winding) = &side.winding {
                let d = -planes[side.plane_num].distance(corner);
                volume += d * winding.area();
            }
        }
        volume / 3.0
    }

    /// The side of the plane the brush reaches furthest into.
    pub fn mostly_on_side(&self, plane: &Plane) -> PlaneSide {
        let mut max = 0.0;
        let mut side = PlaneSide::Front;
        for winding in self.sides.iter().filter_map(|side| side.winding.as_ref()) {
            for point in &winding.points {
                let d = plane.distance(*point);
                if d > max {
                    max = d;
                    side = PlaneSide::Front;
                }
                if -d > max {
                    max = -d;
                    side = PlaneSide::Back;
                }
            }
        }
        side
    }

    /// Split the brush with a plane, leaving `self` untouched. Either half may
    /// be `None` when the brush doesn't reach that side.
    pub fn split(&self, plane_num: usize, planes: &PlaneSet) -> (Option<ProcBrush>, Option<ProcBrush>) {
        let plane = planes[plane_num];

        // Check all points.
        let mut d_front = 0.0f64;
        let mut d_back = 0.0f64;
        for winding in self.sides.iter().filter_map(|side| side.winding.as_ref()) {
            for point in &winding.points {
                let d = plane.distance(*point);
                d_front = d_front.max(d);
                d_back = d_back.min(d);
            }
        }
        if d_front < SPLIT_BRUSH_SLACK {
            return (None, Some(self.clone()));
        }
        if d_back > -SPLIT_BRUSH_SLACK {
            return (Some(self.clone()), None);
        }

        // Create a new winding from the split plane.
        let mut mid_winding = Some(ProcWinding::from_plane(&plane));
        for side in &self.sides {
            mid_winding = match mid_winding {
                Some(w) => w.clip(&planes[side.plane_num ^ 1], 0.0, false),
                None => break,
            };
        }

        let mid_winding = match mid_winding {
            Some(w) if !w.is_tiny() => w,
            _ => {
                // The brush isn't really split.
                return match self.mostly_on_side(&plane) {
                    PlaneSide::Back => (None, Some(self.clone())),
                    _ => (Some(self.clone()), None),
                };
            }
        };

        if mid_winding.is_huge() {
            warn!("Entity {}, Brush {}: huge winding in split", self.entity_num, self.brush_num);
        }

        // Split it for real.
        let mut halves = [self.empty_copy(), self.empty_copy()];
        for side in &self.sides {
            let winding = match &side.winding {
                Some(winding) => winding,
                None => continue,
            };
            let (front, back) = match winding.split(&plane, 0.0) {
                WindingSplit::Front => (Some(winding.clone()), None),
                WindingSplit::Back => (None, Some(winding.clone())),
                WindingSplit::Split(front, back) => (Some(front), Some(back)),
            };
            for (half, fragment) in halves.iter_mut().zip([front, back]) {
                if let Some(fragment) = fragment {
                    half.sides.push(ProcBrushSide {
                        plane_num: side.plane_num,
                        material: side.material.clone(),
                        contents: side.contents,
                        winding: Some(fragment),
                    });
                }
            }
        }

        // See if we have valid polygons on both sides.
        let valid: Vec<bool> = halves.iter_mut().map(|half| half.bound_brush() && half.sides.len() >= 3).collect();
        if !valid[0] || !valid[1] {
            if !valid[0] && !valid[1] {
                warn!("Entity {}, Brush {}: split removed brush", self.entity_num, self.brush_num);
            } else {
                warn!("Entity {}, Brush {}: split not on both sides", self.entity_num, self.brush_num);
            }
            return (
                if valid[0] { Some(self.clone()) } else { None },
                if valid[1] { Some(self.clone()) } else { None },
            );
        }

        // Add the mid winding to both sides. The front half is closed by the
        // flipped plane, the back half by the plane itself.
        let [mut front, mut back] = halves;
        front.sides.push(ProcBrushSide {
            plane_num: plane_num ^ 1,
            material: String::new(),
            contents: ContentFlags::empty(),
            winding: Some(mid_winding.reversed()),
        });
        back.sides.push(ProcBrushSide {
            plane_num,
            material: String::new(),
            contents: ContentFlags::empty(),
            winding: Some(mid_winding),
        });

        let front = if front.volume(planes) < MIN_BRUSH_VOLUME { None } else { Some(front) };
        let back = if back.volume(planes) < MIN_BRUSH_VOLUME { None } else { Some(back) };
        (front, back)
    }

    fn empty_copy(&self) -> ProcBrush {
        ProcBrush {
            entity_num: self.entity_num,
            brush_num: self.brush_num,
            contents: self.contents,
            opaque: self.opaque,
            structural: self.structural,
            sides: Vec::new(),
            bounds: Bounds::new(),
        }
    }
}
