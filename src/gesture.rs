// ============================================================================
// GESTURE — live pointer tracking and per-gesture transient state
// ============================================================================

use egui::Pos2;

use crate::ops::geometry;
use crate::ops::smoothing::StrokeSmoother;
use crate::selection::SelectionTransform;

pub type PointerId = u64;

pub const MIN_SELECTION_SCALE: f32 = 0.05;
pub const MAX_SELECTION_SCALE: f32 = 8.0;

/// Lasso samples closer than 2 px to the previous sample are dropped.
const LASSO_SAMPLE_SPACING_SQ: f32 = 4.0;

/// Last-known stage position of every pressed pointer, in press order. The
/// transform gesture pairs "the first two pointers", which means press
/// order, so this is an ordered vec rather than a hash map.
#[derive(Default)]
pub struct ActivePointers {
    entries: Vec<(PointerId, Pos2)>,
}

impl ActivePointers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a pointer position. Existing pointers update in place and keep
    /// their press-order slot.
    pub fn insert(&mut self, id: PointerId, pos: Pos2) {
        match self.entries.iter_mut().find(|(pid, _)| *pid == id) {
            Some(entry) => entry.1 = pos,
            None => self.entries.push((id, pos)),
        }
    }

    pub fn remove(&mut self, id: PointerId) {
        self.entries.retain(|(pid, _)| *pid != id);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn positions(&self) -> impl Iterator<Item = Pos2> + '_ {
        self.entries.iter().map(|(_, p)| *p)
    }

    pub fn centroid(&self) -> Option<Pos2> {
        let points: Vec<Pos2> = self.positions().collect();
        geometry::centroid(&points)
    }

    /// The first two pointers by press order, if at least two are down.
    pub fn first_two(&self) -> Option<(Pos2, Pos2)> {
        if self.entries.len() >= 2 {
            Some((self.entries[0].1, self.entries[1].1))
        } else {
            None
        }
    }
}

/// Reference frame captured on the first move of a transform gesture. Later
/// moves are interpreted relative to this frame, on top of the transform the
/// selection had accumulated before the gesture began.
#[derive(Clone, Copy, Debug)]
pub struct TransformSeed {
    prior: SelectionTransform,
    centroid: Pos2,
    angle: f32,
    distance: f32,
    paired: bool,
}

impl TransformSeed {
    pub fn capture(prior: SelectionTransform, pointers: &ActivePointers) -> Option<Self> {
        let centroid = pointers.centroid()?;
        let (angle, distance, paired) = match pointers.first_two() {
            Some((a, b)) => (geometry::angle(a, b), geometry::distance(a, b), true),
            None => (0.0, 1.0, false),
        };
        Some(TransformSeed {
            prior,
            centroid,
            angle,
            distance,
            paired,
        })
    }

    /// Derive the selection transform for the current pointer set. Translate
    /// always follows the centroid; scale and rotation move only when two
    /// pointers were down at both seed time and now.
    pub fn resolve(&self, pointers: &ActivePointers) -> SelectionTransform {
        let Some(centroid) = pointers.centroid() else {
            return self.prior;
        };
        let mut next = self.prior;
        next.tx = self.prior.tx + (centroid.x - self.centroid.x);
        next.ty = self.prior.ty + (centroid.y - self.centroid.y);
        if self.paired {
            if let Some((a, b)) = pointers.first_two() {
                let seed_dist = if self.distance == 0.0 {
                    1.0
                } else {
                    self.distance
                };
                let ratio = geometry::distance(a, b) / seed_dist;
                next.scale = (self.prior.scale * ratio)
                    .clamp(MIN_SELECTION_SCALE, MAX_SELECTION_SCALE);
                next.rotation = self.prior.rotation + (geometry::angle(a, b) - self.angle);
            }
        }
        next
    }
}

/// Per-tool scratch carried by one gesture.
pub enum GestureKind {
    /// Pen or eraser: the spring-damper smoother state.
    Stroke(StrokeSmoother),
    /// Shape tool: preview anchored between start and current point.
    Shape,
    /// Lasso accumulation for the select tool.
    Lasso,
    /// Transform tool: seed captured lazily on the first move.
    Transform(Option<TransformSeed>),
}

/// One continuous pointer interaction, pointer-down to final release. A new
/// gesture always starts from clean state; nothing carries across gestures
/// except the accumulated selection transform.
pub struct Gesture {
    pub start: Pos2,
    pub last: Pos2,
    pub points: Vec<Pos2>,
    pub primary: PointerId,
    pub kind: GestureKind,
}

impl Gesture {
    pub fn new(primary: PointerId, start: Pos2, kind: GestureKind) -> Self {
        Gesture {
            start,
            last: start,
            points: vec![start],
            primary,
            kind,
        }
    }

    /// Append a lasso sample unless it sits within the decimation radius of
    /// the previous one. Returns whether the point was kept.
    pub fn push_sample(&mut self, p: Pos2) -> bool {
        match self.points.last() {
            Some(last) if geometry::distance_sq(*last, p) <= LASSO_SAMPLE_SPACING_SQ => false,
            _ => {
                self.points.push(p);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;

    #[test]
    fn pointer_updates_keep_press_order() {
        let mut pointers = ActivePointers::new();
        pointers.insert(7, pos2(0.0, 0.0));
        pointers.insert(3, pos2(10.0, 0.0));
        pointers.insert(9, pos2(20.0, 0.0));
        // Moving the second pointer must not promote it to first.
        pointers.insert(3, pos2(15.0, 5.0));
        let (a, b) = pointers.first_two().unwrap();
        assert_eq!(a, pos2(0.0, 0.0));
        assert_eq!(b, pos2(15.0, 5.0));
        pointers.remove(7);
        let (a, _) = pointers.first_two().unwrap();
        assert_eq!(a, pos2(15.0, 5.0));
    }

    #[test]
    fn single_pointer_gestures_translate_only() {
        let mut pointers = ActivePointers::new();
        pointers.insert(1, pos2(50.0, 50.0));
        let prior = SelectionTransform {
            tx: 3.0,
            ty: -2.0,
            scale: 1.5,
            rotation: 0.4,
        };
        let seed = TransformSeed::capture(prior, &pointers).unwrap();
        pointers.insert(1, pos2(60.0, 45.0));
        let next = seed.resolve(&pointers);
        assert_eq!(next.tx, 13.0);
        assert_eq!(next.ty, -7.0);
        assert_eq!(next.scale, 1.5);
        assert_eq!(next.rotation, 0.4);
    }

    #[test]
    fn paired_gesture_scales_and_rotates_about_the_pair() {
        let mut pointers = ActivePointers::new();
        pointers.insert(1, pos2(0.0, 0.0));
        pointers.insert(2, pos2(10.0, 0.0));
        let seed = TransformSeed::capture(SelectionTransform::IDENTITY, &pointers).unwrap();
        // Spread to double the distance and rotate the pair a quarter turn.
        pointers.insert(1, pos2(0.0, 0.0));
        pointers.insert(2, pos2(0.0, 20.0));
        let next = seed.resolve(&pointers);
        assert!((next.scale - 2.0).abs() < 1e-5);
        assert!((next.rotation - std::f32::consts::FRAC_PI_2).abs() < 1e-5);
    }

    #[test]
    fn scale_clamps_for_extreme_distance_ratios() {
        let mut pointers = ActivePointers::new();
        pointers.insert(1, pos2(0.0, 0.0));
        pointers.insert(2, pos2(1.0, 0.0));
        let seed = TransformSeed::capture(SelectionTransform::IDENTITY, &pointers).unwrap();
        pointers.insert(2, pos2(1000.0, 0.0));
        assert_eq!(seed.resolve(&pointers).scale, MAX_SELECTION_SCALE);
        pointers.insert(2, pos2(0.001, 0.0));
        assert_eq!(seed.resolve(&pointers).scale, MIN_SELECTION_SCALE);
    }

    #[test]
    fn coincident_seed_pointers_scale_against_unit_distance() {
        let mut pointers = ActivePointers::new();
        pointers.insert(1, pos2(5.0, 5.0));
        pointers.insert(2, pos2(5.0, 5.0));
        let seed = TransformSeed::capture(SelectionTransform::IDENTITY, &pointers).unwrap();
        pointers.insert(2, pos2(8.0, 9.0));
        // Seed distance zero is treated as one, so the ratio is the raw
        // current distance.
        assert!((seed.resolve(&pointers).scale - 5.0).abs() < 1e-5);
    }

    #[test]
    fn lasso_samples_decimate_close_points() {
        let mut gesture = Gesture::new(1, pos2(0.0, 0.0), GestureKind::Lasso);
        assert!(!gesture.push_sample(pos2(1.0, 1.0)));
        assert!(gesture.push_sample(pos2(3.0, 0.0)));
        assert!(!gesture.push_sample(pos2(4.0, 1.0)));
        assert_eq!(gesture.points.len(), 2);
    }
}
