use egui::{Pos2, Rect, pos2};

/// One subpath: an ordered run of points, optionally closed back to its start.
#[derive(Clone, Debug)]
pub struct Contour {
    pub points: Vec<Pos2>,
    pub closed: bool,
}

/// A polyline/polygon path built from move/line/close verbs.
///
/// Curves are not needed by any tool here; freehand input arrives as dense
/// point runs already.
#[derive(Clone, Debug, Default)]
pub struct Path {
    contours: Vec<Contour>,
}

impl Path {
    pub fn new() -> Self {
        Path::default()
    }

    /// Build a single closed polygon from a point list.
    pub fn from_polygon(points: &[Pos2]) -> Self {
        let mut path = Path::new();
        if let Some((first, rest)) = points.split_first() {
            path.move_to(*first);
            for p in rest {
                path.line_to(*p);
            }
            path.close();
        }
        path
    }

    /// Start a new contour at `p`.
    pub fn move_to(&mut self, p: Pos2) {
        self.contours.push(Contour {
            points: vec![p],
            closed: false,
        });
    }

    /// Extend the current contour. Without a preceding `move_to` this starts
    /// one, mirroring what 2D canvas APIs do.
    pub fn line_to(&mut self, p: Pos2) {
        match self.contours.last_mut() {
            Some(c) if !c.closed => c.points.push(p),
            _ => self.move_to(p),
        }
    }

    /// Close the current contour back to its first point.
    pub fn close(&mut self) {
        if let Some(c) = self.contours.last_mut()
            && c.points.len() >= 2
        {
            c.closed = true;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.contours.iter().all(|c| c.points.len() < 2)
    }

    pub fn contours(&self) -> &[Contour] {
        &self.contours
    }

    /// Axis-aligned bounds over every point, or `None` for an empty path.
    pub fn bounds(&self) -> Option<Rect> {
        let mut min_x = f32::MAX;
        let mut min_y = f32::MAX;
        let mut max_x = f32::MIN;
        let mut max_y = f32::MIN;
        let mut any = false;
        for c in &self.contours {
            for p in &c.points {
                min_x = min_x.min(p.x);
                min_y = min_y.min(p.y);
                max_x = max_x.max(p.x);
                max_y = max_y.max(p.y);
                any = true;
            }
        }
        any.then(|| Rect::from_min_max(pos2(min_x, min_y), pos2(max_x, max_y)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polygon_builder_closes_contour() {
        let path = Path::from_polygon(&[pos2(0.0, 0.0), pos2(10.0, 0.0), pos2(10.0, 10.0)]);
        assert_eq!(path.contours().len(), 1);
        assert!(path.contours()[0].closed);
        assert_eq!(path.contours()[0].points.len(), 3);
    }

    #[test]
    fn bounds_cover_all_contours() {
        let mut path = Path::new();
        path.move_to(pos2(5.0, 5.0));
        path.line_to(pos2(20.0, -3.0));
        path.move_to(pos2(-1.0, 8.0));
        path.line_to(pos2(2.0, 9.0));
        let b = path.bounds().unwrap();
        assert_eq!(b.min, pos2(-1.0, -3.0));
        assert_eq!(b.max, pos2(20.0, 9.0));
    }

    #[test]
    fn empty_path_has_no_bounds() {
        assert!(Path::new().bounds().is_none());
        assert!(Path::new().is_empty());
    }
}
