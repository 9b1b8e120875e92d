// ============================================================================
// GEOMETRY — small pure helpers shared by gestures, tools, and the rasterizer
// ============================================================================

use egui::{Pos2, pos2};

/// Mean position of a point set. `None` when empty.
pub fn centroid(points: &[Pos2]) -> Option<Pos2> {
    if points.is_empty() {
        return None;
    }
    let mut x = 0.0;
    let mut y = 0.0;
    for p in points {
        x += p.x;
        y += p.y;
    }
    let n = points.len() as f32;
    Some(pos2(x / n, y / n))
}

#[inline]
pub fn distance(a: Pos2, b: Pos2) -> f32 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    (dx * dx + dy * dy).sqrt()
}

#[inline]
pub fn distance_sq(a: Pos2, b: Pos2) -> f32 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    dx * dx + dy * dy
}

/// Angle of the vector a→b in radians, `atan2` convention.
#[inline]
pub fn angle(a: Pos2, b: Pos2) -> f32 {
    (b.y - a.y).atan2(b.x - a.x)
}

#[inline]
pub fn lerp(a: Pos2, b: Pos2, t: f32) -> Pos2 {
    pos2(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
}

/// Expand the segment a→b into a quad offset by `half_width` along the
/// segment normal on each side. A zero-length segment yields a degenerate
/// quad that rasterizes to nothing.
pub fn segment_quad(a: Pos2, b: Pos2, half_width: f32) -> [Pos2; 4] {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len = (dx * dx + dy * dy).sqrt();
    if len < 1e-6 {
        return [a, a, b, b];
    }
    let nx = -dy / len * half_width;
    let ny = dx / len * half_width;
    [
        pos2(a.x + nx, a.y + ny),
        pos2(b.x + nx, b.y + ny),
        pos2(b.x - nx, b.y - ny),
        pos2(a.x - nx, a.y - ny),
    ]
}

/// Integer pixel bounding box of a polygon: floor of the min corner, extents
/// rounded up from there, never smaller than 1×1. `None` when empty.
pub fn polygon_bounds(points: &[Pos2]) -> Option<(i32, i32, u32, u32)> {
    if points.is_empty() {
        return None;
    }
    let mut min_x = f32::MAX;
    let mut min_y = f32::MAX;
    let mut max_x = f32::MIN;
    let mut max_y = f32::MIN;
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    let bx = min_x.floor() as i32;
    let by = min_y.floor() as i32;
    let bw = ((max_x - bx as f32).ceil() as i64).max(1) as u32;
    let bh = ((max_y - by as f32).ceil() as i64).max(1) as u32;
    Some((bx, by, bw, bh))
}

/// Split a polyline into dashed sub-segments. `on`/`off` are the dash and gap
/// lengths, `phase` shifts the pattern along the path (marching ants feed an
/// advancing phase here). Degenerate patterns fall back to solid segments.
pub fn dash_polyline(
    points: &[Pos2],
    closed: bool,
    on: f32,
    off: f32,
    phase: f32,
) -> Vec<(Pos2, Pos2)> {
    let mut segments: Vec<(Pos2, Pos2)> = points.windows(2).map(|s| (s[0], s[1])).collect();
    if closed && points.len() > 2 {
        segments.push((points[points.len() - 1], points[0]));
    }

    let period = on + off;
    if on <= 0.0 || off <= 0.0 || period <= 0.0 {
        return segments;
    }

    let mut out = Vec::new();
    let mut travelled = 0.0f32;
    for (a, b) in segments {
        let len = distance(a, b);
        if len < 1e-6 {
            continue;
        }
        let mut local = 0.0f32;
        while local < len {
            let pat = (travelled + local + phase).rem_euclid(period);
            if pat < on {
                let run = (on - pat).min(len - local).max(1e-4);
                out.push((lerp(a, b, local / len), lerp(a, b, (local + run) / len)));
                local += run;
            } else {
                let run = (period - pat).min(len - local).max(1e-4);
                local += run;
            }
        }
        travelled += len;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centroid_of_square_corners() {
        let c = centroid(&[
            pos2(0.0, 0.0),
            pos2(10.0, 0.0),
            pos2(10.0, 10.0),
            pos2(0.0, 10.0),
        ])
        .unwrap();
        assert_eq!(c, pos2(5.0, 5.0));
        assert!(centroid(&[]).is_none());
    }

    #[test]
    fn angle_follows_atan2_convention() {
        assert_eq!(angle(pos2(0.0, 0.0), pos2(5.0, 0.0)), 0.0);
        let quarter = angle(pos2(0.0, 0.0), pos2(0.0, 3.0));
        assert!((quarter - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn segment_quad_offsets_by_half_width() {
        let quad = segment_quad(pos2(0.0, 0.0), pos2(10.0, 0.0), 2.0);
        assert_eq!(quad[0], pos2(0.0, 2.0));
        assert_eq!(quad[1], pos2(10.0, 2.0));
        assert_eq!(quad[2], pos2(10.0, -2.0));
        assert_eq!(quad[3], pos2(0.0, -2.0));
    }

    #[test]
    fn polygon_bounds_floor_and_ceil() {
        let b = polygon_bounds(&[pos2(0.0, 0.0), pos2(20.0, 0.0), pos2(20.0, 20.0)]).unwrap();
        assert_eq!(b, (0, 0, 20, 20));
        let b = polygon_bounds(&[pos2(1.3, 2.7), pos2(4.2, 5.1)]).unwrap();
        assert_eq!(b, (1, 2, 3, 4));
        // Never below 1×1, even for a single point.
        let b = polygon_bounds(&[pos2(7.5, 7.5)]).unwrap();
        assert_eq!(b, (7, 7, 1, 1));
    }

    #[test]
    fn dash_covers_on_fraction_of_path() {
        let segs = dash_polyline(&[pos2(0.0, 0.0), pos2(28.0, 0.0)], false, 8.0, 6.0, 0.0);
        let total: f32 = segs.iter().map(|(a, b)| distance(*a, *b)).sum();
        // 28 = 2 full periods of 14: exactly two 8-long dashes.
        assert!((total - 16.0).abs() < 0.01);
        assert_eq!(segs.len(), 2);
    }

    #[test]
    fn dash_phase_shifts_pattern() {
        let segs = dash_polyline(&[pos2(0.0, 0.0), pos2(14.0, 0.0)], false, 8.0, 6.0, 6.0);
        // Pattern position starts at 6: 2 px of dash, 6 px gap, then 6 px of
        // the next dash runs to the segment end.
        assert_eq!(segs.len(), 2);
        assert!((segs[0].1.x - 2.0).abs() < 0.01);
        assert!((segs[1].0.x - 8.0).abs() < 0.01);
    }
}
