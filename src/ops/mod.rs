// ============================================================================
// OPS MODULE — pure, stateless-or-small-state algorithms behind the tools
// ============================================================================
//
// Architecture:
//   geometry.rs  — centroid/distance/angle, segment quads, polygon bounds,
//                  dash walking
//   smoothing.rs — spring-damper stroke smoother (per-gesture integrator)
//   shapes.rs    — primitive shape resolution for the shape tool
// ============================================================================

pub mod geometry;
pub mod shapes;
pub mod smoothing;
