// ============================================================================
// INKSTAGE — smoothed-stroke drawing stage with a software raster engine
// ============================================================================
//
// Module map:
//   raster    — surfaces, paths, paints, and the scanline/SDF rasterizer
//   ops       — geometry helpers, the spring-damper smoother, shape resolution
//   config    — tool settings records with clamping setters
//   brush     — cached stamp rasterizer for the pen and eraser
//   gesture   — pointer bookkeeping and the two-pointer transform seed
//   selection — lasso cut, floating image, marching-ants overlay
//   session   — per-stage state machine tying the above together
//   app       — eframe shell: panels, stage texture, input routing
// ============================================================================

pub mod app;
pub mod brush;
pub mod config;
pub mod gesture;
pub mod ops;
pub mod raster;
pub mod selection;
pub mod session;

pub use app::InkstageApp;
pub use session::DrawingSession;
