// ============================================================================
// STROKE SMOOTHING — spring-damper integrator for freehand pointer input
// ============================================================================

use egui::{Pos2, Vec2};

/// Number of integration sub-steps (and emitted positions) per raw sample.
pub const OVERSAMPLE: usize = 4;

/// Spring coupling between the raw pointer target and the smoothed cursor.
const INVERSE_MASS: f32 = 1.0;

/// Per-gesture smoothing state: the smoothed cursor chases each raw pointer
/// sample like a critically damped spring, emitting `OVERSAMPLE` intermediate
/// positions per sample so the brush trail stays dense at any drag speed.
///
/// State lives for exactly one gesture; `reset` re-seeds it at the next
/// gesture's first sample with zero velocity and acceleration.
#[derive(Clone, Debug)]
pub struct StrokeSmoother {
    pos: Pos2,
    vel: Vec2,
    acc: Vec2,
}

impl StrokeSmoother {
    pub fn new(start: Pos2) -> Self {
        StrokeSmoother {
            pos: start,
            vel: Vec2::ZERO,
            acc: Vec2::ZERO,
        }
    }

    pub fn reset(&mut self, start: Pos2) {
        *self = StrokeSmoother::new(start);
    }

    pub fn position(&self) -> Pos2 {
        self.pos
    }

    pub fn velocity(&self) -> Vec2 {
        self.vel
    }

    pub fn acceleration(&self) -> Vec2 {
        self.acc
    }

    /// Chase `target` for one input sample and return the intermediate
    /// positions passed through, oldest first.
    ///
    /// The velocity delta toward `(vel + spring) * damping` is spread over
    /// the sub-steps as a constant jerk, chosen in closed form so the last
    /// sub-step lands exactly on the desired velocity. Integration is
    /// forward Euler and only conditionally stable; `damping` must stay
    /// within the range `SmoothingConfig` enforces (0.01, 0.1].
    pub fn advance(&mut self, target: Pos2, damping: f32) -> [Pos2; OVERSAMPLE] {
        let mut acc = (target - self.pos) * INVERSE_MASS;
        let desired_vel = (self.vel + acc) * damping;
        let n = OVERSAMPLE as f32;
        let delta_acc = (desired_vel - self.vel - acc * n) * (2.0 / (n * (n + 1.0)));

        let mut out = [self.pos; OVERSAMPLE];
        for slot in &mut out {
            acc += delta_acc;
            // Position consumes the pre-update velocity. Updating velocity
            // first leaves an undamped two-step oscillation that never
            // settles on a stationary target.
            self.pos += self.vel;
            self.vel += acc;
            *slot = self.pos;
        }
        self.acc = acc;
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;

    #[test]
    fn emits_fixed_count_regardless_of_distance() {
        let mut near = StrokeSmoother::new(pos2(0.0, 0.0));
        let mut far = StrokeSmoother::new(pos2(0.0, 0.0));
        assert_eq!(near.advance(pos2(0.5, 0.0), 0.05).len(), OVERSAMPLE);
        assert_eq!(far.advance(pos2(4000.0, -900.0), 0.05).len(), OVERSAMPLE);
    }

    #[test]
    fn first_substep_repeats_the_seed() {
        // A fresh gesture has zero velocity, so the first emitted position is
        // still the seed point.
        let mut smoother = StrokeSmoother::new(pos2(3.0, 4.0));
        let out = smoother.advance(pos2(40.0, 4.0), 0.05);
        assert_eq!(out[0], pos2(3.0, 4.0));
        assert!(out[3].x > out[0].x);
    }

    #[test]
    fn last_substep_lands_on_desired_velocity() {
        let mut smoother = StrokeSmoother::new(pos2(0.0, 0.0));
        let target = pos2(60.0, -20.0);
        let damping = 0.07;
        let spring = target - pos2(0.0, 0.0);
        let desired = spring * damping;
        smoother.advance(target, damping);
        assert!((smoother.velocity() - desired).length() < 1e-3);
    }

    #[test]
    fn converges_on_repeated_target() {
        for &damping in &[0.02, 0.05, 0.1] {
            let mut smoother = StrokeSmoother::new(pos2(0.0, 0.0));
            let target = pos2(100.0, 40.0);
            for _ in 0..1500 {
                smoother.advance(target, damping);
            }
            let dist = (target - smoother.position()).length();
            assert!(
                dist < 0.1,
                "damping {damping}: cursor stopped {dist} px from target"
            );
            assert!(smoother.velocity().length() < 0.05);
            assert!(smoother.acceleration().length() < 0.05);
        }
    }

    #[test]
    fn reset_discards_gesture_state() {
        let mut smoother = StrokeSmoother::new(pos2(0.0, 0.0));
        smoother.advance(pos2(50.0, 50.0), 0.1);
        smoother.reset(pos2(7.0, 9.0));
        assert_eq!(smoother.position(), pos2(7.0, 9.0));
        assert_eq!(smoother.velocity(), Vec2::ZERO);
        assert_eq!(smoother.acceleration(), Vec2::ZERO);
    }
}
