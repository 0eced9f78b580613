use crate::chess::{Piece, Square};
use crate::geometry::Point;
use std::time::{Duration, Instant};

/// A piece gliding across the board.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Animation {
    square: Square,
    piece: Piece,
    whence: Point,
    whither: Point,
    start: Instant,
    duration: Duration,
}

impl Animation {
    /// The [`Square`] where the moving piece now stands.
    pub fn square(&self) -> Square {
        self.square
    }

    /// The moving piece.
    pub fn piece(&self) -> Piece {
        self.piece
    }

    /// Whether the piece is still in motion.
    pub fn is_active(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.start) < self.duration
    }

    /// The fraction of the motion completed, clamped to `[0, 1]`.
    pub fn progress(&self, now: Instant) -> f64 {
        let elapsed = now.saturating_duration_since(self.start);
        if elapsed >= self.duration {
            1.
        } else {
            (elapsed.as_secs_f64() / self.duration.as_secs_f64()).clamp(0., 1.)
        }
    }

    /// Where the piece is drawn, linearly interpolated between both ends.
    pub fn sample(&self, now: Instant) -> Point {
        let t = self.progress(now);
        let lerp = |a: i32, b: i32| a + ((f64::from(b) - f64::from(a)) * t).round() as i32;
        Point::new(
            lerp(self.whence.x, self.whither.x),
            lerp(self.whence.y, self.whither.y),
        )
    }
}

/// Schedules at most one [`Animation`] at a time.
///
/// Completion is not signaled, it is observed by polling [`Animator::settle`].
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct Animator(Option<Animation>);

impl Animator {
    /// Starts moving a piece between two points on the screen.
    ///
    /// Callers must not start a new animation while one is still active.
    pub fn start(
        &mut self,
        square: Square,
        piece: Piece,
        whence: Point,
        whither: Point,
        now: Instant,
        duration: Duration,
    ) {
        debug_assert!(!self.is_active(now), "an animation is already in progress");

        self.0 = Some(Animation {
            square,
            piece,
            whence,
            whither,
            start: now,
            duration,
        });
    }

    /// The current animation, if any, whether active or finished but not yet settled.
    pub fn current(&self) -> Option<&Animation> {
        self.0.as_ref()
    }

    /// Whether an animation is in progress.
    pub fn is_active(&self, now: Instant) -> bool {
        self.0.as_ref().map_or(false, |a| a.is_active(now))
    }

    /// Clears a finished animation, returning whether one just completed.
    pub fn settle(&mut self, now: Instant) -> bool {
        match &self.0 {
            Some(a) if !a.is_active(now) => {
                self.0 = None;
                true
            }

            _ => false,
        }
    }
}
