//! Frame-driven animation runs scheduled against a monotonic clock.
//!
//! Runs are advanced by [`Sequencer::tick`], normally once per rendered
//! frame. Every run reports interpolation fractions to its update callback
//! and fires its completion callback exactly once, unless it is canceled
//! first, in which case neither callback runs again.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::debug;
use parking_lot::Mutex;

/// Source of monotonic time for the sequencer.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Clock backed by [`Instant::now`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to. Used for tests and scripted replay.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    elapsed: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            elapsed: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.elapsed.lock() += by;
    }

    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + *self.elapsed.lock()
    }
}

/// Handle of a scheduled run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnimationId(u64);

impl fmt::Display for AnimationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "animation#{}", self.0)
    }
}

type UpdateFn = Box<dyn FnMut(f32) + Send>;
type CompleteFn = Box<dyn FnOnce() + Send>;

struct Run {
    id: AnimationId,
    started_at: Instant,
    duration: Duration,
    last_fraction: f32,
    update: UpdateFn,
    on_complete: Option<CompleteFn>,
}

/// Largest `f32` below `1.0`.
const LAST_PARTIAL_FRACTION: f32 = 1.0 - f32::EPSILON / 2.0;

impl Run {
    fn is_finished_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.started_at) >= self.duration
    }

    /// Progress for `update`; reaches `1.0` only once the run is finished.
    fn fraction_at(&self, now: Instant) -> f32 {
        if self.is_finished_at(now) {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started_at);
        let fraction = elapsed.as_secs_f32() / self.duration.as_secs_f32();
        fraction.clamp(0.0, LAST_PARTIAL_FRACTION)
    }
}

/// Drives single-shot animation runs.
pub struct Sequencer {
    clock: Arc<dyn Clock>,
    runs: Vec<Run>,
    next_id: u64,
}

impl fmt::Debug for Sequencer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sequencer")
            .field("active", &self.runs.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}

impl Sequencer {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            runs: Vec::new(),
            next_id: 0,
        }
    }

    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    /// Schedules a run starting now.
    ///
    /// `update` receives non-decreasing fractions in `[0, 1]` on every tick
    /// and is called with `1.0` right before `on_complete`, which fires once
    /// on the first tick at least `duration` after scheduling.
    pub fn run<U, C>(&mut self, duration: Duration, update: U, on_complete: C) -> AnimationId
    where
        U: FnMut(f32) + Send + 'static,
        C: FnOnce() + Send + 'static,
    {
        let id = AnimationId(self.next_id);
        self.next_id += 1;
        self.runs.push(Run {
            id,
            started_at: self.clock.now(),
            duration,
            last_fraction: 0.0,
            update: Box::new(update),
            on_complete: Some(Box::new(on_complete)),
        });
        debug!("scheduled {id} for {duration:?}");
        id
    }

    /// Advances every run and returns the ids that completed on this tick.
    pub fn tick(&mut self) -> Vec<AnimationId> {
        let now = self.clock.now();
        let mut completed = Vec::new();
        for run in &mut self.runs {
            let finished = run.is_finished_at(now);
            let fraction = run.fraction_at(now).max(run.last_fraction);
            run.last_fraction = fraction;
            (run.update)(fraction);
            if finished {
                if let Some(on_complete) = run.on_complete.take() {
                    on_complete();
                }
                completed.push(run.id);
            }
        }
        self.runs.retain(|run| run.on_complete.is_some());
        completed
    }

    /// Drops a pending run without invoking any of its callbacks.
    pub fn cancel(&mut self, id: AnimationId) -> bool {
        let before = self.runs.len();
        self.runs.retain(|run| run.id != id);
        let canceled = self.runs.len() != before;
        if canceled {
            debug!("canceled {id}");
        }
        canceled
    }

    pub fn is_active(&self, id: AnimationId) -> bool {
        self.runs.iter().any(|run| run.id == id)
    }

    pub fn active_count(&self) -> usize {
        self.runs.len()
    }
}

/// Cubic ease-in-out over `[0, 1]`.
pub fn ease_in_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}
