//! Drift-corrected playback clock.
//!
//! The host drives the clock with one callback per display refresh, passing
//! a monotonically increasing timestamp in milliseconds. The clock keeps its
//! reference time on a fixed `1000 / fps` grid instead of resetting it on
//! every callback, so scheduling jitter never accumulates into speed-up or
//! slow-down.

/// Playback rate used when neither the caller nor the bundle provides one.
pub const DEFAULT_FPS: f64 = 30.0;

/// Slack for comparing accumulated frame times, in milliseconds.
///
/// Timestamps spaced exactly `1000 / fps` apart can land a hair below the
/// frame time after repeated float addition.
pub const FRAME_TIME_EPSILON_MS: f64 = 1e-6;

/// Highest accepted playback rate: one frame per millisecond.
///
/// Bounds the number of frames a single callback can advance through.
pub const MAX_FPS: f64 = 1000.0;

/// Loop mode for animation playback.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoopMode {
    /// Stop at the end of the animation
    Once,
    /// Loop back to start when reaching the end
    #[default]
    Loop,
}

/// How the clock catches up after the host stalls for several frame times.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CatchUp {
    /// Advance and render once per elapsed frame time. Every frame index is
    /// reported, at the cost of several renders in one callback.
    #[default]
    EveryFrame,
    /// Jump over all elapsed frames at once and render only the last one.
    DropFrames,
}

/// Current state of the clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockState {
    /// Not scheduled; holds its frame index.
    Stopped,
    /// Scheduled with the host.
    Running,
    /// Reached the end in `LoopMode::Once`. Stopped until rewound.
    Finished,
}

/// Host capability delivering one callback per display refresh.
pub trait Scheduler {
    /// Ask for one more callback.
    fn request_tick(&mut self);
    /// Withdraw an outstanding request.
    fn cancel_tick(&mut self);
}

/// Scheduler that only records requests; the caller delivers ticks itself.
///
/// Useful for tests and for hosts that run their own frame loop.
#[derive(Clone, Debug, Default)]
pub struct ManualScheduler {
    pending: bool,
    requests: usize,
    cancellations: usize,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a callback has been requested and not yet delivered.
    #[inline]
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Consume the pending request, returning whether there was one.
    pub fn take(&mut self) -> bool {
        std::mem::replace(&mut self.pending, false)
    }

    /// Total number of requests seen.
    pub fn requests(&self) -> usize {
        self.requests
    }

    /// Total number of cancellations seen.
    pub fn cancellations(&self) -> usize {
        self.cancellations
    }
}

impl Scheduler for ManualScheduler {
    fn request_tick(&mut self) {
        self.pending = true;
        self.requests += 1;
    }

    fn cancel_tick(&mut self) {
        self.pending = false;
        self.cancellations += 1;
    }
}

/// Receiver of clock notifications.
pub trait PlaybackEvents {
    /// Display the frame at `index`.
    fn render(&mut self, index: usize);
    /// Called after every advance, paired with `render`.
    fn frame(&mut self, _index: usize) {}
    /// Called once when a non-looping run reaches its end.
    fn complete(&mut self) {}
}

/// Fixed-step, drift-corrected frame clock.
///
/// ## Example
///
/// ```rust
/// use rune_ascii_core::timing::{ManualScheduler, PlaybackClock, PlaybackEvents};
///
/// struct Log(Vec<usize>);
/// impl PlaybackEvents for Log {
///     fn render(&mut self, index: usize) {
///         self.0.push(index);
///     }
/// }
///
/// let mut scheduler = ManualScheduler::new();
/// let mut clock = PlaybackClock::new(50.0); // 20 ms per frame
/// clock.set_frame_count(3);
/// clock.start(&mut scheduler);
///
/// let mut log = Log(Vec::new());
/// for now in [1000.0, 1020.0, 1040.0, 1060.0] {
///     clock.tick(now, &mut scheduler, &mut log);
/// }
/// // first callback only latches the reference time
/// assert_eq!(log.0, vec![1, 2, 0]);
/// ```
#[derive(Clone, Debug)]
pub struct PlaybackClock {
    frame_index: usize,
    frame_count: usize,
    fps: f64,
    loop_mode: LoopMode,
    catch_up: CatchUp,
    state: ClockState,
    /// Reference time of the current frame; `None` until the first callback
    /// after a start.
    last_tick: Option<f64>,
}

impl PlaybackClock {
    /// Create a stopped clock. Invalid rates fall back to [`DEFAULT_FPS`].
    pub fn new(fps: f64) -> Self {
        Self {
            frame_index: 0,
            frame_count: 0,
            fps: valid_fps(fps).unwrap_or(DEFAULT_FPS),
            loop_mode: LoopMode::Loop,
            catch_up: CatchUp::EveryFrame,
            state: ClockState::Stopped,
            last_tick: None,
        }
    }

    /// Set the total number of frames.
    pub fn set_frame_count(&mut self, count: usize) {
        self.frame_count = count;
        // Clamp current frame to valid range
        if self.frame_index >= count {
            self.frame_index = count.saturating_sub(1);
        }
    }

    /// Get the total number of frames.
    #[inline]
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Set the playback rate. Takes effect on the next callback; invalid
    /// rates are ignored.
    pub fn set_fps(&mut self, fps: f64) {
        if let Some(fps) = valid_fps(fps) {
            self.fps = fps;
        }
    }

    #[inline]
    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Duration of one frame in milliseconds.
    #[inline]
    pub fn frame_time_ms(&self) -> f64 {
        1000.0 / self.fps
    }

    /// Set the loop mode.
    pub fn set_loop_mode(&mut self, mode: LoopMode) {
        self.loop_mode = mode;
        // If we were finished and now set to loop, allow resuming
        if mode == LoopMode::Loop && self.state == ClockState::Finished {
            self.state = ClockState::Stopped;
        }
    }

    #[inline]
    pub fn loop_mode(&self) -> LoopMode {
        self.loop_mode
    }

    pub fn set_catch_up(&mut self, catch_up: CatchUp) {
        self.catch_up = catch_up;
    }

    #[inline]
    pub fn catch_up(&self) -> CatchUp {
        self.catch_up
    }

    #[inline]
    pub fn state(&self) -> ClockState {
        self.state
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.state == ClockState::Running
    }

    /// Get the current frame index.
    #[inline]
    pub fn current_frame(&self) -> usize {
        self.frame_index
    }

    /// Jump to a frame, clamped to the valid range.
    pub fn seek(&mut self, frame: usize) {
        self.frame_index = frame.min(self.frame_count.saturating_sub(1));
    }

    /// Return to frame 0. A finished clock becomes startable again.
    pub fn rewind(&mut self) {
        self.frame_index = 0;
        if self.state == ClockState::Finished {
            self.state = ClockState::Stopped;
        }
    }

    /// Start ticking. No-op while running, after finishing, or without
    /// frames. Returns whether the clock was started.
    pub fn start<S: Scheduler + ?Sized>(&mut self, scheduler: &mut S) -> bool {
        if self.state != ClockState::Stopped || self.frame_count == 0 {
            return false;
        }
        self.state = ClockState::Running;
        self.last_tick = None;
        scheduler.request_tick();
        true
    }

    /// Stop ticking. No further renders happen until the next `start`.
    /// Returns whether the clock was running.
    pub fn stop<S: Scheduler + ?Sized>(&mut self, scheduler: &mut S) -> bool {
        if self.state != ClockState::Running {
            return false;
        }
        self.state = ClockState::Stopped;
        self.last_tick = None;
        scheduler.cancel_tick();
        true
    }

    /// Handle one host callback at timestamp `now` (milliseconds).
    ///
    /// Returns the number of frame indices advanced. Reschedules itself
    /// unless stopped or finished.
    pub fn tick<S, E>(&mut self, now: f64, scheduler: &mut S, events: &mut E) -> usize
    where
        S: Scheduler + ?Sized,
        E: PlaybackEvents + ?Sized,
    {
        if self.state != ClockState::Running {
            return 0;
        }

        let advanced = match self.last_tick {
            None => {
                self.last_tick = Some(now);
                0
            }
            Some(last) => match self.catch_up {
                CatchUp::EveryFrame => self.advance_each(now, last, events),
                CatchUp::DropFrames => self.advance_skipping(now, last, events),
            },
        };

        if self.state == ClockState::Running {
            scheduler.request_tick();
        }
        advanced
    }

    fn advance_each<E: PlaybackEvents + ?Sized>(&mut self, now: f64, mut last: f64, events: &mut E) -> usize {
        let frame_time = self.frame_time_ms();
        let mut delta = now - last;
        let mut advanced = 0;

        while delta + FRAME_TIME_EPSILON_MS >= frame_time {
            if self.frame_count > 0 {
                let next = self.frame_index + 1;
                if next >= self.frame_count && self.loop_mode == LoopMode::Once {
                    self.finish(events);
                    return advanced;
                }
                self.frame_index = next % self.frame_count;
                advanced += 1;
                events.render(self.frame_index);
                events.frame(self.frame_index);
            }
            delta -= frame_time;
            last += frame_time;
        }

        self.last_tick = Some(last);
        advanced
    }

    fn advance_skipping<E: PlaybackEvents + ?Sized>(&mut self, now: f64, last: f64, events: &mut E) -> usize {
        let frame_time = self.frame_time_ms();
        let steps = ((now - last + FRAME_TIME_EPSILON_MS) / frame_time).floor().max(0.0) as usize;
        if steps == 0 {
            return 0;
        }
        self.last_tick = Some(last + steps as f64 * frame_time);
        if self.frame_count == 0 {
            return 0;
        }

        if self.loop_mode == LoopMode::Once {
            let past_end = self
                .frame_index
                .checked_add(steps)
                .map_or(true, |target| target >= self.frame_count);
            if past_end {
                self.finish(events);
                return steps;
            }
        }
        if steps > 1 {
            log::trace!("dropped {} frames after a stalled callback", steps - 1);
        }
        self.frame_index = (self.frame_index + steps % self.frame_count) % self.frame_count;
        events.render(self.frame_index);
        events.frame(self.frame_index);
        steps
    }

    /// Clamp to the last frame, show it, and stop without rescheduling.
    fn finish<E: PlaybackEvents + ?Sized>(&mut self, events: &mut E) {
        self.frame_index = self.frame_count - 1;
        self.state = ClockState::Finished;
        self.last_tick = None;
        events.render(self.frame_index);
        events.complete();
    }
}

fn valid_fps(fps: f64) -> Option<f64> {
    (fps.is_finite() && fps > 0.0 && fps <= MAX_FPS).then_some(fps)
}
