//! Playback gating on visibility, focus, play flag and motion preference.

/// Margin around the viewport, in pixels, within which a view starts
/// loading its bundle.
pub const PRELOAD_MARGIN_PX: f64 = 400.0;

/// Fraction of a view that must be on screen for it to play.
pub const PLAY_VISIBILITY_THRESHOLD: f64 = 0.1;

/// What the host currently reports about a view.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HostState {
    /// Within [`PRELOAD_MARGIN_PX`] of the viewport.
    pub near_viewport: bool,
    /// At least [`PLAY_VISIBILITY_THRESHOLD`] of the view is visible.
    pub intersecting: bool,
    /// The host window has input focus.
    pub focused: bool,
    /// The user asked the platform to minimize motion.
    pub reduced_motion: bool,
}

/// Change reported by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostSignal {
    Viewport { near: bool, intersecting: bool },
    Focus(bool),
    ReducedMotion(bool),
}

/// Viewport signal for a view spanning `top..bottom` in a viewport of
/// `viewport_height`, all in pixels relative to the viewport top.
///
/// ```rust
/// use rune_ascii_core::lifecycle::{viewport_signal, HostSignal};
///
/// // 300 px below the fold: loading, not playing
/// assert_eq!(
///     viewport_signal(1100.0, 1300.0, 800.0),
///     HostSignal::Viewport { near: true, intersecting: false }
/// );
/// ```
pub fn viewport_signal(top: f64, bottom: f64, viewport_height: f64) -> HostSignal {
    let near = bottom > -PRELOAD_MARGIN_PX && top < viewport_height + PRELOAD_MARGIN_PX;
    let height = bottom - top;
    let visible = bottom.min(viewport_height) - top.max(0.0);
    let intersecting = height > 0.0 && visible > 0.0 && visible / height >= PLAY_VISIBILITY_THRESHOLD;
    HostSignal::Viewport { near, intersecting }
}

impl HostState {
    /// Viewport signal from a host that reports nearness and visibility
    /// separately. The half left as `None` keeps its current value.
    pub fn viewport_update(&self, near: Option<bool>, intersecting: Option<bool>) -> HostSignal {
        HostSignal::Viewport {
            near: near.unwrap_or(self.near_viewport),
            intersecting: intersecting.unwrap_or(self.intersecting),
        }
    }
}

/// Effect of a signal on the timing engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    Start,
    Stop,
    Unchanged,
}

/// Decides when playback may run.
///
/// Running requires the view to be intersecting, the window focused, the
/// play flag set and reduced motion off. Loading only requires the view to
/// come near the viewport once.
#[derive(Clone, Debug)]
pub struct LifecycleController {
    host: HostState,
    playing: bool,
    load_requested: bool,
}

impl LifecycleController {
    pub fn new(host: HostState, playing: bool) -> Self {
        Self {
            host,
            playing,
            load_requested: false,
        }
    }

    #[inline]
    pub fn host(&self) -> HostState {
        self.host
    }

    #[inline]
    pub fn playing(&self) -> bool {
        self.playing
    }

    /// Whether the timing engine may run.
    pub fn should_run(&self) -> bool {
        self.playing && self.host.intersecting && self.host.focused && !self.host.reduced_motion
    }

    /// Apply a host signal.
    pub fn apply(&mut self, signal: HostSignal) -> Transition {
        let before = self.should_run();
        match signal {
            HostSignal::Viewport { near, intersecting } => {
                self.host.near_viewport = near;
                self.host.intersecting = intersecting;
            }
            HostSignal::Focus(focused) => self.host.focused = focused,
            HostSignal::ReducedMotion(reduced) => self.host.reduced_motion = reduced,
        }
        self.transition(before)
    }

    /// Set the caller's play flag.
    pub fn set_playing(&mut self, playing: bool) -> Transition {
        let before = self.should_run();
        self.playing = playing;
        self.transition(before)
    }

    /// Returns `true` exactly once, the first time the view is near or in
    /// the viewport.
    pub fn take_load_request(&mut self) -> bool {
        if self.load_requested || !(self.host.near_viewport || self.host.intersecting) {
            return false;
        }
        self.load_requested = true;
        true
    }

    fn transition(&self, before: bool) -> Transition {
        match (before, self.should_run()) {
            (false, true) => Transition::Start,
            (true, false) => Transition::Stop,
            _ => Transition::Unchanged,
        }
    }
}

/// Boxed listener for host signals.
pub type SignalListener = Box<dyn FnMut(HostSignal)>;

/// Host capability reporting viewport and focus changes.
pub trait VisibilityAndFocusSource {
    /// Current state, used to seed a controller.
    fn snapshot(&self) -> HostState;
    /// Receive every later change.
    fn subscribe(&mut self, listener: SignalListener);
}

/// In-process signal source: the host calls [`SignalHub::emit`] from its
/// observers and the hub fans out to subscribers.
#[derive(Default)]
pub struct SignalHub {
    state: HostState,
    listeners: Vec<SignalListener>,
}

impl SignalHub {
    pub fn new(state: HostState) -> Self {
        Self {
            state,
            listeners: Vec::new(),
        }
    }

    /// Record a change and notify every subscriber.
    pub fn emit(&mut self, signal: HostSignal) {
        match signal {
            HostSignal::Viewport { near, intersecting } => {
                self.state.near_viewport = near;
                self.state.intersecting = intersecting;
            }
            HostSignal::Focus(focused) => self.state.focused = focused,
            HostSignal::ReducedMotion(reduced) => self.state.reduced_motion = reduced,
        }
        for listener in &mut self.listeners {
            listener(signal);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl std::fmt::Debug for SignalHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalHub")
            .field("state", &self.state)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl VisibilityAndFocusSource for SignalHub {
    fn snapshot(&self) -> HostState {
        self.state
    }

    fn subscribe(&mut self, listener: SignalListener) {
        self.listeners.push(listener);
    }
}
