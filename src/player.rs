//! One animated view.
//!
//! A [`Player`] owns a display surface and a scheduler and wires together
//! the decoder, the timing clock, the renderer, lifecycle gating and load
//! bookkeeping. Hosts feed it three things: loaded bundles, scheduler
//! callbacks ([`Player::tick`]) and host signals ([`Player::handle_signal`]).

use std::cell::RefCell;

use crate::config::PlayerOptions;
use crate::data::{AnimationBundle, AnimationMeta};
use crate::decode::DecodedFrames;
use crate::error::Result;
use crate::lifecycle::{HostSignal, HostState, LifecycleController, Transition};
use crate::loader::{load_bundle, BundleSource, BundleTransport, CdnConfig, LoadGuard, LoadPhase, LoadTicket};
use crate::render::{FrameRenderer, RenderStrategy};
use crate::surface::DisplaySurface;
use crate::timing::{LoopMode, PlaybackClock, PlaybackEvents, Scheduler};

type FrameCallback = Box<dyn FnMut(usize)>;
type CompleteCallback = Box<dyn FnMut()>;

/// Borrowed view of a player's render path, handed to the clock per tick.
struct TickEvents<'a, S: DisplaySurface> {
    surface: &'a mut S,
    renderer: &'a mut FrameRenderer<S::Handle>,
    frames: &'a DecodedFrames,
    on_frame: &'a mut Option<FrameCallback>,
    on_complete: &'a mut Option<CompleteCallback>,
}

impl<S: DisplaySurface> PlaybackEvents for TickEvents<'_, S> {
    fn render(&mut self, index: usize) {
        self.renderer.render(&mut *self.surface, self.frames, index);
    }

    fn frame(&mut self, index: usize) {
        if let Some(callback) = self.on_frame.as_mut() {
            callback(index);
        }
    }

    fn complete(&mut self) {
        if let Some(callback) = self.on_complete.as_mut() {
            callback();
        }
    }
}

fn loop_mode(looping: bool) -> LoopMode {
    if looping {
        LoopMode::Loop
    } else {
        LoopMode::Once
    }
}

/// Playback of one bundle on one surface.
pub struct Player<S: DisplaySurface, K: Scheduler> {
    surface: S,
    scheduler: K,
    clock: PlaybackClock,
    renderer: FrameRenderer<S::Handle>,
    frames: Option<DecodedFrames>,
    meta: Option<AnimationMeta>,
    lifecycle: LifecycleController,
    options: PlayerOptions,
    guard: LoadGuard,
    phase: LoadPhase,
    on_frame: Option<FrameCallback>,
    on_complete: Option<CompleteCallback>,
}

impl<S: DisplaySurface, K: Scheduler> Player<S, K> {
    pub fn new(surface: S, scheduler: K, host: HostState, options: PlayerOptions) -> Self {
        let mut clock = PlaybackClock::new(options.resolve_fps(f64::NAN));
        clock.set_loop_mode(loop_mode(options.looping));
        Self {
            surface,
            scheduler,
            clock,
            renderer: FrameRenderer::new(),
            frames: None,
            meta: None,
            lifecycle: LifecycleController::new(host, options.playing),
            options,
            guard: LoadGuard::new(),
            phase: LoadPhase::Idle,
            on_frame: None,
            on_complete: None,
        }
    }

    #[inline]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    #[inline]
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    #[inline]
    pub fn scheduler(&self) -> &K {
        &self.scheduler
    }

    #[inline]
    pub fn scheduler_mut(&mut self) -> &mut K {
        &mut self.scheduler
    }

    #[inline]
    pub fn clock(&self) -> &PlaybackClock {
        &self.clock
    }

    #[inline]
    pub fn lifecycle(&self) -> &LifecycleController {
        &self.lifecycle
    }

    #[inline]
    pub fn options(&self) -> &PlayerOptions {
        &self.options
    }

    #[inline]
    pub fn phase(&self) -> &LoadPhase {
        &self.phase
    }

    /// Metadata of the bundle on display.
    pub fn meta(&self) -> Option<&AnimationMeta> {
        self.meta.as_ref()
    }

    /// Strategy the current bundle was decoded for.
    pub fn strategy(&self) -> Option<RenderStrategy> {
        self.frames.as_ref().map(DecodedFrames::strategy)
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.clock.is_running()
    }

    #[inline]
    pub fn current_frame(&self) -> usize {
        self.clock.current_frame()
    }

    /// Called with the new index after every advance.
    pub fn set_on_frame<F: FnMut(usize) + 'static>(&mut self, callback: F) {
        self.on_frame = Some(Box::new(callback));
    }

    /// Called once when a non-looping run ends.
    pub fn set_on_complete<F: FnMut() + 'static>(&mut self, callback: F) {
        self.on_complete = Some(Box::new(callback));
    }

    /// Mark a load as started. Only the newest ticket can be completed.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.phase = LoadPhase::Loading;
        self.guard.begin()
    }

    /// Apply the outcome of a load started with [`Player::begin_load`].
    ///
    /// Outdated results are dropped. A failure leaves the surface showing
    /// the last good frame. Returns whether a bundle was applied.
    pub fn finish_load(&mut self, ticket: LoadTicket, result: Result<AnimationBundle>) -> bool {
        if !self.guard.is_current(ticket) {
            log::debug!("discarding outdated bundle load");
            return false;
        }
        match result {
            Ok(bundle) => {
                self.apply_bundle(&bundle);
                true
            }
            Err(err) => {
                log::warn!("bundle load failed: {}", err);
                self.phase = LoadPhase::Failed(err.to_string());
                false
            }
        }
    }

    /// Decode and show a bundle, replacing the current one.
    ///
    /// The first frame is rendered immediately; playback starts only if the
    /// lifecycle allows it.
    pub fn apply_bundle(&mut self, bundle: &AnimationBundle) {
        self.clock.stop(&mut self.scheduler);

        let incremental = self.options.incremental && self.surface.supports_incremental_update();
        let strategy = RenderStrategy::select(bundle.meta.colored, incremental);
        let frames = DecodedFrames::decode(bundle, strategy);

        self.renderer.reset();
        self.clock.set_frame_count(frames.len());
        self.clock.rewind();
        self.clock.set_fps(self.options.resolve_fps(bundle.meta.fps));
        self.clock.set_loop_mode(loop_mode(self.options.looping));
        self.renderer.render(&mut self.surface, &frames, 0);

        log::debug!(
            "showing '{}': {} frames, {:?} strategy",
            bundle.meta.name,
            frames.len(),
            strategy
        );
        self.frames = Some(frames);
        self.meta = Some(bundle.meta.clone());
        self.phase = LoadPhase::Ready;
        self.sync();
    }

    /// Scheduler callback at `now` milliseconds.
    pub fn tick(&mut self, now: f64) -> usize {
        let Some(frames) = self.frames.as_ref() else {
            return 0;
        };
        let mut events = TickEvents {
            surface: &mut self.surface,
            renderer: &mut self.renderer,
            frames,
            on_frame: &mut self.on_frame,
            on_complete: &mut self.on_complete,
        };
        self.clock.tick(now, &mut self.scheduler, &mut events)
    }

    /// Apply a host signal, starting or stopping playback synchronously.
    pub fn handle_signal(&mut self, signal: HostSignal) -> Transition {
        let transition = self.lifecycle.apply(signal);
        self.sync();
        transition
    }

    /// Whether the host should start loading now. `true` at most once.
    pub fn wants_load(&mut self) -> bool {
        self.lifecycle.take_load_request()
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.options.playing = playing;
        self.lifecycle.set_playing(playing);
        self.sync();
    }

    /// Change the frame rate; applies from the next callback.
    pub fn set_fps(&mut self, fps: f64) {
        self.options.fps = Some(fps);
        let bundle_fps = self.meta.as_ref().map_or(f64::NAN, |meta| meta.fps);
        self.clock.set_fps(self.options.resolve_fps(bundle_fps));
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.options.looping = looping;
        self.clock.set_loop_mode(loop_mode(looping));
        self.sync();
    }

    /// Show frame 0 again and resume if allowed.
    pub fn replay(&mut self) {
        self.clock.stop(&mut self.scheduler);
        self.clock.rewind();
        if let Some(frames) = self.frames.as_ref() {
            self.renderer.render(&mut self.surface, frames, 0);
        }
        self.sync();
    }

    /// Stop playback and drop any load still in flight. Used when the view
    /// is torn down.
    pub fn detach(&mut self) {
        self.guard.invalidate();
        self.clock.stop(&mut self.scheduler);
    }

    fn sync(&mut self) {
        if self.lifecycle.should_run() {
            self.clock.start(&mut self.scheduler);
        } else {
            self.clock.stop(&mut self.scheduler);
        }
    }

    /// Fetch a bundle and apply it unless the player moved on meanwhile.
    ///
    /// The player is only borrowed before and after the fetch, so hosts
    /// keep driving it while the load is pending.
    pub async fn load<T>(player: &RefCell<Self>, transport: &T, source: &BundleSource, cdn: &CdnConfig) -> bool
    where
        T: BundleTransport + ?Sized,
    {
        let ticket = match player.try_borrow_mut() {
            Ok(mut player) => player.begin_load(),
            Err(_) => {
                log::warn!("player busy, load skipped");
                return false;
            }
        };

        let result = load_bundle(transport, source, cdn).await;

        match player.try_borrow_mut() {
            Ok(mut player) => player.finish_load(ticket, result),
            Err(_) => {
                log::warn!("player busy, loaded bundle dropped");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::{assemble, BundleParams};
    use crate::data::{Frame, FrameRow, GenerationSettings};
    use crate::error::Error;
    use crate::surface::{MemorySurface, SurfaceContent};
    use crate::timing::{ClockState, ManualScheduler};
    use std::cell::Cell;
    use std::future::Future;
    use std::rc::Rc;

    fn host(visible: bool) -> HostState {
        HostState {
            near_viewport: visible,
            intersecting: visible,
            focused: true,
            reduced_motion: false,
        }
    }

    fn bundle(frames: usize, colored: bool) -> AnimationBundle {
        let frames = (0..frames)
            .map(|i| {
                let text = format!("f{i}");
                let row = if colored {
                    FrameRow::Colored(text, vec!["ff0000".into(), "00ff00".into()])
                } else {
                    FrameRow::Plain(text)
                };
                Frame::new(vec![row])
            })
            .collect();
        assemble(
            frames,
            BundleParams {
                name: "spin".into(),
                fps: 50.0,
                colored,
                generated_with: GenerationSettings {
                    threshold_low: 5,
                    threshold_high: 235,
                    chars: " .@".into(),
                    font_ratio: 0.5,
                },
            },
        )
        .unwrap()
    }

    fn player(visible: bool, options: PlayerOptions) -> Player<MemorySurface, ManualScheduler> {
        Player::new(MemorySurface::new(true), ManualScheduler::new(), host(visible), options)
    }

    #[test]
    fn test_first_frame_renders_while_offscreen() {
        let mut p = player(false, PlayerOptions::default());
        p.apply_bundle(&bundle(3, true));

        assert_eq!(p.surface().visible_text(), "f0");
        assert_eq!(p.strategy(), Some(RenderStrategy::Incremental));
        assert_eq!(p.phase(), &LoadPhase::Ready);
        assert!(!p.is_running());
    }

    #[test]
    fn test_plays_when_visible_and_focused() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut p = player(true, PlayerOptions::default());
        let sink = Rc::clone(&seen);
        p.set_on_frame(move |i| sink.borrow_mut().push(i));
        p.apply_bundle(&bundle(3, true));
        assert!(p.is_running());

        for now in [0.0, 20.0, 40.0, 60.0] {
            p.tick(now);
        }
        assert_eq!(*seen.borrow(), vec![1, 2, 0]);
        assert_eq!(p.surface().visible_text(), "f0");
    }

    #[test]
    fn test_losing_focus_stops_synchronously() {
        let mut p = player(true, PlayerOptions::default());
        p.apply_bundle(&bundle(3, false));
        p.tick(0.0);
        p.tick(20.0);

        assert_eq!(p.handle_signal(HostSignal::Focus(false)), Transition::Stop);
        assert!(!p.is_running());
        p.surface_mut().reset_mutations();
        assert_eq!(p.tick(1000.0), 0);
        assert_eq!(p.surface().mutations(), 0);
        assert_eq!(p.current_frame(), 1);

        assert_eq!(p.handle_signal(HostSignal::Focus(true)), Transition::Start);
        assert!(p.is_running());
    }

    #[test]
    fn test_reduced_motion_shows_static_frame() {
        let mut p = player(true, PlayerOptions::default());
        p.handle_signal(HostSignal::ReducedMotion(true));
        p.apply_bundle(&bundle(3, false));

        assert_eq!(p.surface().content(), &SurfaceContent::Text("f0".into()));
        assert!(!p.is_running());
        assert!(!p.scheduler().is_pending());
    }

    #[test]
    fn test_reduced_motion_change_mid_playback() {
        let mut p = player(true, PlayerOptions::default());
        p.apply_bundle(&bundle(3, false));
        p.tick(0.0);
        p.tick(20.0);

        assert_eq!(p.handle_signal(HostSignal::ReducedMotion(true)), Transition::Stop);
        assert!(!p.scheduler().is_pending());
        assert_eq!(p.tick(1000.0), 0);
        assert_eq!(p.current_frame(), 1);

        assert_eq!(p.handle_signal(HostSignal::ReducedMotion(false)), Transition::Start);
        assert!(p.is_running());
    }

    #[test]
    fn test_scrolling_out_keeps_preload_state() {
        let mut p = player(true, PlayerOptions::default());
        p.apply_bundle(&bundle(3, false));
        assert!(p.is_running());

        let signal = p.lifecycle().host().viewport_update(None, Some(false));
        assert_eq!(p.handle_signal(signal), Transition::Stop);
        assert!(!p.is_running());
        assert!(p.lifecycle().host().near_viewport);
    }

    #[test]
    fn test_play_flag_gates_playback() {
        let options = PlayerOptions {
            playing: false,
            ..PlayerOptions::default()
        };
        let mut p = player(true, options);
        p.apply_bundle(&bundle(2, false));
        assert!(!p.is_running());

        p.set_playing(true);
        assert!(p.is_running());
        p.set_playing(false);
        assert!(!p.is_running());
    }

    #[test]
    fn test_markup_when_incremental_disabled() {
        let options = PlayerOptions {
            incremental: false,
            ..PlayerOptions::default()
        };
        let mut p = player(false, options);
        p.apply_bundle(&bundle(1, true));
        assert_eq!(p.strategy(), Some(RenderStrategy::Markup));
        assert_eq!(
            p.surface().content(),
            &SurfaceContent::Markup(
                "<span style=\"color:#ff0000\">f</span><span style=\"color:#00ff00\">0</span>".into()
            )
        );
    }

    #[test]
    fn test_non_looping_completes_once_and_replays() {
        let completions = Rc::new(Cell::new(0));
        let options = PlayerOptions {
            looping: false,
            ..PlayerOptions::default()
        };
        let mut p = player(true, options);
        let counter = Rc::clone(&completions);
        p.set_on_complete(move || counter.set(counter.get() + 1));
        p.apply_bundle(&bundle(3, false));

        for i in 0..10 {
            p.tick(i as f64 * 20.0);
        }
        assert_eq!(completions.get(), 1);
        assert_eq!(p.clock().state(), ClockState::Finished);
        assert_eq!(p.surface().visible_text(), "f2");

        p.replay();
        assert_eq!(p.surface().visible_text(), "f0");
        assert!(p.is_running());
    }

    #[test]
    fn test_bundle_fps_and_override() {
        let mut p = player(false, PlayerOptions::default());
        p.apply_bundle(&bundle(2, false));
        assert_eq!(p.clock().fps(), 50.0);

        p.set_fps(10.0);
        assert_eq!(p.clock().fps(), 10.0);
    }

    #[test]
    fn test_outdated_load_discarded() {
        let mut p = player(true, PlayerOptions::default());
        let first = p.begin_load();
        let second = p.begin_load();

        assert!(!p.finish_load(first, Ok(bundle(2, false))));
        assert!(p.meta().is_none());
        assert_eq!(p.phase(), &LoadPhase::Loading);

        assert!(p.finish_load(second, Ok(bundle(2, false))));
        assert_eq!(p.meta().map(|m| m.frame_count), Some(2));
    }

    #[test]
    fn test_detach_discards_pending_load() {
        let mut p = player(true, PlayerOptions::default());
        let ticket = p.begin_load();
        p.detach();
        assert!(!p.finish_load(ticket, Ok(bundle(2, false))));
        assert_eq!(p.surface().content(), &SurfaceContent::Empty);
    }

    #[test]
    fn test_failed_load_keeps_last_frame() {
        let mut p = player(true, PlayerOptions::default());
        p.apply_bundle(&bundle(2, false));

        let ticket = p.begin_load();
        assert!(!p.finish_load(ticket, Err(Error::Transport("offline".into()))));
        assert!(matches!(p.phase(), LoadPhase::Failed(msg) if msg.contains("offline")));
        assert_eq!(p.surface().visible_text(), "f0");
    }

    #[test]
    fn test_load_request_once_near_viewport() {
        let mut p = player(false, PlayerOptions::default());
        assert!(!p.wants_load());
        p.handle_signal(HostSignal::Viewport {
            near: true,
            intersecting: false,
        });
        assert!(p.wants_load());
        assert!(!p.wants_load());
    }

    struct StaticTransport(String);

    impl BundleTransport for StaticTransport {
        fn fetch(&self, _address: &str) -> impl Future<Output = Result<String>> {
            let document = self.0.clone();
            async move { Ok(document) }
        }
    }

    #[test]
    fn test_async_load_applies_bundle() {
        let p = RefCell::new(player(true, PlayerOptions::default()));
        let transport = StaticTransport(bundle(4, true).to_json().unwrap());

        let applied = pollster::block_on(Player::load(
            &p,
            &transport,
            &BundleSource::named("spin"),
            &CdnConfig::default(),
        ));
        assert!(applied);
        let p = p.borrow();
        assert_eq!(p.meta().map(|m| m.frame_count), Some(4));
        assert!(p.is_running());
    }
}
