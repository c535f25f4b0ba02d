//! Browser bindings: a DOM element surface, a `requestAnimationFrame`
//! scheduler, a fetch transport and host-state probes.

use std::cell::RefCell;
use std::future::Future;
use std::rc::{Rc, Weak};

use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use js_sys::Array;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    Document, Element, EventTarget, HtmlElement, IntersectionObserver, IntersectionObserverEntry,
    IntersectionObserverInit, Response, Window,
};

use crate::color::css_color;
use crate::config::PlayerOptions;
use crate::error::{Error, Result};
use crate::lifecycle::{viewport_signal, HostSignal, HostState, PLAY_VISIBILITY_THRESHOLD, PRELOAD_MARGIN_PX};
use crate::loader::{BundleSource, BundleTransport, CdnConfig};
use crate::player::Player;
use crate::surface::DisplaySurface;
use crate::timing::Scheduler;

/// Media query for the platform's reduced-motion preference.
pub const REDUCED_MOTION_QUERY: &str = "(prefers-reduced-motion: reduce)";

/// Player bound to a DOM element and the browser frame loop.
pub type WebPlayer = Player<ElementSurface, RafScheduler>;

fn js_message(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

/// Surface writing into an element: one `div` per row, one `span` per run.
#[derive(Clone, Debug)]
pub struct ElementSurface {
    root: HtmlElement,
    document: Document,
    incremental: bool,
}

impl ElementSurface {
    /// `None` if the element is not attached to a document.
    pub fn new(root: HtmlElement, incremental: bool) -> Option<Self> {
        let document = root.owner_document()?;
        Some(Self {
            root,
            document,
            incremental,
        })
    }

    #[inline]
    pub fn root(&self) -> &HtmlElement {
        &self.root
    }

    fn create(&self, tag: &str) -> Option<HtmlElement> {
        self.document.create_element(tag).ok()?.dyn_into::<HtmlElement>().ok()
    }

    fn style(node: &HtmlElement, property: &str, value: Option<&str>) {
        let style = node.style();
        let result = match value {
            Some(value) => style.set_property(property, value),
            None => style.remove_property(property).map(|_| ()),
        };
        if let Err(err) = result {
            log::warn!("failed to update {}: {}", property, js_message(&err));
        }
    }
}

impl DisplaySurface for ElementSurface {
    type Handle = HtmlElement;

    fn supports_incremental_update(&self) -> bool {
        self.incremental
    }

    fn set_text(&mut self, text: &str) {
        self.root.set_text_content(Some(text));
    }

    fn set_markup(&mut self, markup: &str) {
        self.root.set_inner_html(markup);
    }

    fn clear(&mut self) {
        self.root.set_inner_html("");
    }

    fn append_row(&mut self) -> Option<HtmlElement> {
        let row = self.create("div")?;
        self.root.append_child(&row).ok()?;
        Some(row)
    }

    fn append_run(&mut self, row: &HtmlElement) -> Option<HtmlElement> {
        let run = self.create("span")?;
        row.append_child(&run).ok()?;
        Some(run)
    }

    fn set_run_text(&mut self, run: &HtmlElement, text: &str) {
        run.set_text_content(Some(text));
    }

    fn set_run_color(&mut self, run: &HtmlElement, color: &str) {
        Self::style(run, "color", css_color(color).as_deref());
    }

    fn set_visible(&mut self, node: &HtmlElement, visible: bool) {
        Self::style(node, "display", if visible { None } else { Some("none") });
    }
}

/// Scheduler backed by `requestAnimationFrame`.
///
/// The frame callback is installed once with [`RafScheduler::set_callback`];
/// it must call [`RafScheduler::fired`] before ticking the player.
pub struct RafScheduler {
    window: Window,
    callback: Option<Closure<dyn FnMut(f64)>>,
    pending: Option<i32>,
}

impl RafScheduler {
    pub fn new(window: Window) -> Self {
        Self {
            window,
            callback: None,
            pending: None,
        }
    }

    pub fn set_callback(&mut self, callback: Closure<dyn FnMut(f64)>) {
        self.callback = Some(callback);
    }

    /// The requested frame was delivered.
    pub fn fired(&mut self) {
        self.pending = None;
    }
}

impl Scheduler for RafScheduler {
    fn request_tick(&mut self) {
        if self.pending.is_some() {
            return;
        }
        let Some(callback) = self.callback.as_ref() else {
            log::warn!("frame requested before a callback was installed");
            return;
        };
        let function: &js_sys::Function = callback.as_ref().unchecked_ref();
        match self.window.request_animation_frame(function) {
            Ok(id) => self.pending = Some(id),
            Err(err) => log::warn!("requestAnimationFrame failed: {}", js_message(&err)),
        }
    }

    fn cancel_tick(&mut self) {
        if let Some(id) = self.pending.take() {
            if let Err(err) = self.window.cancel_animation_frame(id) {
                log::warn!("cancelAnimationFrame failed: {}", js_message(&err));
            }
        }
    }
}

/// Transport using the browser fetch API.
#[derive(Clone, Debug)]
pub struct FetchTransport {
    window: Window,
}

impl FetchTransport {
    pub fn new() -> Option<Self> {
        Some(Self {
            window: web_sys::window()?,
        })
    }
}

impl BundleTransport for FetchTransport {
    fn fetch(&self, address: &str) -> impl Future<Output = Result<String>> {
        let request = self.window.fetch_with_str(address);
        let address = address.to_string();
        async move {
            let failed = |err: JsValue| Error::Transport(format!("{address}: {}", js_message(&err)));
            let response: Response = JsFuture::from(request).await.map_err(failed)?.dyn_into().map_err(failed)?;
            if !response.ok() {
                return Err(Error::Transport(format!("{address}: HTTP {}", response.status())));
            }
            let body = JsFuture::from(response.text().map_err(failed)?).await.map_err(failed)?;
            body.as_string()
                .ok_or_else(|| Error::Transport(format!("{address}: response body is not text")))
        }
    }
}

/// Viewport signal for an element, from its bounding box.
pub fn viewport_probe(window: &Window, element: &Element) -> Option<HostSignal> {
    let height = window.inner_height().ok()?.as_f64()?;
    let rect = element.get_bounding_client_rect();
    Some(viewport_signal(rect.top(), rect.bottom(), height))
}

/// Current host state for an element.
pub fn host_state(window: &Window, element: &Element) -> HostState {
    let reduced_motion = window
        .match_media(REDUCED_MOTION_QUERY)
        .ok()
        .flatten()
        .is_some_and(|query| query.matches());
    let focused = window
        .document()
        .and_then(|document| document.has_focus().ok())
        .unwrap_or(false);
    let (near_viewport, intersecting) = match viewport_probe(window, element) {
        Some(HostSignal::Viewport { near, intersecting }) => (near, intersecting),
        _ => (false, false),
    };
    HostState {
        near_viewport,
        intersecting,
        focused,
        reduced_motion,
    }
}

/// Create a player on `root` wired to the browser frame loop.
pub fn mount(root: HtmlElement, options: PlayerOptions) -> Option<Rc<RefCell<WebPlayer>>> {
    let window = web_sys::window()?;
    let host = host_state(&window, &root);
    let incremental = options.incremental;
    let surface = ElementSurface::new(root, incremental)?;
    let player = Rc::new(RefCell::new(Player::new(surface, RafScheduler::new(window), host, options)));

    let weak: Weak<RefCell<WebPlayer>> = Rc::downgrade(&player);
    let callback = Closure::<dyn FnMut(f64)>::new(move |now: f64| {
        let Some(player) = weak.upgrade() else {
            return;
        };
        let Ok(mut player) = player.try_borrow_mut() else {
            log::warn!("player busy during frame callback");
            return;
        };
        player.scheduler_mut().fired();
        player.tick(now);
    });
    player.borrow_mut().scheduler_mut().set_callback(callback);
    Some(player)
}

/// Fetch and apply a bundle in the background.
pub fn spawn_load(player: Rc<RefCell<WebPlayer>>, source: BundleSource, cdn: CdnConfig) {
    wasm_bindgen_futures::spawn_local(async move {
        let Some(transport) = FetchTransport::new() else {
            log::warn!("no window, cannot fetch bundles");
            return;
        };
        Player::load(&player, &transport, &source, &cdn).await;
    });
}

fn observer_init(root_margin: Option<&str>, threshold: f64) -> IntersectionObserverInit {
    let init = IntersectionObserverInit::new();
    if let Some(margin) = root_margin {
        init.set_root_margin(margin);
    }
    init.set_threshold(&JsValue::from_f64(threshold));
    init
}

fn last_entry(entries: &Array) -> Option<IntersectionObserverEntry> {
    entries.iter().last()?.dyn_into::<IntersectionObserverEntry>().ok()
}

/// Apply a viewport change and start the one-shot load if it was requested.
fn apply_viewport(
    player: &Rc<RefCell<WebPlayer>>,
    near: Option<bool>,
    intersecting: Option<bool>,
    source: &BundleSource,
    cdn: &CdnConfig,
) {
    let wants_load = {
        let Ok(mut guard) = player.try_borrow_mut() else {
            log::warn!("player busy during viewport change");
            return;
        };
        let signal = guard.lifecycle().host().viewport_update(near, intersecting);
        guard.handle_signal(signal);
        guard.wants_load()
    };
    if wants_load {
        spawn_load(Rc::clone(player), source.clone(), cdn.clone());
    }
}

type ObserverCallback = Closure<dyn FnMut(Array, IntersectionObserver)>;

/// Host subscriptions feeding a player. Dropping it disconnects the
/// observers and removes the event listeners.
pub struct HostWatch {
    observers: Vec<(IntersectionObserver, ObserverCallback)>,
    listeners: Vec<(EventTarget, &'static str, Closure<dyn FnMut()>)>,
}

impl HostWatch {
    fn observe(
        &mut self,
        element: &Element,
        init: &IntersectionObserverInit,
        callback: ObserverCallback,
    ) -> std::result::Result<(), JsValue> {
        let observer = IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), init)?;
        observer.observe(element);
        self.observers.push((observer, callback));
        Ok(())
    }

    fn listen<F: FnMut() + 'static>(
        &mut self,
        target: EventTarget,
        event: &'static str,
        handler: F,
    ) -> std::result::Result<(), JsValue> {
        let closure = Closure::<dyn FnMut()>::new(handler);
        target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
        self.listeners.push((target, event, closure));
        Ok(())
    }
}

impl Drop for HostWatch {
    fn drop(&mut self) {
        for (observer, _) in &self.observers {
            observer.disconnect();
        }
        for (target, event, closure) in &self.listeners {
            if let Err(err) = target.remove_event_listener_with_callback(event, closure.as_ref().unchecked_ref()) {
                log::warn!("failed to remove {} listener: {}", event, js_message(&err));
            }
        }
    }
}

/// Forward viewport, focus and reduced-motion changes to the player,
/// loading `source` the first time the element comes near the viewport.
///
/// Keep the returned [`HostWatch`] alive for as long as the player is mounted.
pub fn watch_host(
    player: &Rc<RefCell<WebPlayer>>,
    source: BundleSource,
    cdn: CdnConfig,
) -> std::result::Result<HostWatch, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let element: Element = player.borrow().surface().root().clone().into();
    let weak = Rc::downgrade(player);
    let mut watch = HostWatch {
        observers: Vec::new(),
        listeners: Vec::new(),
    };

    let margin = format!("{}px", PRELOAD_MARGIN_PX);
    let near = {
        let (weak, source, cdn) = (weak.clone(), source.clone(), cdn.clone());
        ObserverCallback::new(move |entries: Array, _: IntersectionObserver| {
            let (Some(player), Some(entry)) = (weak.upgrade(), last_entry(&entries)) else {
                return;
            };
            apply_viewport(&player, Some(entry.is_intersecting()), None, &source, &cdn);
        })
    };
    watch.observe(&element, &observer_init(Some(&margin), 0.0), near)?;

    let visible = {
        let (weak, source, cdn) = (weak.clone(), source.clone(), cdn.clone());
        ObserverCallback::new(move |entries: Array, _: IntersectionObserver| {
            let (Some(player), Some(entry)) = (weak.upgrade(), last_entry(&entries)) else {
                return;
            };
            apply_viewport(&player, None, Some(entry.is_intersecting()), &source, &cdn);
        })
    };
    watch.observe(&element, &observer_init(None, PLAY_VISIBILITY_THRESHOLD), visible)?;

    for (event, focused) in [("focus", true), ("blur", false)] {
        let weak = weak.clone();
        watch.listen(window.clone().into(), event, move || {
            if let Some(player) = weak.upgrade() {
                if let Ok(mut player) = player.try_borrow_mut() {
                    player.handle_signal(HostSignal::Focus(focused));
                }
            }
        })?;
    }

    if let Some(query) = window.match_media(REDUCED_MOTION_QUERY)? {
        let (weak, current) = (weak.clone(), query.clone());
        watch.listen(query.into(), "change", move || {
            if let Some(player) = weak.upgrade() {
                if let Ok(mut player) = player.try_borrow_mut() {
                    player.handle_signal(HostSignal::ReducedMotion(current.matches()));
                }
            }
        })?;
    }

    Ok(watch)
}
