//! Guided tour over the page.
//!
//! The engine is a small state machine: `current` is `None` while the tour
//! is inactive, otherwise the index of the showing step. Everything a step
//! does on entry is described by its [`EffectSet`] and undone when the next
//! step is shown or the tour ends.

mod placement;
mod steps;

pub use placement::{BoxPlacement, Placement, place_box};
pub use steps::{EffectSet, Step, tour};

use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;

use futures::future::{AbortHandle, abortable};
use runtime::{Clock, WaitOutcome, wait_until};
use tracing::{debug, info, warn};

use crate::config::TutorialConfig;
use crate::surface::{InfoPopupView, PointerRouting, TutorialView};
use steps::{HIGHLIGHT_CLASS, INFO_DIALOG_SELECTOR, MAP_SELECTOR, SECONDARY_HIGHLIGHT_CLASS};

const ACTIVE_BODY_CLASS: &str = "tutorial-active";
const MAP_CLICK_BODY_CLASS: &str = "tutorial-map-click-active";

/// What the tour needs from the rest of the session.
pub trait TutorialHost {
    type View: TutorialView + InfoPopupView + Clock;

    fn tutorial_view(&self) -> &Self::View;
    fn tutorial(&self) -> &TutorialEngine;
    fn spawn_local(&self, fut: impl Future<Output = ()> + 'static);
    fn hide_map_popup(&self);
    /// Closes the info window through its close control, if it is open.
    fn dismiss_info_popup(&self);
    /// Runs the category control for `layer`. `false` if there is none.
    fn activate_control(&self, layer: &str) -> bool;
    fn open_section(&self, section: &str);
    fn close_all_sections(&self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Highlighted {
    selector: &'static str,
    class: &'static str,
    inert: bool,
}

#[derive(Debug, Default)]
struct TutorialState {
    current: Option<usize>,
    previous: Option<usize>,
    highlighted: Option<Highlighted>,
    pending: Option<AbortHandle>,
}

#[derive(Debug)]
pub struct TutorialEngine {
    steps: Vec<Step>,
    cfg: TutorialConfig,
    state: RefCell<TutorialState>,
}

impl TutorialEngine {
    pub fn new(cfg: TutorialConfig) -> Self {
        Self {
            steps: tour(&cfg),
            cfg,
            state: RefCell::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    pub fn current(&self) -> Option<usize> {
        self.state.borrow().current
    }

    pub fn is_active(&self) -> bool {
        self.current().is_some()
    }

    /// Whether a map click may open the map popup right now.
    pub fn map_popup_allowed(&self) -> bool {
        match self.current_step() {
            None => true,
            Some(step) => step.effects.map_click,
        }
    }

    /// Whether outside clicks should leave the map popup alone.
    pub fn keeps_map_popup_open(&self) -> bool {
        self.current_step().is_some_and(|s| s.effects.map_click)
    }

    /// Selector and class of the element currently singled out, if any.
    pub fn highlighted(&self) -> Option<(&'static str, &'static str)> {
        self.state
            .borrow()
            .highlighted
            .as_ref()
            .map(|h| (h.selector, h.class))
    }

    pub fn has_pending_observation(&self) -> bool {
        self.state.borrow().pending.is_some()
    }

    fn current_step(&self) -> Option<&Step> {
        self.current().and_then(|i| self.steps.get(i))
    }

    fn keeps_info_popup(&self, index: usize) -> bool {
        self.steps
            .get(index)
            .is_some_and(|s| s.effects.open_info_popup.is_some())
    }

    fn cancel_observation(&self) {
        if let Some(handle) = self.state.borrow_mut().pending.take() {
            handle.abort();
        }
    }

    fn clear_highlight(&self, view: &impl TutorialView) {
        let Some(h) = self.state.borrow_mut().highlighted.take() else {
            return;
        };
        view.set_element_class(h.selector, h.class, false);
        if h.inert {
            view.set_element_pointer_events(h.selector, None);
        }
    }

    /// Singles out `selector` and positions the box next to it. Centres the
    /// box when there is nothing to point at.
    fn point_at(
        &self,
        view: &impl TutorialView,
        selector: Option<&'static str>,
        class: &'static str,
        hint: Placement,
    ) -> bool {
        let rect = selector.and_then(|s| view.element_rect(s).map(|r| (s, r)));
        let target = match rect {
            Some((s, r)) => {
                view.set_element_class(s, class, true);
                self.state.borrow_mut().highlighted = Some(Highlighted {
                    selector: s,
                    class,
                    inert: false,
                });
                Some(r)
            }
            None => None,
        };
        view.place_tutorial_box(place_box(
            target,
            hint,
            view.tutorial_box_size(),
            view.viewport_size(),
            self.cfg.margin,
        ));
        target.is_some()
    }

    fn make_inert(&self, view: &impl TutorialView) {
        let mut state = self.state.borrow_mut();
        if let Some(h) = state.highlighted.as_mut() {
            view.set_element_pointer_events(h.selector, Some("none"));
            h.inert = true;
        }
    }

    /// Moves the highlight from the overlay to the dialog once it is up.
    fn track_dialog(&self, view: &impl TutorialView, hint: Placement) {
        self.clear_highlight(view);
        self.point_at(view, Some(INFO_DIALOG_SELECTOR), SECONDARY_HIGHLIGHT_CLASS, hint);
    }
}

pub fn start<H: TutorialHost + 'static>(host: &Rc<H>) {
    host.hide_map_popup();
    host.dismiss_info_popup();

    let view = host.tutorial_view();
    {
        let mut state = host.tutorial().state.borrow_mut();
        state.current = Some(0);
        state.previous = None;
    }
    view.set_tutorial_visible(true);
    view.set_body_class(ACTIVE_BODY_CLASS, true);
    show_step(host, 0);
    host.close_all_sections();
}

pub fn next<H: TutorialHost + 'static>(host: &Rc<H>) {
    let Some(current) = host.tutorial().current() else {
        return;
    };
    host.tutorial().state.borrow_mut().previous = Some(current);
    show_step(host, current + 1);
}

pub fn prev<H: TutorialHost + 'static>(host: &Rc<H>) {
    let Some(current) = host.tutorial().current() else {
        return;
    };
    host.tutorial().state.borrow_mut().previous = Some(current);
    match current.checked_sub(1) {
        Some(index) => show_step(host, index),
        None => close(host.as_ref()),
    }
}

/// Ends the tour from any step and reverts every step effect.
pub fn close<H: TutorialHost>(host: &H) {
    let engine = host.tutorial();
    let view = host.tutorial_view();

    view.set_tutorial_visible(false);
    engine.clear_highlight(view);
    view.set_pointer_routing(PointerRouting::Blocked);
    engine.cancel_observation();
    host.close_all_sections();
    host.dismiss_info_popup();
    view.set_element_class(MAP_SELECTOR, SECONDARY_HIGHLIGHT_CLASS, false);
    view.set_click_guard(false);
    view.set_body_class(ACTIVE_BODY_CLASS, false);
    view.set_body_class(MAP_CLICK_BODY_CLASS, false);
    view.set_info_popup_z_index(engine.cfg.overlay_z_index);

    let mut state = engine.state.borrow_mut();
    state.current = None;
    state.previous = None;
    debug!("tutorial: ended");
}

/// Enters step `index`, ending the tour when it is out of range.
pub fn show_step<H: TutorialHost + 'static>(host: &Rc<H>, index: usize) {
    let engine = host.tutorial();
    let view = host.tutorial_view();
    let previous = engine.state.borrow().previous;

    host.hide_map_popup();
    view.set_pointer_routing(PointerRouting::Blocked);
    view.set_body_class(MAP_CLICK_BODY_CLASS, false);
    if previous.is_some_and(|p| engine.keeps_info_popup(p)) {
        view.set_info_popup_z_index(engine.cfg.overlay_z_index);
    }
    engine.state.borrow_mut().current = Some(index);
    if !engine.keeps_info_popup(index) {
        host.dismiss_info_popup();
    }
    view.set_click_guard(false);
    engine.cancel_observation();

    let Some(step) = engine.steps.get(index) else {
        close(host.as_ref());
        return;
    };

    view.set_tutorial_nav(index > 0, index + 1 < engine.steps.len());
    engine.clear_highlight(view);
    view.set_tutorial_text(step.title, step.text);
    engine.point_at(view, step.target, HIGHLIGHT_CLASS, step.hint);

    let fx = &step.effects;
    view.set_element_class(MAP_SELECTOR, SECONDARY_HIGHLIGHT_CLASS, fx.map_highlight);
    if fx.inert_target {
        engine.make_inert(view);
    }
    if fx.map_click {
        view.set_pointer_routing(PointerRouting::PassThrough);
        view.set_body_class(MAP_CLICK_BODY_CLASS, true);
    }
    if fx.hover_through {
        view.set_pointer_routing(PointerRouting::PassThrough);
        view.set_click_guard(true);
    }
    if let Some(control) = fx.open_info_popup.as_deref() {
        observe_info_popup(host, control, step.hint);
    }

    match fx.accordion.as_deref() {
        Some(section) => host.open_section(section),
        None => {
            let was_open = previous
                .and_then(|p| engine.steps.get(p))
                .is_some_and(|s| s.effects.accordion.is_some());
            if was_open {
                host.close_all_sections();
            }
        }
    }
    info!("tutorial: showing step {} of {}", index + 1, engine.steps.len());
}

/// Opens the info window through `control` and follows the dialog once the
/// page shows it, giving up after the configured timeout.
fn observe_info_popup<H: TutorialHost + 'static>(host: &Rc<H>, control: &str, hint: Placement) {
    let engine = host.tutorial();
    let view = host.tutorial_view();

    view.set_info_popup_z_index(engine.cfg.raised_z_index);
    let notifications = view.observe_mutations();
    if !host.activate_control(control) {
        warn!(control, "tutorial: control not found for the info popup step");
        return;
    }

    let timeout_ms = engine.cfg.observe_timeout_ms;
    let timeout = view.sleep(timeout_ms);
    let watched = Rc::downgrade(host);
    let target = Rc::downgrade(host);
    let (task, handle) = abortable(async move {
        let ready = move || {
            watched
                .upgrade()
                .is_some_and(|h| h.tutorial_view().info_popup_visible())
        };
        match wait_until(notifications, timeout, ready).await {
            WaitOutcome::Ready => {
                if let Some(host) = target.upgrade() {
                    let engine = host.tutorial();
                    engine.state.borrow_mut().pending = None;
                    engine.track_dialog(host.tutorial_view(), hint);
                }
            }
            WaitOutcome::TimedOut | WaitOutcome::Disconnected => {
                warn!(
                    "tutorial: info popup did not become visible within {timeout_ms} ms"
                );
                if let Some(host) = target.upgrade() {
                    host.tutorial().state.borrow_mut().pending = None;
                }
            }
        }
    });
    engine.state.borrow_mut().pending = Some(handle);
    host.spawn_local(async move {
        let _ = task.await;
    });
}
