use std::cell::{Cell, RefCell};

use foundation::bounds::Point2;
use foundation::ids::{RequestToken, TokenCounter};

use crate::config::PopupLayout;
use crate::content::InfoBody;
use crate::surface::InfoPopupView;

/// Identifies a category control by the layer it drives.
pub type ControlRef = String;

/// Singleton state of the floating info window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveInfoPopup {
    pub title: String,
    pub body_html: String,
    pub is_open: bool,
    /// Set iff the window was opened by a category control.
    pub trigger: Option<ControlRef>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Section {
    About,
    Locations,
}

/// What the window's close control should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseAction {
    /// Re-run the trigger control's activation so its toggled state reverts.
    Proxy(ControlRef),
    Direct,
}

#[derive(Debug, Default)]
pub struct InfoPopupController {
    state: RefCell<ActiveInfoPopup>,
    body: RefCell<Option<InfoBody>>,
    built: Cell<bool>,
    /// Pointer offset from the dialog's top-left while dragging.
    drag: Cell<Option<Point2>>,
    fills: TokenCounter,
}

impl InfoPopupController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> ActiveInfoPopup {
        self.state.borrow().clone()
    }

    pub fn is_open(&self) -> bool {
        self.state.borrow().is_open
    }

    pub fn is_built(&self) -> bool {
        self.built.get()
    }

    pub fn trigger(&self) -> Option<ControlRef> {
        self.state.borrow().trigger.clone()
    }

    /// Shows `html` under `title` without a trigger control.
    pub fn show(&self, view: &impl InfoPopupView, layout: &PopupLayout, title: &str, html: &str) {
        self.fills.invalidate();
        self.body.borrow_mut().take();
        self.state.borrow_mut().trigger = None;
        self.present(view, layout, title, html);
    }

    /// Builds the window on first use, then sets content and shows it.
    fn present(&self, view: &impl InfoPopupView, layout: &PopupLayout, title: &str, html: &str) {
        if !self.built.replace(true) {
            view.ensure_info_popup(layout);
        }
        view.set_info_popup_title(title);
        view.set_info_popup_body(html);
        view.set_info_popup_visible(true);

        let mut state = self.state.borrow_mut();
        state.title = title.to_string();
        state.body_html = html.to_string();
        state.is_open = true;
    }

    pub fn close(&self, view: &impl InfoPopupView) {
        if !self.built.get() {
            return;
        }
        view.set_info_popup_visible(false);
        let mut state = self.state.borrow_mut();
        state.is_open = false;
        state.trigger = None;
        self.drag.set(None);
    }

    pub fn close_action(&self) -> CloseAction {
        match self.trigger() {
            Some(control) => CloseAction::Proxy(control),
            None => CloseAction::Direct,
        }
    }

    /// Opens the window in its loading state for a control activation.
    ///
    /// Returns the token later section updates must present.
    pub fn open_loading(
        &self,
        view: &impl InfoPopupView,
        layout: &PopupLayout,
        title: &str,
        trigger: ControlRef,
        show_locations: bool,
    ) -> RequestToken {
        let token = self.fills.issue();
        let body = InfoBody::loading(show_locations);
        self.state.borrow_mut().trigger = Some(trigger);
        self.present(view, layout, title, &body.render());
        *self.body.borrow_mut() = Some(body);
        token
    }

    /// Replaces one section once its fetch settles. Updates from an older
    /// activation are dropped. Returns whether the update was applied.
    pub fn fill_section(
        &self,
        view: &impl InfoPopupView,
        token: RequestToken,
        section: Section,
        html: String,
    ) -> bool {
        if !self.fills.is_current(token) {
            return false;
        }
        let rendered = {
            let mut body = self.body.borrow_mut();
            let Some(body) = body.as_mut() else {
                return false;
            };
            match section {
                Section::About => body.about = html,
                Section::Locations => {
                    if body.locations.is_none() {
                        return false;
                    }
                    body.locations = Some(html);
                }
            }
            body.render()
        };
        view.set_info_popup_body(&rendered);
        self.state.borrow_mut().body_html = rendered;
        true
    }

    /// Title-bar press. Other presses on the dialog (resize handle, content)
    /// never reach here.
    pub fn begin_drag(&self, view: &impl InfoPopupView, pointer: Point2) {
        let Some(rect) = view.info_popup_rect() else {
            return;
        };
        self.drag
            .set(Some(Point2::new(pointer.x - rect.left, pointer.y - rect.top)));
        view.set_info_popup_dragging(true);
    }

    pub fn drag_to(&self, view: &impl InfoPopupView, pointer: Point2) {
        if let Some(offset) = self.drag.get() {
            view.move_info_popup(Point2::new(pointer.x - offset.x, pointer.y - offset.y));
        }
    }

    pub fn end_drag(&self, view: &impl InfoPopupView) {
        if self.drag.take().is_some() {
            view.set_info_popup_dragging(false);
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.get().is_some()
    }
}
