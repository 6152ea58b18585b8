//! Page-side collaborator contracts.
//!
//! The browser build implements these over the DOM; the controllers only
//! ever talk to the page through them.

use foundation::bounds::{Point2, Rect2, Size2};
use runtime::{Clock, Notifications};

use crate::config::PopupLayout;
use crate::tutorial::BoxPlacement;

pub trait InfoPopupView {
    /// Builds the floating window if it does not exist yet.
    fn ensure_info_popup(&self, layout: &PopupLayout);
    fn set_info_popup_title(&self, title: &str);
    fn set_info_popup_body(&self, html: &str);
    fn set_info_popup_visible(&self, visible: bool);
    fn info_popup_visible(&self) -> bool;
    /// Client rect of the dialog, if built.
    fn info_popup_rect(&self) -> Option<Rect2>;
    fn move_info_popup(&self, top_left: Point2);
    /// Transitions are suspended while a drag is in progress.
    fn set_info_popup_dragging(&self, dragging: bool);
    fn set_info_popup_z_index(&self, z: i32);
}

pub trait MapPopupView {
    fn show_map_popup(&self, html: &str, at: Point2);
    fn hide_map_popup(&self);
    fn map_popup_visible(&self) -> bool;
}

pub trait SidebarView {
    /// Visible label of the category control for `layer`.
    fn control_label(&self, layer: &str) -> Option<String>;
    /// Heading of the collapsible section holding that control, if any.
    fn control_section(&self, layer: &str) -> Option<String>;
    fn section_names(&self) -> Vec<String>;
    fn set_section_open(&self, section: &str, open: bool);
    /// Replaces the upcoming-events sidebar content. `false` if absent.
    fn render_upcoming_events(&self, html: &str) -> bool;
}

/// How pointer events are routed between the tour scrim, the tour box and
/// the page below.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum PointerRouting {
    /// The scrim swallows pointer input.
    #[default]
    Blocked,
    /// Input reaches the page through the scrim; the box stays interactive.
    PassThrough,
}

pub trait TutorialView {
    fn set_tutorial_visible(&self, visible: bool);
    fn set_tutorial_text(&self, title: &str, text: &str);
    fn set_tutorial_nav(&self, show_prev: bool, show_next: bool);
    fn place_tutorial_box(&self, placement: BoxPlacement);
    fn tutorial_box_size(&self) -> Size2;
    fn viewport_size(&self) -> Size2;
    /// `None` when no element matches `selector`.
    fn element_rect(&self, selector: &str) -> Option<Rect2>;
    fn set_element_class(&self, selector: &str, class: &str, on: bool);
    /// `None` clears the inline override.
    fn set_element_pointer_events(&self, selector: &str, value: Option<&str>);
    fn set_pointer_routing(&self, routing: PointerRouting);
    fn set_body_class(&self, class: &str, on: bool);
    /// Capture-phase listener swallowing clicks outside the tour box.
    fn set_click_guard(&self, on: bool);
    /// Attribute and child-list changes under the document body. Dropping
    /// the stream disconnects the observer.
    fn observe_mutations(&self) -> Notifications;
}

/// Everything the session needs from the page.
pub trait Surface: InfoPopupView + MapPopupView + SidebarView + TutorialView + Clock {}

impl<T> Surface for T where T: InfoPopupView + MapPopupView + SidebarView + TutorialView + Clock {}
