//! `Surface` over the live document.

use std::cell::RefCell;

use foundation::bounds::{Point2, Rect2, Size2};
use gloo::events::{EventListener, EventListenerOptions, EventListenerPhase};
use gloo::timers::future::TimeoutFuture;
use interaction::config::PopupLayout;
use interaction::surface::{
    InfoPopupView, MapPopupView, PointerRouting, SidebarView, TutorialView,
};
use interaction::tutorial::BoxPlacement;
use runtime::{Clock, Notifications};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlElement, Window};

use crate::observer;

const OVERLAY_ID: &str = "infoPopupOverlay";
const DIALOG_ID: &str = "infoPopupDialog";
const TITLE_ID: &str = "infoPopupTitle";
const CONTENT_ID: &str = "infoPopupContent";
const MAP_POPUP_ID: &str = "custom-popup";
const EVENTS_SIDEBAR_ID: &str = "programsSidebar";
const TOUR_BOX_SELECTOR: &str = "#tutorial-box";

fn set_styles(el: &HtmlElement, styles: &[(&str, &str)]) {
    let style = el.style();
    for (name, value) in styles {
        let _ = style.set_property(name, value);
    }
}

fn clear_style(el: &HtmlElement, name: &str) {
    let _ = el.style().remove_property(name);
}

fn rect_of(el: &Element) -> Rect2 {
    let r = el.get_bounding_client_rect();
    Rect2::new(r.left(), r.top(), r.width(), r.height())
}

fn px(v: f64) -> String {
    format!("{v}px")
}

/// Section name as shown by a collapsible header's leading text node.
fn header_name(header: &Element) -> Option<String> {
    let text = header.first_child()?.text_content()?;
    Some(text.trim().to_string())
}

fn css_px(window: &Window, el: &Element, prop: &str) -> f64 {
    window
        .get_computed_style(el)
        .ok()
        .flatten()
        .and_then(|s| s.get_property_value(prop).ok())
        .and_then(|v| v.trim_end_matches("px").parse().ok())
        .unwrap_or(0.0)
}

/// Target of an event as an element, if it is one.
pub fn event_element(event: &web_sys::Event) -> Option<Element> {
    event.target()?.dyn_into::<Element>().ok()
}

/// Nearest ancestor-or-self matching `selector`.
pub fn closest(el: &Element, selector: &str) -> Option<Element> {
    el.closest(selector).ok().flatten()
}

pub struct DomSurface {
    window: Window,
    document: Document,
    click_guard: RefCell<Option<EventListener>>,
}

impl DomSurface {
    pub fn new() -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;
        Ok(Self {
            window,
            document,
            click_guard: RefCell::new(None),
        })
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    fn select(&self, selector: &str) -> Option<Element> {
        self.document.query_selector(selector).ok().flatten()
    }

    fn html(&self, id: &str) -> Option<HtmlElement> {
        self.document.get_element_by_id(id)?.dyn_into().ok()
    }

    fn html_selected(&self, selector: &str) -> Option<HtmlElement> {
        self.select(selector)?.dyn_into().ok()
    }

    fn create(&self, tag: &str, id: Option<&str>) -> Result<HtmlElement, JsValue> {
        let el: HtmlElement = self.document.create_element(tag)?.dyn_into()?;
        if let Some(id) = id {
            el.set_id(id);
        }
        Ok(el)
    }

    fn control_button(&self, layer: &str) -> Option<Element> {
        let selector = format!("button[data-layer-name=\"{}\"]", layer.replace('"', "\\\""));
        self.select(&selector)
    }

    fn section_header(&self, section: &str) -> Option<Element> {
        let headers = self.document.query_selector_all(".collapsible-header").ok()?;
        (0..headers.length())
            .filter_map(|i| headers.item(i)?.dyn_into::<Element>().ok())
            .find(|h| header_name(h).as_deref() == Some(section))
    }

    fn build_info_popup(&self, layout: &PopupLayout) -> Result<(), JsValue> {
        let body = self
            .document
            .body()
            .ok_or_else(|| JsValue::from_str("document has no body"))?;

        let overlay = self.create("div", Some(OVERLAY_ID))?;
        set_styles(
            &overlay,
            &[
                ("position", "fixed"),
                ("inset", "0"),
                ("display", "none"),
                ("align-items", "center"),
                ("justify-content", "center"),
                ("background", "transparent"),
                ("pointer-events", "none"),
                ("z-index", "10000"),
                ("box-sizing", "border-box"),
                ("left", layout.left.as_str()),
                ("top", layout.top.as_str()),
                ("height", layout.height.as_str()),
            ],
        );

        let dialog = self.create("div", Some(DIALOG_ID))?;
        set_styles(
            &dialog,
            &[
                ("background", "#fff"),
                ("border-radius", "8px"),
                ("width", layout.width.as_str()),
                ("max-width", layout.max_width.as_str()),
                ("max-height", layout.max_height.as_str()),
                ("overflow", "auto"),
                ("box-shadow", "0 12px 40px rgba(0,0,0,0.35)"),
                ("position", "relative"),
                ("padding", "0"),
                ("border", "1px solid rgba(0,0,0,0.08)"),
                ("resize", "both"),
                ("pointer-events", "auto"),
            ],
        );

        let title_bar = self.create("div", Some("infoPopupTitleBar"))?;
        set_styles(
            &title_bar,
            &[
                ("display", "flex"),
                ("align-items", "center"),
                ("justify-content", "space-between"),
                ("padding", "8px 12px"),
                ("background", "#f3f4f6"),
                ("border-top-left-radius", "8px"),
                ("border-top-right-radius", "8px"),
                ("cursor", "move"),
                ("user-select", "none"),
                ("border-bottom", "1px solid rgba(0,0,0,0.06)"),
            ],
        );

        let title = self.create("h2", Some(TITLE_ID))?;
        set_styles(&title, &[("margin", "0"), ("font-size", "1rem"), ("padding", "0")]);
        title_bar.append_child(&title)?;

        let controls = self.create("div", None)?;
        set_styles(&controls, &[("display", "flex"), ("gap", "8px")]);
        let close = self.create("button", Some("infoPopupClose"))?;
        close.set_inner_text("\u{00d7}");
        set_styles(
            &close,
            &[
                ("border", "none"),
                ("background", "transparent"),
                ("cursor", "pointer"),
                ("position", "static"),
                ("font-size", "16px"),
            ],
        );
        controls.append_child(&close)?;
        title_bar.append_child(&controls)?;

        let wrapper = self.create("div", None)?;
        set_styles(&wrapper, &[("padding", "12px 16px 18px 16px")]);
        let content = self.create("div", Some(CONTENT_ID))?;
        wrapper.append_child(&content)?;

        dialog.append_child(&title_bar)?;
        dialog.append_child(&wrapper)?;
        overlay.append_child(&dialog)?;
        body.append_child(&overlay)?;
        Ok(())
    }

    /// Keeps the sidebar tall enough for every section header plus the open
    /// section's content.
    fn fit_sidebar(&self) {
        let Some(sidebar) = self.html("sidebar") else {
            return;
        };
        let Some(open) = self.select(".collapsible-content.open") else {
            let _ = sidebar.class_list().remove_1("expanded");
            clear_style(&sidebar, "height");
            return;
        };

        let mut height = 0.0;
        if let Some(header) = self.html_selected("#sidebar .sidebar-header") {
            height += f64::from(header.offset_height());
        }
        if let Some(content) = self.select("#sidebar .sidebar-content") {
            height += css_px(&self.window, &content, "padding-top");
            height += css_px(&self.window, &content, "padding-bottom");
        }
        if let Ok(containers) = self
            .document
            .query_selector_all("#sidebar .collapsible-container")
        {
            for c in (0..containers.length()).filter_map(|i| containers.item(i)) {
                let Ok(container) = c.dyn_into::<Element>() else {
                    continue;
                };
                height += css_px(&self.window, &container, "margin-top");
                height += css_px(&self.window, &container, "margin-bottom");
                if let Some(header) = container
                    .query_selector(".collapsible-header")
                    .ok()
                    .flatten()
                    .and_then(|h| h.dyn_into::<HtmlElement>().ok())
                {
                    height += f64::from(header.offset_height());
                }
            }
        }
        height += f64::from(open.scroll_height());

        let _ = sidebar.class_list().add_1("expanded");
        set_styles(&sidebar, &[("height", px(height).as_str())]);
    }
}

impl InfoPopupView for DomSurface {
    fn ensure_info_popup(&self, layout: &PopupLayout) {
        if self.html(OVERLAY_ID).is_some() {
            return;
        }
        if let Err(err) = self.build_info_popup(layout) {
            tracing::error!("dom: failed to build info popup: {err:?}");
        }
    }

    fn set_info_popup_title(&self, title: &str) {
        if let Some(el) = self.html(TITLE_ID) {
            el.set_text_content(Some(title));
        }
    }

    fn set_info_popup_body(&self, html: &str) {
        if let Some(el) = self.html(CONTENT_ID) {
            el.set_inner_html(html);
        }
    }

    fn set_info_popup_visible(&self, visible: bool) {
        if let Some(overlay) = self.html(OVERLAY_ID) {
            set_styles(&overlay, &[("display", if visible { "flex" } else { "none" })]);
        }
    }

    fn info_popup_visible(&self) -> bool {
        self.html(OVERLAY_ID).is_some_and(|o| {
            o.style()
                .get_property_value("display")
                .is_ok_and(|d| d != "none")
        })
    }

    fn info_popup_rect(&self) -> Option<Rect2> {
        self.html(DIALOG_ID).map(|d| rect_of(&d))
    }

    fn move_info_popup(&self, top_left: Point2) {
        if let Some(dialog) = self.html(DIALOG_ID) {
            set_styles(
                &dialog,
                &[
                    ("left", px(top_left.x).as_str()),
                    ("top", px(top_left.y).as_str()),
                    ("position", "fixed"),
                ],
            );
        }
    }

    fn set_info_popup_dragging(&self, dragging: bool) {
        if let Some(dialog) = self.html(DIALOG_ID) {
            if dragging {
                set_styles(&dialog, &[("transition", "none")]);
            } else {
                clear_style(&dialog, "transition");
            }
        }
    }

    fn set_info_popup_z_index(&self, z: i32) {
        if let Some(overlay) = self.html(OVERLAY_ID) {
            set_styles(&overlay, &[("z-index", z.to_string().as_str())]);
        }
    }
}

impl MapPopupView for DomSurface {
    fn show_map_popup(&self, html: &str, at: Point2) {
        let Some(popup) = self.html(MAP_POPUP_ID) else {
            tracing::warn!("dom: #{MAP_POPUP_ID} is missing");
            return;
        };
        popup.set_inner_html(html);
        set_styles(
            &popup,
            &[("left", px(at.x).as_str()), ("top", px(at.y).as_str()), ("display", "block")],
        );
    }

    fn hide_map_popup(&self) {
        if let Some(popup) = self.html(MAP_POPUP_ID) {
            set_styles(&popup, &[("display", "none")]);
        }
    }

    fn map_popup_visible(&self) -> bool {
        self.html(MAP_POPUP_ID).is_some_and(|p| {
            p.style()
                .get_property_value("display")
                .is_ok_and(|d| d == "block")
        })
    }
}

impl SidebarView for DomSurface {
    fn control_label(&self, layer: &str) -> Option<String> {
        let button: HtmlElement = self.control_button(layer)?.dyn_into().ok()?;
        Some(button.inner_text().trim().to_string())
    }

    fn control_section(&self, layer: &str) -> Option<String> {
        let content = closest(&self.control_button(layer)?, ".collapsible-content")?;
        header_name(&content.previous_element_sibling()?)
    }

    fn section_names(&self) -> Vec<String> {
        let Ok(headers) = self.document.query_selector_all(".collapsible-header") else {
            return Vec::new();
        };
        (0..headers.length())
            .filter_map(|i| headers.item(i)?.dyn_into::<Element>().ok())
            .filter_map(|h| header_name(&h))
            .collect()
    }

    fn set_section_open(&self, section: &str, open: bool) {
        let Some(header) = self.section_header(section) else {
            return;
        };
        let Some(content) = header
            .next_element_sibling()
            .and_then(|c| c.dyn_into::<HtmlElement>().ok())
        else {
            return;
        };
        let icon = header
            .query_selector(".toggle-icon")
            .ok()
            .flatten()
            .and_then(|i| i.dyn_into::<HtmlElement>().ok());

        if open {
            let _ = content.class_list().add_1("open");
            set_styles(&content, &[("max-height", px(f64::from(content.scroll_height())).as_str())]);
        } else {
            let _ = content.class_list().remove_1("open");
            clear_style(&content, "max-height");
        }
        if let Some(icon) = icon {
            let angle = if open { "rotate(90deg)" } else { "rotate(0deg)" };
            set_styles(&icon, &[("transform", angle)]);
        }
        self.fit_sidebar();
    }

    fn render_upcoming_events(&self, html: &str) -> bool {
        match self.html(EVENTS_SIDEBAR_ID) {
            Some(sidebar) => {
                sidebar.set_inner_html(html);
                true
            }
            None => false,
        }
    }
}

impl TutorialView for DomSurface {
    fn set_tutorial_visible(&self, visible: bool) {
        let display = if visible { "block" } else { "none" };
        for id in ["tutorial-overlay", "tutorial-box"] {
            if let Some(el) = self.html(id) {
                set_styles(&el, &[("display", display)]);
            }
        }
    }

    fn set_tutorial_text(&self, title: &str, text: &str) {
        if let Some(h) = self.select("#tutorial-box h3") {
            h.set_text_content(Some(title));
        }
        if let Some(p) = self.select("#tutorial-box p") {
            p.set_text_content(Some(text));
        }
    }

    fn set_tutorial_nav(&self, show_prev: bool, show_next: bool) {
        for (id, shown) in [("tutorial-prev", show_prev), ("tutorial-next", show_next)] {
            if let Some(button) = self.html(id) {
                let display = if shown { "inline-block" } else { "none" };
                set_styles(&button, &[("display", display)]);
            }
        }
    }

    fn place_tutorial_box(&self, placement: BoxPlacement) {
        let Some(tour_box) = self.html("tutorial-box") else {
            return;
        };
        match placement {
            BoxPlacement::Centered => set_styles(
                &tour_box,
                &[
                    ("top", "50%"),
                    ("left", "50%"),
                    ("transform", "translate(-50%, -50%)"),
                ],
            ),
            BoxPlacement::At { top, left } => set_styles(
                &tour_box,
                &[("top", px(top).as_str()), ("left", px(left).as_str()), ("transform", "none")],
            ),
        }
    }

    fn tutorial_box_size(&self) -> Size2 {
        self.html("tutorial-box")
            .map(|b| Size2::new(f64::from(b.offset_width()), f64::from(b.offset_height())))
            .unwrap_or_default()
    }

    fn viewport_size(&self) -> Size2 {
        let dim = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
        Size2::new(dim(self.window.inner_width()), dim(self.window.inner_height()))
    }

    fn element_rect(&self, selector: &str) -> Option<Rect2> {
        self.select(selector).map(|el| rect_of(&el))
    }

    fn set_element_class(&self, selector: &str, class: &str, on: bool) {
        if let Some(el) = self.select(selector) {
            let classes = el.class_list();
            let _ = if on {
                classes.add_1(class)
            } else {
                classes.remove_1(class)
            };
        }
    }

    fn set_element_pointer_events(&self, selector: &str, value: Option<&str>) {
        if let Some(el) = self.html_selected(selector) {
            match value {
                Some(v) => set_styles(&el, &[("pointer-events", v)]),
                None => clear_style(&el, "pointer-events"),
            }
        }
    }

    fn set_pointer_routing(&self, routing: PointerRouting) {
        let (overlay, tour_box) = match routing {
            PointerRouting::Blocked => (None, None),
            PointerRouting::PassThrough => (Some("none"), Some("auto")),
        };
        self.set_element_pointer_events("#tutorial-overlay", overlay);
        self.set_element_pointer_events(TOUR_BOX_SELECTOR, tour_box);
    }

    fn set_body_class(&self, class: &str, on: bool) {
        if let Some(body) = self.document.body() {
            let classes = body.class_list();
            let _ = if on {
                classes.add_1(class)
            } else {
                classes.remove_1(class)
            };
        }
    }

    fn set_click_guard(&self, on: bool) {
        let mut guard = self.click_guard.borrow_mut();
        if !on {
            guard.take();
            return;
        }
        if guard.is_some() {
            return;
        }
        let options = EventListenerOptions {
            phase: EventListenerPhase::Capture,
            passive: false,
        };
        *guard = Some(EventListener::new_with_options(
            &self.document,
            "click",
            options,
            |event| {
                let inside = event_element(event)
                    .and_then(|el| closest(&el, TOUR_BOX_SELECTOR))
                    .is_some();
                if !inside {
                    event.stop_propagation();
                    event.prevent_default();
                }
            },
        ));
    }

    fn observe_mutations(&self) -> Notifications {
        observer::observe_body(&self.document)
    }
}

impl Clock for DomSurface {
    type Sleep = TimeoutFuture;

    fn sleep(&self, ms: u32) -> TimeoutFuture {
        TimeoutFuture::new(ms)
    }
}
