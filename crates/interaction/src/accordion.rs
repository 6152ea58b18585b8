use std::cell::RefCell;

use crate::surface::SidebarView;

/// Collapsible sidebar sections. At most one section is open.
#[derive(Debug, Default)]
pub struct Accordion {
    open: RefCell<Option<String>>,
}

impl Accordion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_section(&self) -> Option<String> {
        self.open.borrow().clone()
    }

    pub fn is_open(&self, section: &str) -> bool {
        self.open.borrow().as_deref() == Some(section)
    }

    /// Header click. Opening a section closes whichever other one is open.
    /// Returns whether `section` is open afterwards.
    pub fn toggle(&self, view: &impl SidebarView, section: &str) -> bool {
        let previous = self.open.borrow_mut().take();
        if let Some(prev) = previous.as_deref() {
            view.set_section_open(prev, false);
            if prev == section {
                return false;
            }
        }
        view.set_section_open(section, true);
        *self.open.borrow_mut() = Some(section.to_string());
        true
    }

    pub fn open(&self, view: &impl SidebarView, section: &str) {
        if !self.is_open(section) {
            self.toggle(view, section);
        }
    }

    pub fn close_all(&self, view: &impl SidebarView) {
        for section in view.section_names() {
            view.set_section_open(&section, false);
        }
        self.open.borrow_mut().take();
    }
}
