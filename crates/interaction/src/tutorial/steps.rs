use super::placement::Placement;
use crate::config::TutorialConfig;

/// Side effects a step applies on entry. Each is undone by the next
/// `show_step` or by ending the tour.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectSet {
    /// Inline `pointer-events: none` on the target.
    pub inert_target: bool,
    /// Secondary highlight on the map container.
    pub map_highlight: bool,
    /// Clicks reach the map; the map popup survives the step.
    pub map_click: bool,
    /// Hover reaches the page, clicks outside the box are swallowed.
    pub hover_through: bool,
    /// Category control to activate; the highlight then follows the dialog.
    pub open_info_popup: Option<String>,
    /// Sidebar section kept open while the step is showing.
    pub accordion: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub target: Option<&'static str>,
    pub title: &'static str,
    pub text: &'static str,
    pub hint: Placement,
    pub effects: EffectSet,
}

pub const MAP_SELECTOR: &str = "#viewDiv";
pub const INFO_DIALOG_SELECTOR: &str = "#infoPopupDialog";
pub const HIGHLIGHT_CLASS: &str = "tutorial-highlight";
pub const SECONDARY_HIGHLIGHT_CLASS: &str = "tutorial-highlight2";

fn step(target: Option<&'static str>, title: &'static str, text: &'static str, hint: Placement) -> Step {
    Step {
        target,
        title,
        text,
        hint,
        effects: EffectSet::default(),
    }
}

/// The guided tour, in order.
pub fn tour(cfg: &TutorialConfig) -> Vec<Step> {
    use Placement::*;

    let sidebar_title = "Events/Programs Sidebar";
    let mut steps = vec![
        step(
            Some("#mainTitle"),
            "Welcome!",
            "This webpage is used for understanding the Keep Coral Gables Beautiful (KCGB) program. Let's take a quick tour of how to use the interactive map application.",
            Bottom,
        ),
        step(
            Some(MAP_SELECTOR),
            "Map",
            "This map contains the locations of all events and programs from the KCGB program.",
            Bottom,
        ),
        step(
            Some(".esri-search__container"),
            "Search Bar",
            "Use this search bar to find specific addresses or places on the map.",
            Bottom,
        ),
        step(
            Some(".esri-zoom"),
            "Zoom Controls",
            "Use these controls to zoom in and out of the map.",
            Bottom,
        ),
        step(
            Some(MAP_SELECTOR),
            "Event/Program Pop-up",
            "When you click on a map icon, a pop-up will appear with more information about the event or program. Try clicking on any icon now.",
            Right,
        ),
        step(
            Some("#sidebar"),
            sidebar_title,
            "Here you can find the Events and Programs sidebar, which explains the icons from the map.",
            Right,
        ),
        step(
            Some("#sidebar"),
            sidebar_title,
            "You can access the specific event/program buttons by clicking on the appropriate button for each category. Try hovering over each button.",
            Right,
        ),
        step(
            Some("#infoPopupOverlay"),
            "Event/Program Information",
            "When a button is clicked, an informational window appears with more details. Here \"Battery Recycling\" has been clicked as an example.",
            Left,
        ),
        step(
            Some("#programsSidebar"),
            "Upcoming Events",
            "Use this sidebar to access information about upcoming events.",
            Left,
        ),
        step(
            Some("#navbar"),
            "Navigation Bar",
            "Use this navigation bar to access different websites relevant to this site.",
            Bottom,
        ),
        step(
            None,
            "You're all set to go!",
            "Thanks for using the KCGB Interactive Map. Have fun!",
            Left,
        ),
    ];

    for (i, s) in steps.iter_mut().enumerate() {
        let fx = &mut s.effects;
        fx.inert_target = matches!(i, 0..=3 | 8 | 10);
        fx.map_highlight = (1..=7).contains(&i);
        fx.map_click = i == 4;
        fx.hover_through = matches!(i, 5 | 6);
        if i == 7 {
            fx.open_info_popup = Some(cfg.popup_control.clone());
        }
        if (6..=9).contains(&i) {
            fx.accordion = Some(cfg.accordion_section.clone());
        }
    }
    steps
}
