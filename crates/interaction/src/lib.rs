pub mod accordion;
pub mod category;
pub mod config;
pub mod content;
pub mod error;
pub mod events;
pub mod highlight;
pub mod info_popup;
pub mod map_click;
pub mod session;
pub mod surface;
pub mod tutorial;

#[cfg(test)]
pub(crate) mod testing;

pub use accordion::Accordion;
pub use config::SiteConfig;
pub use error::InteractionError;
pub use highlight::{HighlightCoordinator, PendingHighlight};
pub use info_popup::{ActiveInfoPopup, CloseAction, InfoPopupController};
pub use map_click::{ClickTarget, MapClickPopupController};
pub use session::Session;
pub use surface::{InfoPopupView, MapPopupView, PointerRouting, SidebarView, Surface, TutorialView};
pub use tutorial::{TutorialEngine, TutorialHost};
