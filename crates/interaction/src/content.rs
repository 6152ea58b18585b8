//! Markup for the info window and the map-click popup.

use html_escape::encode_text;

pub const LOADING_DESCRIPTION: &str = "<p>Loading description...</p>";
pub const LOADING_LOCATIONS: &str = "<p>Loading locations...</p>";
pub const NO_DESCRIPTION: &str = "<p>No description available.</p>";
pub const DESCRIPTION_ERROR: &str = "<p>Error loading description.</p>";
pub const NO_LOCATIONS: &str = "<p>No locations found for this category.</p>";
pub const LOCATIONS_ERROR: &str = "<p>Error loading locations.</p>";

/// Body of the info window: an "About" section and, for non-transit
/// categories, a "Locations" section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoBody {
    pub about: String,
    pub locations: Option<String>,
}

impl InfoBody {
    pub fn loading(show_locations: bool) -> Self {
        Self {
            about: LOADING_DESCRIPTION.to_string(),
            locations: show_locations.then(|| LOADING_LOCATIONS.to_string()),
        }
    }

    pub fn render(&self) -> String {
        let mut html = format!("<h3>About</h3>{}", self.about);
        if let Some(locations) = &self.locations {
            html.push_str("<h3 class=\"locations-header\">Locations</h3>");
            html.push_str("<div class=\"locations-list-container\">");
            html.push_str(locations);
            html.push_str("</div>");
        }
        html
    }
}

/// One `location | address` entry per feature.
pub fn locations_list<'a>(items: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    let mut html = String::from("<ul class=\"locations-list\">");
    for (location, address) in items {
        html.push_str(&format!(
            "<li>{} | <i>{}</i></li>",
            encode_text(location),
            encode_text(address)
        ));
    }
    html.push_str("</ul>");
    html
}

/// Transient popup shown next to a clicked map feature.
pub fn map_popup(title: &str, boxes: &[(&str, String)]) -> String {
    let mut html = format!("<h3>{}</h3>", encode_text(title));
    for (label, value) in boxes {
        html.push_str(&format!(
            "<div class=\"popup-info-box\"><strong>{}:</strong> {}</div>",
            encode_text(label),
            encode_text(value)
        ));
    }
    html.push_str("<button class=\"popup-button\">View More</button>");
    html
}
