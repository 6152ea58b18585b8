//! Upcoming-events sidebar.
//!
//! Field names in the events table have drifted between revisions of the
//! service, so every value is looked up through a fixed fallback chain.

use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use layers::{Attributes, display_text, first_present};
use serde_json::Value;

use html_escape::{encode_double_quoted_attribute, encode_text};

const NAME_FIELDS: &[&str] = &["EventName", "event_name", "Name"];
const DATE_FIELDS: &[&str] = &["EventDate", "event_date", "Date"];
const LOCATION_FIELDS: &[&str] = &["EventLocation", "event_location", "Location"];
const DESCRIPTION_FIELDS: &[&str] = &[
    "Description",
    "description",
    "EventDescription",
    "event_description",
];
const LINK_FIELDS: &[&str] = &["EventLink", "event_link", "Link"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpcomingEvent {
    pub name: String,
    pub description: Option<String>,
    pub date: String,
    pub time: String,
    pub location: String,
    pub link: Option<String>,
}

fn text(attrs: &Attributes, names: &[&str]) -> Option<String> {
    first_present(attrs, names).map(display_text)
}

/// Date and time columns for a raw date value in `tz`.
///
/// Numbers are epoch milliseconds; RFC 3339 strings are parsed; anything
/// else is shown verbatim with no time.
pub fn format_when<Tz: TimeZone>(value: Option<&Value>, tz: &Tz) -> (String, String)
where
    Tz::Offset: std::fmt::Display,
{
    let na = || ("N/A".to_string(), "N/A".to_string());
    let Some(value) = value else {
        return na();
    };

    let instant = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(DateTime::<Utc>::from_timestamp_millis),
        Value::String(s) => DateTime::<FixedOffset>::parse_from_rfc3339(s)
            .ok()
            .map(|d| d.with_timezone(&Utc)),
        _ => None,
    };

    match instant {
        Some(utc) => {
            let local = utc.with_timezone(tz);
            (
                local.format("%B %-d, %Y").to_string(),
                local.format("%I:%M %p").to_string(),
            )
        }
        None => (display_text(value), "N/A".to_string()),
    }
}

impl UpcomingEvent {
    pub fn from_attributes<Tz: TimeZone>(attrs: &Attributes, tz: &Tz) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        let (date, time) = format_when(first_present(attrs, DATE_FIELDS), tz);
        Self {
            name: text(attrs, NAME_FIELDS).unwrap_or_else(|| "Event".to_string()),
            description: text(attrs, DESCRIPTION_FIELDS),
            date,
            time,
            location: text(attrs, LOCATION_FIELDS).unwrap_or_else(|| "N/A".to_string()),
            link: text(attrs, LINK_FIELDS),
        }
    }

    pub fn render(&self) -> String {
        let mut html = String::from("<div class=\"event-item\">");
        html.push_str(&format!("<h4>{}</h4>", encode_text(&self.name)));
        if let Some(d) = &self.description {
            // Rendered as text; only layer descriptions are trusted markup.
            html.push_str(&format!("<p>{}</p>", encode_text(d)));
        }
        html.push_str(&format!("<p><strong>Date:</strong> {}</p>", encode_text(&self.date)));
        html.push_str(&format!("<p><strong>Time:</strong> {}</p>", encode_text(&self.time)));
        html.push_str(&format!(
            "<p><strong>Location:</strong> {}</p>",
            encode_text(&self.location)
        ));
        if let Some(link) = &self.link {
            html.push_str(&format!(
                "<a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\" class=\"event-link\">More Info</a>",
                encode_double_quoted_attribute(link)
            ));
        }
        html.push_str("</div>");
        html
    }
}

/// Full sidebar markup, header included.
pub fn render_sidebar(events: &[UpcomingEvent]) -> String {
    let mut html = String::from(
        "<div id=\"upcoming-events-container\"><h1 class=\"sidebar-header2\">UPCOMING EVENTS</h1>",
    );
    if events.is_empty() {
        html.push_str("<p>No upcoming events found.</p>");
    }
    for e in events {
        html.push_str(&e.render());
    }
    html.push_str("</div>");
    html
}
