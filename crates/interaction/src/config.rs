use layers::AliasOverride;
use serde::Deserialize;

/// Site-specific names and constants.
///
/// Every field has a default matching the production map, so a partial JSON
/// document only needs to list what differs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub descriptions: DescriptionsTable,
    /// Standalone table feeding the upcoming-events sidebar.
    pub events_table: String,
    /// Layers without a "Locations" section or popup location box.
    pub transit_layers: Vec<String>,
    /// Layers whose popup title gets a " Program" suffix.
    pub program_layers: Vec<String>,
    /// Layers that never open the map-click popup.
    pub boundary_layers: Vec<String>,
    pub alias_overrides: Vec<AliasOverride>,
    pub popup: PopupLayout,
    pub map_popup_offset: Offset,
    pub tutorial: TutorialConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DescriptionsTable {
    pub table: String,
    pub key_field: String,
    pub description_field: String,
}

/// Default anchor and size of the floating info window (CSS lengths).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PopupLayout {
    pub left: String,
    pub top: String,
    pub height: String,
    pub width: String,
    pub max_width: String,
    pub max_height: String,
}

#[derive(Debug, Copy, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Offset {
    pub dx: f64,
    pub dy: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TutorialConfig {
    /// Gap between the tour box, its target and the viewport edges (px).
    pub margin: f64,
    pub observe_timeout_ms: u32,
    /// Category control the tour opens to demonstrate the info window.
    pub popup_control: String,
    /// Sidebar section the tour keeps open while it points at the sidebar.
    pub accordion_section: String,
    pub overlay_z_index: i32,
    pub raised_z_index: i32,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            descriptions: DescriptionsTable::default(),
            events_table: "kcgbEvents".to_string(),
            transit_layers: strings(&["CG_Trolley", "CG_Buses", "CG_MetroRail"]),
            program_layers: strings(&["BATTERY_RECYCLING", "CLPR", "LITTER_KIT", "NEXTREX"]),
            boundary_layers: strings(&["CityBoundary2019"]),
            alias_overrides: vec![AliasOverride::new("CLPR", "Location", "Name")],
            popup: PopupLayout::default(),
            map_popup_offset: Offset::default(),
            tutorial: TutorialConfig::default(),
        }
    }
}

impl Default for DescriptionsTable {
    fn default() -> Self {
        Self {
            table: "Layer Descriptions".to_string(),
            key_field: "LAYER_NAME".to_string(),
            description_field: "Description".to_string(),
        }
    }
}

impl Default for PopupLayout {
    fn default() -> Self {
        Self {
            left: "75vw".to_string(),
            top: "55px".to_string(),
            height: "94vh".to_string(),
            width: "560px".to_string(),
            max_width: "25vw".to_string(),
            max_height: "94vh".to_string(),
        }
    }
}

impl Default for Offset {
    fn default() -> Self {
        Self { dx: 15.0, dy: -15.0 }
    }
}

impl Default for TutorialConfig {
    fn default() -> Self {
        Self {
            margin: 15.0,
            observe_timeout_ms: 3000,
            popup_control: "BATTERY_RECYCLING".to_string(),
            accordion_section: "Ongoing programs".to_string(),
            overlay_z_index: 10000,
            raised_z_index: 20003,
        }
    }
}

impl SiteConfig {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn is_transit(&self, layer: &str) -> bool {
        self.transit_layers.iter().any(|l| l == layer)
    }

    pub fn is_program(&self, layer: &str) -> bool {
        self.program_layers.iter().any(|l| l == layer)
    }

    pub fn is_boundary(&self, layer: &str) -> bool {
        self.boundary_layers.iter().any(|l| l == layer)
    }
}
