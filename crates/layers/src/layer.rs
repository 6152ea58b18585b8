use serde::Deserialize;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayerId(pub u64);

/// Standalone (non-spatial) table, e.g. the layer descriptions table.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TableId(pub u64);

/// One entry of a layer's field schema.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(default)]
    pub alias: Option<String>,
}

impl Field {
    pub fn new(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: Some(alias.into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSchema {
    pub fields: Vec<Field>,
}

impl FieldSchema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn by_alias(&self, alias: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.alias.as_deref() == Some(alias))
    }

    pub fn by_name(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Read-only view of a map layer as this crate sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerInfo {
    pub id: LayerId,
    pub title: String,
    /// `None` for layers that expose no schema (graphics, basemap tiles).
    pub fields: Option<FieldSchema>,
}
